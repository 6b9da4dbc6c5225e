use crate::ssa::{SsaFunction, SsaGlobal};
use crate::ty::TyId;
use indexmap::IndexMap;
use std::path::PathBuf;

/// Import path of the pseudo-package for untyped memory access. It has no
/// compiled artifact.
pub const UNSAFE_PACKAGE: &str = "unsafe";

/// Name of the package clause that marks an executable root.
pub const MAIN_PACKAGE_NAME: &str = "main";

/// Joins a package path and a member name into a link-level symbol name.
pub fn full_name(pkg_path: &str, name: &str) -> String {
    format!("{}.{}", pkg_path, name)
}

/// A package-level object visible in a package scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    /// A type declaration; the id is the declared named type.
    TypeName(TyId),
    /// A function; the id is its signature.
    Func(TyId),
    /// A package-level variable of the given type.
    Var(TyId),
    /// A constant of the given type.
    Const(TyId),
}

impl Member {
    pub fn ty(&self) -> TyId {
        match self {
            Member::TypeName(ty) | Member::Func(ty) | Member::Var(ty) | Member::Const(ty) => *ty,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Member::TypeName(_) => "type",
            Member::Func(_) => "func",
            Member::Var(_) => "var",
            Member::Const(_) => "const",
        }
    }
}

/// Package scope: members in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    members: IndexMap<String, Member>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member, replacing (and returning) a previous one with the same name.
    pub fn insert(&mut self, name: impl Into<String>, member: Member) -> Option<Member> {
        self.members.insert(name.into(), member)
    }

    pub fn lookup(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// The type-level view of a package: what name lookups into it can see.
///
/// This is all the backend needs from a support package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageTypes {
    /// Import path, e.g. `example.com/app/util`.
    pub path: String,
    /// Name from the package clause.
    pub name: String,
    pub scope: Scope,
}

impl PackageTypes {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        PackageTypes { path: path.into(), name: name.into(), scope: Scope::new() }
    }
}

/// One fully type-checked source package in SSA form, as delivered by the loader.
#[derive(Debug, Clone)]
pub struct SourcePackage {
    pub types: PackageTypes,
    /// Import paths of direct dependencies.
    pub imports: Vec<String>,
    /// Base path of the package's build artifact; the IR file is `<export_file>.ll`.
    pub export_file: PathBuf,
    /// Set when type checking failed upstream. Such packages are never lowered.
    pub ill_typed: bool,
    pub globals: Vec<SsaGlobal>,
    pub functions: Vec<SsaFunction>,
}

impl SourcePackage {
    pub fn new(types: PackageTypes, export_file: impl Into<PathBuf>) -> Self {
        SourcePackage {
            types,
            imports: Vec::new(),
            export_file: export_file.into(),
            ill_typed: false,
            globals: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.types.path
    }

    pub fn name(&self) -> &str {
        &self.types.name
    }

    pub fn is_main(&self) -> bool {
        self.types.name == MAIN_PACKAGE_NAME
    }

    pub fn is_unsafe(&self) -> bool {
        self.types.path == UNSAFE_PACKAGE
    }

    /// Last element of the import path; names the linked executable.
    pub fn base_name(&self) -> &str {
        let path = self.types.path.trim_end_matches('/');
        path.rsplit('/').next().unwrap_or(path)
    }

    /// Path of the textual IR artifact for this package.
    pub fn ir_file(&self) -> PathBuf {
        let mut file = self.export_file.clone().into_os_string();
        file.push(".ll");
        PathBuf::from(file)
    }
}
