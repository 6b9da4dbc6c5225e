//! Package manifests.
//!
//! A `tessera.pkg.toml` describes one type-checked package in SSA form.
//! Types are written in source syntax and resolved against the package's own
//! path; symbols are full link names (`<pkgpath>.<name>`).
//!
//! ```toml
//! path = "example.com/hello"
//! name = "main"
//! imports = ["example.com/greet"]
//!
//! [[types]]
//! name = "Point"
//! underlying = "struct{x int; y int}"
//!
//! [[vars]]
//! name = "count"
//! type = "int"
//!
//! [[funcs]]
//! name = "main"
//! sig = "func()"
//! body = [
//!   { op = "call", callee = { runtime = "PrintString" }, args = [{ str = "hi" }] },
//!   { op = "return" },
//! ]
//! ```

use crate::error::{BuildError, BuildResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tessera_types::{
    parse_signature, parse_type, Callee, Const, FuncRef, GlobalRef, Instr, Member, Operand, PackageTypes,
    SourcePackage, SsaFunction, SsaGlobal, TyId, TypeParseError, TypeTable, ValueId,
};

/// File name of a package manifest.
pub const MANIFEST_FILE: &str = "tessera.pkg.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub imports: Vec<String>,
    /// Base path of the build artifacts, relative to the manifest.
    pub export: Option<PathBuf>,
    #[serde(default)]
    pub ill_typed: bool,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    #[serde(default)]
    pub vars: Vec<VarDecl>,
    #[serde(default)]
    pub funcs: Vec<FuncDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDecl {
    pub name: String,
    pub underlying: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VarDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub foreign_module: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FuncDecl {
    pub name: String,
    pub sig: String,
    pub body: Option<Vec<InstrDecl>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FuncRefDecl {
    pub symbol: String,
    pub sig: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalleeDecl {
    Func(FuncRefDecl),
    Runtime(String),
    Closure(OperandDecl),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperandDecl {
    Value(u32),
    Param(usize),
    Int {
        value: i64,
        #[serde(rename = "type")]
        ty: String,
    },
    Float {
        value: f64,
        #[serde(rename = "type")]
        ty: String,
    },
    Bool(bool),
    Str(String),
    Nil(String),
    Func(FuncRefDecl),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum InstrDecl {
    Call {
        dst: Option<u32>,
        callee: CalleeDecl,
        #[serde(default)]
        args: Vec<OperandDecl>,
    },
    MakeClosure {
        dst: u32,
        func: FuncRefDecl,
    },
    ForeignCall {
        dst: u32,
        callee: OperandDecl,
        sig: String,
        #[serde(default)]
        args: Vec<OperandDecl>,
    },
    ImportForeignModule {
        dst: u32,
        path: String,
    },
    StoreForeignModule {
        global: String,
        value: OperandDecl,
    },
    Load {
        dst: u32,
        global: String,
        #[serde(rename = "type")]
        ty: String,
    },
    Store {
        global: String,
        #[serde(rename = "type")]
        ty: String,
        value: OperandDecl,
    },
    Return {
        #[serde(default)]
        values: Vec<OperandDecl>,
    },
}

impl Manifest {
    pub fn read(path: &Path) -> BuildResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| BuildError::io(path, source))?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &Path) -> BuildResult<Self> {
        toml::from_str(text).map_err(|source| BuildError::Manifest { path: path.to_path_buf(), source })
    }

    /// Interns the package's declarations and returns its scope.
    pub fn declare(&self, table: &mut TypeTable) -> BuildResult<PackageTypes> {
        let mut types = PackageTypes::new(&self.path, &self.name);
        // Names first, so declarations may refer to each other.
        let named = self
            .types
            .iter()
            .map(|decl| table.declare_named(&self.path, &decl.name))
            .collect::<Vec<_>>();
        for (decl, ty) in self.types.iter().zip(named) {
            let underlying = self.ty(table, &decl.underlying)?;
            table.set_underlying(ty, underlying);
            types.scope.insert(decl.name.as_str(), Member::TypeName(ty));
        }
        for var in &self.vars {
            let ty = self.ty(table, &var.ty)?;
            types.scope.insert(var.name.as_str(), Member::Var(ty));
        }
        for func in &self.funcs {
            let sig = self.sig(table, &func.sig)?;
            types.scope.insert(func.name.as_str(), Member::Func(sig));
        }
        Ok(types)
    }

    /// Converts the manifest found in `dir` into a source package.
    pub fn to_package(&self, dir: &Path, table: &mut TypeTable) -> BuildResult<SourcePackage> {
        let types = self.declare(table)?;
        let export_file = match &self.export {
            Some(export) => dir.join(export),
            None => dir.join(base_name(&self.path)),
        };
        let mut pkg = SourcePackage::new(types, export_file);
        pkg.imports = self.imports.clone();
        pkg.ill_typed = self.ill_typed;
        for var in &self.vars {
            let ty = self.ty(table, &var.ty)?;
            pkg.globals.push(SsaGlobal { name: var.name.clone(), ty, foreign_module: var.foreign_module });
        }
        for func in &self.funcs {
            let sig = self.sig(table, &func.sig)?;
            let body = match &func.body {
                Some(body) => Some(body.iter().map(|instr| self.instr(table, instr)).collect::<BuildResult<_>>()?),
                None => None,
            };
            pkg.functions.push(SsaFunction { name: func.name.clone(), sig, body });
        }
        Ok(pkg)
    }

    fn ty(&self, table: &mut TypeTable, src: &str) -> BuildResult<TyId> {
        parse_type(table, src, &self.path).map_err(|err| self.type_error(err))
    }

    fn sig(&self, table: &mut TypeTable, src: &str) -> BuildResult<TyId> {
        parse_signature(table, src, &self.path).map_err(|err| self.type_error(err))
    }

    fn type_error(&self, source: TypeParseError) -> BuildError {
        BuildError::ManifestType { package: self.path.clone(), source }
    }

    fn func_ref(&self, table: &mut TypeTable, decl: &FuncRefDecl) -> BuildResult<FuncRef> {
        Ok(FuncRef { symbol: decl.symbol.clone(), sig: self.sig(table, &decl.sig)? })
    }

    fn operand(&self, table: &mut TypeTable, decl: &OperandDecl) -> BuildResult<Operand> {
        Ok(match decl {
            OperandDecl::Value(id) => Operand::Value(ValueId(*id)),
            OperandDecl::Param(i) => Operand::Param(*i),
            OperandDecl::Int { value, ty } => Operand::Const(Const::Int { value: *value, ty: self.ty(table, ty)? }),
            OperandDecl::Float { value, ty } => Operand::Const(Const::float(*value, self.ty(table, ty)?)),
            OperandDecl::Bool(value) => Operand::Const(Const::Bool(*value)),
            OperandDecl::Str(text) => Operand::Const(Const::String(text.clone())),
            OperandDecl::Nil(ty) => Operand::Const(Const::Nil(self.ty(table, ty)?)),
            OperandDecl::Func(func) => Operand::Func(self.func_ref(table, func)?),
        })
    }

    fn operands(&self, table: &mut TypeTable, decls: &[OperandDecl]) -> BuildResult<Vec<Operand>> {
        decls.iter().map(|decl| self.operand(table, decl)).collect()
    }

    fn instr(&self, table: &mut TypeTable, decl: &InstrDecl) -> BuildResult<Instr> {
        Ok(match decl {
            InstrDecl::Call { dst, callee, args } => {
                let callee = match callee {
                    CalleeDecl::Func(func) => Callee::Static(self.func_ref(table, func)?),
                    CalleeDecl::Runtime(name) => Callee::Runtime(name.clone()),
                    CalleeDecl::Closure(value) => Callee::Closure(self.operand(table, value)?),
                };
                Instr::Call { dst: dst.map(ValueId), callee, args: self.operands(table, args)? }
            }
            InstrDecl::MakeClosure { dst, func } => {
                Instr::MakeClosure { dst: ValueId(*dst), func: self.func_ref(table, func)? }
            }
            InstrDecl::ForeignCall { dst, callee, sig, args } => Instr::ForeignCall {
                dst: ValueId(*dst),
                callee: self.operand(table, callee)?,
                sig: self.sig(table, sig)?,
                args: self.operands(table, args)?,
            },
            InstrDecl::ImportForeignModule { dst, path } => {
                Instr::ImportForeignModule { dst: ValueId(*dst), path: path.clone() }
            }
            InstrDecl::StoreForeignModule { global, value } => {
                Instr::StoreForeignModule { global: global.clone(), value: self.operand(table, value)? }
            }
            InstrDecl::Load { dst, global, ty } => Instr::Load {
                dst: ValueId(*dst),
                global: GlobalRef { symbol: global.clone(), ty: self.ty(table, ty)? },
            },
            InstrDecl::Store { global, ty, value } => Instr::Store {
                global: GlobalRef { symbol: global.clone(), ty: self.ty(table, ty)? },
                value: self.operand(table, value)?,
            },
            InstrDecl::Return { values } => Instr::Return(self.operands(table, values)?),
        })
    }
}

fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
