use fxhash::FxHashMap;
use std::fmt;

/// Handle to a source type interned in a [`TypeTable`].
///
/// Two structurally identical types always intern to the same `TyId`, so
/// comparing ids is comparing types. Named types are nominal: their identity is
/// the `(package path, name)` pair, not their underlying structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TyId(pub u32);

impl fmt::Display for TyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Index of a named type declaration in a [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedId(pub u32);

/// Predeclared (basic) types of the source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    /// Stands for "no type": the result of a function without results.
    Invalid,
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
}

impl BasicKind {
    pub const ALL: [BasicKind; 19] = [
        BasicKind::Invalid,
        BasicKind::Bool,
        BasicKind::Int,
        BasicKind::Int8,
        BasicKind::Int16,
        BasicKind::Int32,
        BasicKind::Int64,
        BasicKind::Uint,
        BasicKind::Uint8,
        BasicKind::Uint16,
        BasicKind::Uint32,
        BasicKind::Uint64,
        BasicKind::Uintptr,
        BasicKind::Float32,
        BasicKind::Float64,
        BasicKind::Complex64,
        BasicKind::Complex128,
        BasicKind::String,
        BasicKind::UnsafePointer,
    ];

    /// Source spelling of the type.
    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Invalid => "invalid type",
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "unsafe.Pointer",
        }
    }

    /// Looks a basic type up by its source spelling. `byte` and `rune` are accepted
    /// as the usual aliases.
    pub fn from_name(name: &str) -> Option<BasicKind> {
        let kind = match name {
            "byte" => BasicKind::Uint8,
            "rune" => BasicKind::Int32,
            _ => return BasicKind::ALL.iter().copied().find(|k| k.name() == name && *k != BasicKind::Invalid),
        };
        Some(kind)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            BasicKind::Int | BasicKind::Int8 | BasicKind::Int16 | BasicKind::Int32 | BasicKind::Int64
        )
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
        )
    }

    pub fn is_integer(self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub fn is_float(self) -> bool {
        matches!(self, BasicKind::Float32 | BasicKind::Float64)
    }
}

/// A struct field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: TyId,
    pub embedded: bool,
}

/// A function signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<TyId>,
    pub results: Vec<TyId>,
    pub variadic: bool,
}

impl Signature {
    pub fn new(params: Vec<TyId>, results: Vec<TyId>) -> Self {
        Signature { params, results, variadic: false }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// An interface method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Method {
    pub name: String,
    pub sig: TyId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// The structure of a source type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TyKind {
    Basic(BasicKind),
    Pointer(TyId),
    Slice(TyId),
    Array { elem: TyId, len: u64 },
    Map { key: TyId, value: TyId },
    Chan { elem: TyId, dir: ChanDir },
    Struct(Vec<Field>),
    Tuple(Vec<TyId>),
    Signature(Signature),
    /// Method set of an interface; empty for `any`.
    Interface(Vec<Method>),
    Named(NamedId),
}

/// A declared named type: `type Name Underlying` in package `pkg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
    pub pkg: String,
    pub name: String,
    /// Set once the declaration has been elaborated. Named types are declared
    /// before their underlying type so that they can refer to themselves.
    pub underlying: Option<TyId>,
}

impl NamedType {
    /// `pkg.Name`, or just `Name` for universe-scope types.
    pub fn qualified_name(&self) -> String {
        if self.pkg.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.pkg, self.name)
        }
    }
}

/// Hash-consing store for source types.
///
/// The loader interns every type of every package into one table, which the
/// backend then treats as read-mostly: lowering only ever asks for kinds,
/// underlying types and display strings.
#[derive(Debug, Clone)]
pub struct TypeTable {
    kinds: Vec<TyKind>,
    interned: FxHashMap<TyKind, TyId>,
    named: Vec<NamedType>,
    named_index: FxHashMap<(String, String), NamedId>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    /// Creates a table with all basic types pre-interned.
    pub fn new() -> Self {
        let mut table = TypeTable {
            kinds: Vec::new(),
            interned: FxHashMap::default(),
            named: Vec::new(),
            named_index: FxHashMap::default(),
        };
        for kind in BasicKind::ALL {
            table.intern(TyKind::Basic(kind));
        }
        table
    }

    /// Interns `kind`, returning the existing id for a structurally equal type.
    pub fn intern(&mut self, kind: TyKind) -> TyId {
        if let Some(id) = self.interned.get(&kind) {
            return *id;
        }
        let id = TyId(self.kinds.len() as u32);
        self.kinds.push(kind.clone());
        self.interned.insert(kind, id);
        id
    }

    pub fn kind(&self, ty: TyId) -> &TyKind {
        &self.kinds[ty.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn basic(&mut self, kind: BasicKind) -> TyId {
        self.intern(TyKind::Basic(kind))
    }

    pub fn invalid(&mut self) -> TyId {
        self.basic(BasicKind::Invalid)
    }

    pub fn pointer(&mut self, elem: TyId) -> TyId {
        self.intern(TyKind::Pointer(elem))
    }

    pub fn slice(&mut self, elem: TyId) -> TyId {
        self.intern(TyKind::Slice(elem))
    }

    pub fn array(&mut self, elem: TyId, len: u64) -> TyId {
        self.intern(TyKind::Array { elem, len })
    }

    pub fn map(&mut self, key: TyId, value: TyId) -> TyId {
        self.intern(TyKind::Map { key, value })
    }

    pub fn chan(&mut self, elem: TyId, dir: ChanDir) -> TyId {
        self.intern(TyKind::Chan { elem, dir })
    }

    pub fn struct_of(&mut self, fields: Vec<Field>) -> TyId {
        self.intern(TyKind::Struct(fields))
    }

    pub fn tuple(&mut self, elems: Vec<TyId>) -> TyId {
        self.intern(TyKind::Tuple(elems))
    }

    pub fn signature(&mut self, params: Vec<TyId>, results: Vec<TyId>) -> TyId {
        self.intern(TyKind::Signature(Signature::new(params, results)))
    }

    pub fn interface(&mut self, methods: Vec<Method>) -> TyId {
        self.intern(TyKind::Interface(methods))
    }

    /// The universal empty interface.
    pub fn any(&mut self) -> TyId {
        self.interface(Vec::new())
    }

    /// `*int8`, the raw byte pointer used for C strings.
    pub fn cstr(&mut self) -> TyId {
        let int8 = self.basic(BasicKind::Int8);
        self.pointer(int8)
    }

    /// Declares (or finds) the named type `pkg.name`. The underlying type is left
    /// unset for a fresh declaration.
    pub fn declare_named(&mut self, pkg: &str, name: &str) -> TyId {
        let key = (pkg.to_string(), name.to_string());
        let id = match self.named_index.get(&key) {
            Some(id) => *id,
            None => {
                let id = NamedId(self.named.len() as u32);
                self.named.push(NamedType {
                    pkg: pkg.to_string(),
                    name: name.to_string(),
                    underlying: None,
                });
                self.named_index.insert(key, id);
                id
            }
        };
        self.intern(TyKind::Named(id))
    }

    /// Completes a named type declaration.
    ///
    /// Returns the previous underlying type when one was already set.
    pub fn set_underlying(&mut self, named: TyId, underlying: TyId) -> Option<TyId> {
        let id = match self.kind(named) {
            TyKind::Named(id) => *id,
            _ => return None,
        };
        let underlying = self.underlying(underlying);
        self.named[id.0 as usize].underlying.replace(underlying)
    }

    /// Declares `pkg.name` with the given underlying type in one step.
    pub fn named(&mut self, pkg: &str, name: &str, underlying: TyId) -> TyId {
        let ty = self.declare_named(pkg, name);
        self.set_underlying(ty, underlying);
        ty
    }

    pub fn lookup_named(&self, pkg: &str, name: &str) -> Option<TyId> {
        let id = self.named_index.get(&(pkg.to_string(), name.to_string()))?;
        self.interned.get(&TyKind::Named(*id)).copied()
    }

    pub fn named_type(&self, id: NamedId) -> &NamedType {
        &self.named[id.0 as usize]
    }

    /// Follows named types to their underlying structure. An incomplete named
    /// type is its own underlying type.
    pub fn underlying(&self, ty: TyId) -> TyId {
        let mut current = ty;
        while let TyKind::Named(id) = self.kind(current) {
            match self.named[id.0 as usize].underlying {
                Some(next) if next != current => current = next,
                _ => break,
            }
        }
        current
    }

    /// The signature behind `ty` (possibly through a named type).
    pub fn as_signature(&self, ty: TyId) -> Option<&Signature> {
        match self.kind(self.underlying(ty)) {
            TyKind::Signature(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn is_interface(&self, ty: TyId) -> bool {
        matches!(self.kind(self.underlying(ty)), TyKind::Interface(_))
    }

    /// Whether `ty` is the empty interface (directly, not through a name).
    pub fn is_any(&self, ty: TyId) -> bool {
        matches!(self.kind(ty), TyKind::Interface(methods) if methods.is_empty())
    }

    pub fn display(&self, ty: TyId) -> TypeDisplay<'_> {
        TypeDisplay { table: self, ty }
    }
}

/// Source-syntax rendering of a type, e.g. `func(int, []string) *pkg.T`.
pub struct TypeDisplay<'a> {
    table: &'a TypeTable,
    ty: TyId,
}

impl TypeDisplay<'_> {
    fn child(&self, ty: TyId) -> Self {
        TypeDisplay { table: self.table, ty }
    }

    fn list(&self, f: &mut fmt::Formatter<'_>, tys: &[TyId]) -> fmt::Result {
        for (i, ty) in tys.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", self.child(*ty))?;
        }
        Ok(())
    }

    fn signature(&self, f: &mut fmt::Formatter<'_>, sig: &Signature) -> fmt::Result {
        f.write_str("(")?;
        self.list(f, &sig.params)?;
        if sig.variadic {
            f.write_str("...")?;
        }
        f.write_str(")")?;
        match sig.results.len() {
            0 => Ok(()),
            1 => write!(f, " {}", self.child(sig.results[0])),
            _ => {
                f.write_str(" (")?;
                self.list(f, &sig.results)?;
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.table.kind(self.ty) {
            TyKind::Basic(kind) => f.write_str(kind.name()),
            TyKind::Pointer(elem) => write!(f, "*{}", self.child(*elem)),
            TyKind::Slice(elem) => write!(f, "[]{}", self.child(*elem)),
            TyKind::Array { elem, len } => write!(f, "[{}]{}", len, self.child(*elem)),
            TyKind::Map { key, value } => write!(f, "map[{}]{}", self.child(*key), self.child(*value)),
            TyKind::Chan { elem, dir } => match dir {
                ChanDir::Both => write!(f, "chan {}", self.child(*elem)),
                ChanDir::Send => write!(f, "chan<- {}", self.child(*elem)),
                ChanDir::Recv => write!(f, "<-chan {}", self.child(*elem)),
            },
            TyKind::Struct(fields) => {
                f.write_str("struct{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    if field.embedded {
                        write!(f, "{}", self.child(field.ty))?;
                    } else {
                        write!(f, "{} {}", field.name, self.child(field.ty))?;
                    }
                }
                f.write_str("}")
            }
            TyKind::Tuple(elems) => {
                f.write_str("(")?;
                self.list(f, elems)?;
                f.write_str(")")
            }
            TyKind::Signature(sig) => {
                f.write_str("func")?;
                self.signature(f, sig)
            }
            TyKind::Interface(methods) if methods.is_empty() => f.write_str("interface{}"),
            TyKind::Interface(methods) => {
                f.write_str("interface{")?;
                for (i, method) in methods.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    f.write_str(&method.name)?;
                    match self.table.kind(method.sig) {
                        TyKind::Signature(sig) => self.signature(f, sig)?,
                        _ => write!(f, " {}", self.child(method.sig))?,
                    }
                }
                f.write_str("}")
            }
            TyKind::Named(id) => f.write_str(&self.table.named_type(*id).qualified_name()),
        }
    }
}
