use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A low-level IR type.
///
/// Pointers are opaque (`ptr`); only aggregates and scalars carry structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LlType {
    Void,
    /// Integer of the given bit width (`i1`, `i8`, ... `i64`).
    Int(u32),
    Float,
    Double,
    Ptr,
    Array(u64, Box<LlType>),
    /// Literal (anonymous) struct.
    Struct(Vec<LlType>),
    /// Identified struct, printed by name and defined once per module.
    Named(Rc<NamedStruct>),
    Func(Rc<FuncType>),
}

impl LlType {
    pub fn i1() -> Self {
        LlType::Int(1)
    }

    pub fn i8() -> Self {
        LlType::Int(8)
    }

    pub fn i32() -> Self {
        LlType::Int(32)
    }

    pub fn i64() -> Self {
        LlType::Int(64)
    }

    pub fn named(name: impl Into<String>, body: Vec<LlType>) -> Self {
        LlType::Named(Rc::new(NamedStruct { name: name.into(), body }))
    }

    pub fn func(ret: LlType, params: Vec<LlType>, variadic: bool) -> Self {
        LlType::Func(Rc::new(FuncType { ret, params, variadic }))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, LlType::Void)
    }

    pub fn is_ptr(&self) -> bool {
        matches!(self, LlType::Ptr)
    }

    /// Field types of a (literal or identified) struct.
    pub fn struct_fields(&self) -> Option<&[LlType]> {
        match self {
            LlType::Struct(fields) => Some(fields),
            LlType::Named(named) => Some(&named.body),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&Rc<FuncType>> {
        match self {
            LlType::Func(func) => Some(func),
            _ => None,
        }
    }

    /// Visits every identified struct reachable from this type, outermost first.
    pub fn walk_named(&self, visit: &mut impl FnMut(&Rc<NamedStruct>)) {
        match self {
            LlType::Array(_, elem) => elem.walk_named(visit),
            LlType::Struct(fields) => fields.iter().for_each(|f| f.walk_named(visit)),
            LlType::Named(named) => {
                visit(named);
                named.body.iter().for_each(|f| f.walk_named(visit));
            }
            LlType::Func(func) => {
                func.ret.walk_named(visit);
                func.params.iter().for_each(|p| p.walk_named(visit));
            }
            LlType::Void | LlType::Int(_) | LlType::Float | LlType::Double | LlType::Ptr => {}
        }
    }
}

/// An identified struct type. Identity is the name.
#[derive(Debug, Clone)]
pub struct NamedStruct {
    pub name: String,
    pub body: Vec<LlType>,
}

impl PartialEq for NamedStruct {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for NamedStruct {}

impl Hash for NamedStruct {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl NamedStruct {
    /// `%"name" = type { ... }`
    pub fn definition(&self) -> String {
        format!("{} = type {}", Ident::local(&self.name), StructBody(&self.body))
    }
}

/// A function type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncType {
    pub ret: LlType,
    pub params: Vec<LlType>,
    pub variadic: bool,
}

struct StructBody<'a>(&'a [LlType]);

impl fmt::Display for StructBody<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("{}");
        }
        f.write_str("{ ")?;
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", field)?;
        }
        f.write_str(" }")
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.ret)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        if self.variadic {
            if !self.params.is_empty() {
                f.write_str(", ")?;
            }
            f.write_str("...")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for LlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlType::Void => f.write_str("void"),
            LlType::Int(bits) => write!(f, "i{}", bits),
            LlType::Float => f.write_str("float"),
            LlType::Double => f.write_str("double"),
            LlType::Ptr => f.write_str("ptr"),
            LlType::Array(len, elem) => write!(f, "[{} x {}]", len, elem),
            LlType::Struct(fields) => write!(f, "{}", StructBody(fields)),
            LlType::Named(named) => write!(f, "{}", Ident::local(&named.name)),
            LlType::Func(func) => write!(f, "{}", func),
        }
    }
}

/// A `%local` or `@global` identifier, quoted when the name needs it.
pub struct Ident<'a> {
    sigil: char,
    name: &'a str,
}

impl<'a> Ident<'a> {
    pub fn local(name: &'a str) -> Self {
        Ident { sigil: '%', name }
    }

    pub fn global(name: &'a str) -> Self {
        Ident { sigil: '@', name }
    }
}

fn is_plain_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || "-$._".contains(c) => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || "-$._".contains(c))
}

impl fmt::Display for Ident<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if is_plain_ident(self.name) {
            write!(f, "{}{}", self.sigil, self.name)
        } else {
            write!(f, "{}\"{}\"", self.sigil, escape_bytes(self.name.as_bytes()))
        }
    }
}

/// Escapes bytes for use inside an IR string literal (`"..."` or `c"..."`).
pub fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if (0x20..=0x7E).contains(&b) && b != b'"' && b != b'\\' {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\{:02X}", b));
        }
    }
    out
}
