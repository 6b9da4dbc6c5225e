use crate::types::{escape_bytes, Ident, LlType};
use std::fmt;

/// How a value is spelled at a use site.
#[derive(Debug, Clone, PartialEq)]
pub enum Repr {
    /// A named local: an instruction result or a parameter.
    Local(String),
    Global(String),
    Int(i64),
    /// Floating point constant, printed in the exact hexadecimal form.
    Float(f64),
    Null,
    Undef,
    Zero,
    /// Constant aggregate of the given (typed) elements.
    Struct(Vec<Value>),
    /// Constant byte array.
    Bytes(Vec<u8>),
}

/// A typed IR value.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub ty: LlType,
    pub repr: Repr,
}

impl Value {
    pub fn local(ty: LlType, name: impl Into<String>) -> Self {
        Value { ty, repr: Repr::Local(name.into()) }
    }

    /// Address of a global symbol.
    pub fn global(name: impl Into<String>) -> Self {
        Value { ty: LlType::Ptr, repr: Repr::Global(name.into()) }
    }

    pub fn const_int(ty: LlType, value: i64) -> Self {
        Value { ty, repr: Repr::Int(value) }
    }

    pub fn const_bool(value: bool) -> Self {
        Value::const_int(LlType::i1(), value as i64)
    }

    pub fn const_float(ty: LlType, value: f64) -> Self {
        Value { ty, repr: Repr::Float(value) }
    }

    /// The null pointer.
    pub fn null() -> Self {
        Value { ty: LlType::Ptr, repr: Repr::Null }
    }

    pub fn undef(ty: LlType) -> Self {
        Value { ty, repr: Repr::Undef }
    }

    /// The all-zero value of any type.
    pub fn zero(ty: LlType) -> Self {
        match ty {
            LlType::Ptr => Value::null(),
            LlType::Int(_) => Value::const_int(ty, 0),
            LlType::Float | LlType::Double => Value::const_float(ty, 0.0),
            _ => Value { ty, repr: Repr::Zero },
        }
    }

    pub fn const_struct(ty: LlType, fields: Vec<Value>) -> Self {
        Value { ty, repr: Repr::Struct(fields) }
    }

    /// NUL-terminated byte string constant of type `[len+1 x i8]`.
    pub fn const_cstring(text: &str) -> Self {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        Value {
            ty: LlType::Array(bytes.len() as u64, Box::new(LlType::i8())),
            repr: Repr::Bytes(bytes),
        }
    }

    pub fn is_constant(&self) -> bool {
        !matches!(self.repr, Repr::Local(_))
    }

    /// `<type> <value>`, the form used in operand lists.
    pub fn typed(&self) -> Typed<'_> {
        Typed(self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Local(name) => write!(f, "{}", Ident::local(name)),
            Repr::Global(name) => write!(f, "{}", Ident::global(name)),
            Repr::Int(value) if self.ty == LlType::i1() => {
                f.write_str(if *value != 0 { "true" } else { "false" })
            }
            Repr::Int(value) => write!(f, "{}", value),
            Repr::Float(value) => {
                let bits = match self.ty {
                    // Single precision constants must be exactly representable; widen first.
                    LlType::Float => (*value as f32 as f64).to_bits(),
                    _ => value.to_bits(),
                };
                write!(f, "0x{:016X}", bits)
            }
            Repr::Null => f.write_str("null"),
            Repr::Undef => f.write_str("undef"),
            Repr::Zero => f.write_str("zeroinitializer"),
            Repr::Struct(fields) => {
                if fields.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", field.typed())?;
                }
                f.write_str(" }")
            }
            Repr::Bytes(bytes) => write!(f, "c\"{}\"", escape_bytes(bytes)),
        }
    }
}

pub struct Typed<'a>(&'a Value);

impl fmt::Display for Typed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0.ty, self.0)
    }
}
