use crate::types::{Type, ValueKind};
use tessera_ir::Value;
use tessera_types::{Signature, TyId, TypeTable};

/// An IR value together with its lowered type.
///
/// For function symbols the lowered type's source type is the function's
/// signature, which is what closure stubs and calls recover arity from.
#[derive(Debug, Clone)]
pub struct Expr {
    pub value: Value,
    pub ty: Type,
}

impl Expr {
    pub fn new(value: Value, ty: Type) -> Self {
        Expr { value, ty }
    }

    pub fn kind(&self) -> ValueKind {
        self.ty.kind
    }

    /// The source type.
    pub fn raw(&self) -> TyId {
        self.ty.raw
    }

    pub fn signature<'t>(&self, types: &'t TypeTable) -> Option<&'t Signature> {
        types.as_signature(self.ty.raw)
    }

    pub fn is_void(&self) -> bool {
        self.ty.kind == ValueKind::Invalid
    }
}
