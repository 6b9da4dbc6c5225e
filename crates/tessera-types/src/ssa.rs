//! The SSA instruction model handed to the backend.
//!
//! Function bodies are straight-line sequences in A-normal form: every
//! instruction that produces a value binds it to a fresh [`ValueId`], and
//! operands are either such values, parameters, constants or references to
//! package-level symbols. References carry their types, so a package can be
//! lowered without looking into the packages it imports.

use crate::ty::TyId;

/// SSA register defined by an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

/// A package-level function, used as a value or as a call target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncRef {
    /// Link-level name, `<pkgpath>.<name>`.
    pub symbol: String,
    /// Signature type.
    pub sig: TyId,
}

/// A package-level variable reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalRef {
    pub symbol: String,
    /// Type of the stored value (not of the variable's address).
    pub ty: TyId,
}

/// Constant operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Const {
    Int { value: i64, ty: TyId },
    /// IEEE-754 bits, so that constants stay `Eq`.
    Float { bits: u64, ty: TyId },
    Bool(bool),
    String(String),
    /// The zero value of a pointer-like type.
    Nil(TyId),
}

impl Const {
    pub fn float(value: f64, ty: TyId) -> Self {
        Const::Float { bits: value.to_bits(), ty }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Value(ValueId),
    Param(usize),
    Const(Const),
    Func(FuncRef),
}

/// What a call invokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callee {
    /// A package-level function, called directly.
    Static(FuncRef),
    /// A function of the runtime-support package, by unqualified name.
    Runtime(String),
    /// A closure value.
    Closure(Operand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    Call {
        dst: Option<ValueId>,
        callee: Callee,
        args: Vec<Operand>,
    },
    /// Wraps a package-level function into a closure value with no bindings.
    MakeClosure { dst: ValueId, func: FuncRef },
    /// Calls a foreign object with the given arguments. `sig` is the
    /// source-level signature the callee was declared with.
    ForeignCall {
        dst: ValueId,
        callee: Operand,
        sig: TyId,
        args: Vec<Operand>,
    },
    /// Imports a foreign module by path, producing a foreign object.
    ImportForeignModule { dst: ValueId, path: String },
    /// Stores a foreign object into a foreign module variable.
    StoreForeignModule { global: String, value: Operand },
    Load { dst: ValueId, global: GlobalRef },
    Store { global: GlobalRef, value: Operand },
    Return(Vec<Operand>),
}

/// A package-level variable definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsaGlobal {
    /// Unqualified name.
    pub name: String,
    pub ty: TyId,
    /// Foreign module variables hold an imported module object.
    pub foreign_module: bool,
}

/// A function of the package being compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsaFunction {
    /// Unqualified name.
    pub name: String,
    pub sig: TyId,
    /// `None` for functions implemented elsewhere (declarations only).
    pub body: Option<Vec<Instr>>,
}
