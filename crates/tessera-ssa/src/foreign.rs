//! Calls into the foreign object runtime.
//!
//! Foreign objects are opaque `*Object` pointers. Calling one goes through
//! one of three fixed-arity entry points; each is declared in a package the
//! first time a call site needs it.

use crate::builder::Builder;
use crate::error::{SsaError, SsaResult};
use crate::expr::Expr;
use crate::package::{with_table, Function, Global, Package};
use crate::types::ValueKind;
use tessera_ir::{Linkage, Value};
use tessera_types::TyId;

pub const IMPORT_MODULE: &str = "PyImport_ImportModule";
pub const CALL_NO_ARGS: &str = "PyObject_CallNoArgs";
pub const CALL_ONE_ARG: &str = "PyObject_CallOneArg";
pub const CALL_TWO_ARGS: &str = "PyObject_CallTwoArgs";
/// Initializes the foreign runtime; called from the entry point of programs
/// that use it.
pub const FOREIGN_INIT: &str = "Py_Initialize";

impl Package<'_> {
    /// Declares the foreign entry point `name` (a C symbol).
    pub fn foreign_func(&mut self, name: &str, sig: TyId) -> SsaResult<Function> {
        self.prog.needs_foreign_init = true;
        with_table!(self.foreign_fns, name, self.declare_func(name, sig))
    }

    /// A global holding an imported foreign module, initially null. It may be
    /// emitted by several packages; the linker keeps one.
    pub fn new_foreign_module_var(&mut self, name: &str) -> SsaResult<Global> {
        self.prog.needs_foreign_init = true;
        let elem = self.prog.foreign_object_ptr()?;
        self.new_var_with(name, elem, Value::null(), Linkage::LinkOnceAny)
    }
}

impl Builder<'_, '_> {
    /// Imports the foreign module at `path`, yielding its `*Object`.
    pub fn import_foreign_module(&mut self, path: &str) -> SsaResult<Expr> {
        let sig = self.package().prog.import_module_sig()?;
        let import = self.package().foreign_func(IMPORT_MODULE, sig)?;
        let path = self.cstr(path)?;
        self.call(import.expr(), &[path])
    }

    /// Calls the foreign object `callee` with up to two foreign object
    /// arguments.
    pub fn foreign_call(&mut self, callee: &Expr, args: &[Expr]) -> SsaResult<Expr> {
        for value in std::iter::once(callee).chain(args) {
            if value.kind() != ValueKind::Pointer {
                return Err(SsaError::invariant(format!(
                    "foreign calls take foreign objects, got a value of kind {:?}",
                    value.kind()
                )));
            }
        }
        let prog = &mut *self.package().prog;
        let (thunk, sig) = match args.len() {
            0 => (CALL_NO_ARGS, prog.call_no_arg_sig()?),
            1 => (CALL_ONE_ARG, prog.call_one_arg_sig()?),
            2 => (CALL_TWO_ARGS, prog.call_two_args_sig()?),
            n => return Err(SsaError::unsupported(format!("foreign call with {} arguments", n))),
        };
        let thunk = self.package().foreign_func(thunk, sig)?;
        let mut call_args = Vec::with_capacity(args.len() + 1);
        call_args.push(callee.clone());
        call_args.extend_from_slice(args);
        self.call(thunk.expr(), &call_args)
    }
}
