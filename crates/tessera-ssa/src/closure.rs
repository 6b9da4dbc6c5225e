//! Closure stubs.
//!
//! A closure value is a `{ fn, ctx }` pair whose function takes the context
//! as one extra trailing parameter. Plain functions do not, so turning a
//! function into a closure goes through a stub: a function with the
//! context parameter appended that tail-calls the original.

use crate::error::{SsaError, SsaResult};
use crate::expr::Expr;
use crate::package::{with_table, Function, Package};
use crate::types::ValueKind;
use tessera_ir::{Linkage, Repr};
use tessera_types::{BasicKind, Signature, TyId, TyKind};

/// Prepended to the wrapped function's link name to name its stub.
pub const CLOSURE_STUB_PREFIX: &str = "__tessera_stub__.";

impl Package<'_> {
    /// Returns the stub for the function symbol `func`, creating it on first
    /// request.
    pub fn closure_stub(&mut self, func: &Expr) -> SsaResult<Function> {
        let name = match (&func.value.repr, func.kind()) {
            (Repr::Global(name), ValueKind::Func) => name.clone(),
            _ => {
                return Err(SsaError::invariant(format!(
                    "closure stubs wrap function symbols, got `{}`",
                    func.value
                )))
            }
        };
        let sig = self
            .prog
            .types
            .as_signature(func.raw())
            .cloned()
            .ok_or_else(|| SsaError::invariant(format!("`{}` has no signature", name)))?;
        if sig.results.len() > 1 {
            return Err(SsaError::unsupported(format!(
                "closure `{}` with {} results",
                name,
                sig.results.len()
            )));
        }
        let stub_sig = self.stub_signature(&sig);
        let stub = with_table!(self.stubs, &name, self.build_closure_stub(&name, func, &sig, stub_sig))?;
        if stub.sig != stub_sig {
            return Err(SsaError::invariant(format!(
                "closure stub for `{}` was created with a different signature",
                name
            )));
        }
        Ok(stub)
    }

    /// The signature with an `unsafe.Pointer` context parameter appended.
    fn stub_signature(&mut self, sig: &Signature) -> TyId {
        let types = &mut self.prog.types;
        let ctx = types.basic(BasicKind::UnsafePointer);
        let mut params = sig.params.clone();
        params.push(ctx);
        types.intern(TyKind::Signature(Signature { params, results: sig.results.clone(), variadic: sig.variadic }))
    }

    fn build_closure_stub(&mut self, name: &str, func: &Expr, sig: &Signature, stub_sig: TyId) -> SsaResult<Function> {
        let stub = self.new_func(&format!("{}{}", CLOSURE_STUB_PREFIX, name), stub_sig)?;
        self.set_linkage(&stub, Linkage::LinkOnceAny);
        let mut b = self.make_body(&stub)?;
        let args = (0..sig.params.len()).map(|i| b.param(i)).collect::<SsaResult<Vec<_>>>()?;
        let ret = b.tail_call(func, &args)?;
        if sig.results.is_empty() {
            b.ret_void();
        } else {
            b.ret(&ret);
        }
        Ok(stub)
    }
}
