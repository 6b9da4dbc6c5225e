use crate::error::{SsaError, SsaResult};
use crate::expr::Expr;
use crate::package::{Global, Package};
use crate::types::{Type, ValueKind};
use std::rc::Rc;
use tessera_ir::{BlockId, FuncId, FuncType, Inst, InstRef, LlType, Value};
use tessera_types::{Signature, TyId};

/// Appends instructions to one function body.
pub struct Builder<'a, 'p> {
    pkg: &'a mut Package<'p>,
    func: FuncId,
    sig: TyId,
    block: BlockId,
}

impl<'a, 'p> Builder<'a, 'p> {
    pub(crate) fn new(pkg: &'a mut Package<'p>, func: FuncId, sig: TyId, block: BlockId) -> Self {
        Builder { pkg, func, sig, block }
    }

    pub fn package(&mut self) -> &mut Package<'p> {
        self.pkg
    }

    fn emit(&mut self, inst: Inst) -> (InstRef, Option<Value>) {
        if self.pkg.prog.debug().instructions {
            log::debug!("{}: {}", self.pkg.module.function(self.func).name, inst);
        }
        self.pkg.module.function_mut(self.func).push(self.block, inst)
    }

    fn signature_of(&self, ty: TyId) -> SsaResult<Signature> {
        let types = &self.pkg.prog.types;
        types
            .as_signature(ty)
            .cloned()
            .ok_or_else(|| SsaError::invariant(format!("`{}` is not a function type", types.display(ty))))
    }

    /// The `i`-th parameter of the function being built.
    pub fn param(&mut self, i: usize) -> SsaResult<Expr> {
        let sig = self.signature_of(self.sig)?;
        let raw = *sig
            .params
            .get(i)
            .ok_or_else(|| SsaError::invariant(format!("parameter {} out of range", i)))?;
        let ty = self.pkg.prog.raw_type(raw)?;
        let value = self
            .pkg
            .module
            .function(self.func)
            .param(i)
            .ok_or_else(|| SsaError::invariant(format!("parameter {} out of range", i)))?;
        Ok(Expr::new(value, ty))
    }

    /// Calls a function symbol or a closure value.
    pub fn call(&mut self, callee: &Expr, args: &[Expr]) -> SsaResult<Expr> {
        self.emit_call(callee, args, false)
    }

    /// Like [`Builder::call`], with the call marked as a tail call.
    pub fn tail_call(&mut self, callee: &Expr, args: &[Expr]) -> SsaResult<Expr> {
        self.emit_call(callee, args, true)
    }

    fn emit_call(&mut self, callee: &Expr, args: &[Expr], tail: bool) -> SsaResult<Expr> {
        let sig = self.signature_of(callee.raw())?;
        if sig.params.len() != args.len() {
            return Err(SsaError::invariant(format!(
                "call passes {} arguments to a function of {} parameters",
                args.len(),
                sig.params.len()
            )));
        }
        let mut values = args.iter().map(|a| a.value.clone()).collect::<Vec<_>>();
        let (target, ty) = match callee.kind() {
            ValueKind::Func => (callee.value.clone(), self.pkg.prog.func_type(callee.raw())?),
            ValueKind::Closure => {
                // Closure functions take the context as a trailing argument.
                let fn_ptr = self.extract(&callee.value, 0, LlType::Ptr);
                let ctx = self.extract(&callee.value, 1, LlType::Ptr);
                values.push(ctx);
                let plain = self.pkg.prog.func_type(callee.raw())?;
                let mut params = plain.params.clone();
                params.push(LlType::Ptr);
                (fn_ptr, Rc::new(FuncType { ret: plain.ret.clone(), params, variadic: false }))
            }
            other => {
                return Err(SsaError::invariant(format!("cannot call a value of kind {:?}", other)));
            }
        };
        let result_ty = self.results_type(&sig)?;
        let (_, value) = self.emit(Inst::Call { callee: target, ty, args: values, tail });
        let value = value.unwrap_or_else(|| Value::undef(LlType::Void));
        Ok(Expr::new(value, result_ty))
    }

    /// Lowered type of what a call with signature `sig` produces.
    fn results_type(&mut self, sig: &Signature) -> SsaResult<Type> {
        match sig.results.as_slice() {
            [] => self.pkg.prog.void(),
            [single] => self.pkg.prog.raw_type(*single),
            results => {
                let tuple = self.pkg.prog.types.tuple(results.to_vec());
                self.pkg.prog.raw_type(tuple)
            }
        }
    }

    fn extract(&mut self, agg: &Value, index: u32, ty: LlType) -> Value {
        let (_, value) = self.emit(Inst::ExtractValue { agg: agg.clone(), index, ty: ty.clone() });
        value.unwrap_or_else(|| Value::undef(ty))
    }

    pub fn ret(&mut self, value: &Expr) {
        self.emit(Inst::Ret(Some(value.value.clone())));
    }

    pub fn ret_void(&mut self) {
        self.emit(Inst::Ret(None));
    }

    /// Returns the function's results: nothing, one value, or a tuple.
    pub fn ret_values(&mut self, values: &[Expr]) -> SsaResult<()> {
        let sig = self.signature_of(self.sig)?;
        if sig.results.len() != values.len() {
            return Err(SsaError::invariant(format!(
                "returning {} values from a function with {} results",
                values.len(),
                sig.results.len()
            )));
        }
        match values {
            [] => self.ret_void(),
            [single] => self.ret(single),
            many => {
                let ty = self.results_type(&sig)?;
                let fields = many.iter().map(|v| v.value.clone()).collect();
                let tuple = self.aggregate_value(&ty, fields)?;
                self.ret(&tuple);
            }
        }
        Ok(())
    }

    /// Builds a struct value of type `ty` from its fields. Constant fields
    /// give a constant; otherwise the value is assembled field by field.
    pub fn aggregate_value(&mut self, ty: &Type, fields: Vec<Value>) -> SsaResult<Expr> {
        let expected = ty
            .ll
            .struct_fields()
            .ok_or_else(|| SsaError::invariant(format!("`{}` is not an aggregate", ty.ll)))?;
        if expected.len() != fields.len() {
            return Err(SsaError::invariant(format!(
                "aggregate `{}` has {} fields, got {}",
                ty.ll,
                expected.len(),
                fields.len()
            )));
        }
        if fields.iter().all(Value::is_constant) {
            return Ok(Expr::new(Value::const_struct(ty.ll.clone(), fields), ty.clone()));
        }
        let mut agg = Value::undef(ty.ll.clone());
        for (index, elem) in fields.into_iter().enumerate() {
            let (_, value) = self.emit(Inst::InsertValue { agg, elem, index: index as u32 });
            agg = value.unwrap_or_else(|| Value::undef(ty.ll.clone()));
        }
        Ok(Expr::new(agg, ty.clone()))
    }

    /// The zero value of a pointer-like type.
    pub fn null(&mut self, ty: &Type) -> Expr {
        Expr::new(Value::zero(ty.ll.clone()), ty.clone())
    }

    pub fn const_int(&mut self, ty: &Type, value: i64) -> SsaResult<Expr> {
        match ty.kind {
            ValueKind::Signed | ValueKind::Unsigned => Ok(Expr::new(Value::const_int(ty.ll.clone(), value), ty.clone())),
            other => Err(SsaError::invariant(format!("integer constant of kind {:?}", other))),
        }
    }

    pub fn const_bool(&mut self, value: bool) -> SsaResult<Expr> {
        let ty = self.pkg.prog.bool()?;
        Ok(Expr::new(Value::const_bool(value), ty))
    }

    pub fn const_float(&mut self, ty: &Type, value: f64) -> SsaResult<Expr> {
        match ty.kind {
            ValueKind::Float => Ok(Expr::new(Value::const_float(ty.ll.clone(), value), ty.clone())),
            other => Err(SsaError::invariant(format!("float constant of kind {:?}", other))),
        }
    }

    /// Address of a NUL-terminated copy of `text`, typed `*int8`.
    pub fn cstr(&mut self, text: &str) -> SsaResult<Expr> {
        let id = self.pkg.cstr_global(text)?;
        let name = self.pkg.module.global(id).name.clone();
        let ty = self.pkg.prog.cstr()?;
        Ok(Expr::new(Value::global(name), ty))
    }

    /// A constant of the runtime string type: `{ data, len }`.
    pub fn string_lit(&mut self, text: &str) -> SsaResult<Expr> {
        let ty = self.pkg.prog.string()?;
        let fields = ty.ll.struct_fields().map(<[LlType]>::to_vec).unwrap_or_default();
        let len_ty = match fields.as_slice() {
            [LlType::Ptr, len @ LlType::Int(_)] => len.clone(),
            _ => {
                return Err(SsaError::invariant(format!(
                    "runtime String must be {{ ptr, int }}, found `{}`",
                    ty.ll
                )))
            }
        };
        let data = self.cstr(text)?;
        let len = Value::const_int(len_ty, text.len() as i64);
        self.aggregate_value(&ty, vec![data.value, len])
    }

    pub fn load(&mut self, global: &Global) -> Expr {
        let ty = global.elem.clone();
        let (_, value) = self.emit(Inst::Load { ty: ty.ll.clone(), ptr: global.expr.value.clone() });
        Expr::new(value.unwrap_or_else(|| Value::undef(ty.ll.clone())), ty)
    }

    pub fn store(&mut self, global: &Global, value: &Expr) -> SsaResult<()> {
        if value.ty.ll != global.elem.ll {
            return Err(SsaError::invariant(format!(
                "storing `{}` into `{}` of type `{}`",
                value.ty.ll, global.name, global.elem.ll
            )));
        }
        self.emit(Inst::Store { value: value.value.clone(), ptr: global.expr.value.clone() });
        Ok(())
    }

    /// Wraps a function symbol into a closure value with no context.
    pub fn make_closure(&mut self, func: &Expr) -> SsaResult<Expr> {
        let stub = self.pkg.closure_stub(func)?;
        let closure = self.pkg.prog.raw_type(func.raw())?;
        self.aggregate_value(&closure, vec![stub.expr.value.clone(), Value::null()])
    }
}
