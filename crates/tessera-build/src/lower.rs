//! Lowering of one source package onto a [`Package`].

use fxhash::FxHashMap;
use tessera_ssa::{Builder, Expr, Global, Package, Program, SsaError, SsaResult, FOREIGN_INIT};
use tessera_types::{full_name, BasicKind, Callee, Const, FuncRef, GlobalRef, Instr, Operand, SourcePackage, ValueId};

/// Name of the C entry point emitted for `main` packages.
pub const ENTRY_POINT: &str = "main";

/// Lowers `src` into a new package of `prog`.
///
/// `imports_use_foreign` tells a `main` package that some package in its
/// import closure calls into the foreign runtime, which must then be
/// initialized by the entry point even if `main` itself never does.
pub fn lower_package<'p>(
    prog: &'p mut Program,
    src: &SourcePackage,
    imports_use_foreign: bool,
) -> SsaResult<Package<'p>> {
    let mut pkg = prog.new_package(src.name(), src.path());

    for global in &src.globals {
        let name = full_name(src.path(), &global.name);
        if global.foreign_module {
            pkg.new_foreign_module_var(&name)?;
        } else {
            pkg.new_var(&name, global.ty)?;
        }
    }
    // Declare everything first so bodies can refer to any function.
    let funcs = src
        .functions
        .iter()
        .map(|func| pkg.new_func(&full_name(src.path(), &func.name), func.sig))
        .collect::<SsaResult<Vec<_>>>()?;
    for (func, declared) in src.functions.iter().zip(&funcs) {
        if let Some(body) = &func.body {
            let b = pkg.make_body(declared)?;
            FunctionLowering { b, values: FxHashMap::default() }.lower(declared.name(), body)?;
        }
    }

    if src.is_main() {
        emit_entry_point(&mut pkg, src, imports_use_foreign)?;
    }
    Ok(pkg)
}

/// `int main(int, char **)`: initializes the foreign runtime when the program
/// uses it, then calls the package's `main`.
fn emit_entry_point(pkg: &mut Package<'_>, src: &SourcePackage, imports_use_foreign: bool) -> SsaResult<()> {
    let user_main = src
        .functions
        .iter()
        .find(|func| func.name == ENTRY_POINT)
        .ok_or_else(|| SsaError::invariant(format!("package {} has no main function", src.path())))?;
    let user_main = pkg.new_func(&full_name(src.path(), ENTRY_POINT), user_main.sig)?;

    let needs_init = imports_use_foreign || pkg.prog().needs_foreign_init();
    let types = pkg.prog_mut().types_mut();
    let int32 = types.basic(BasicKind::Int32);
    let argv = types.basic(BasicKind::UnsafePointer);
    let entry_sig = types.signature(vec![int32, argv], vec![int32]);
    let init_sig = types.signature(Vec::new(), Vec::new());

    let entry = pkg.new_func(ENTRY_POINT, entry_sig)?;
    let init = if needs_init { Some(pkg.foreign_func(FOREIGN_INIT, init_sig)?) } else { None };
    let status = pkg.prog_mut().raw_type(int32)?;

    let mut b = pkg.make_body(&entry)?;
    if let Some(init) = init {
        b.call(init.expr(), &[])?;
    }
    b.call(user_main.expr(), &[])?;
    let zero = b.const_int(&status, 0)?;
    b.ret(&zero);
    Ok(())
}

struct FunctionLowering<'a, 'p> {
    b: Builder<'a, 'p>,
    values: FxHashMap<ValueId, Expr>,
}

impl FunctionLowering<'_, '_> {
    fn lower(mut self, name: &str, body: &[Instr]) -> SsaResult<()> {
        let mut returned = false;
        for instr in body {
            if returned {
                return Err(SsaError::invariant(format!("`{}` has instructions after its return", name)));
            }
            returned = self.instr(instr)?;
        }
        if !returned {
            // Falling off the end is only valid without results.
            self.b.ret_values(&[])?;
        }
        Ok(())
    }

    /// Lowers one instruction; returns whether it ended the function.
    fn instr(&mut self, instr: &Instr) -> SsaResult<bool> {
        match instr {
            Instr::Call { dst, callee, args } => {
                let callee = match callee {
                    Callee::Static(func) => self.func(func)?,
                    Callee::Runtime(name) => self.b.package().rt_func(name)?,
                    Callee::Closure(value) => self.operand(value)?,
                };
                let args = self.operands(args)?;
                let result = self.b.call(&callee, &args)?;
                if let Some(dst) = dst {
                    self.define(*dst, result)?;
                }
            }
            Instr::MakeClosure { dst, func } => {
                let func = self.func(func)?;
                let closure = self.b.make_closure(&func)?;
                self.define(*dst, closure)?;
            }
            Instr::ForeignCall { dst, callee, sig, args } => {
                let types = self.b.package().prog().types();
                let arity = types
                    .as_signature(*sig)
                    .map(|sig| sig.arity())
                    .ok_or_else(|| SsaError::invariant(format!("`{}` is not a function type", types.display(*sig))))?;
                if arity != args.len() {
                    return Err(SsaError::invariant(format!(
                        "foreign call passes {} arguments to a callee of {} parameters",
                        args.len(),
                        arity
                    )));
                }
                let callee = self.operand(callee)?;
                let args = self.operands(args)?;
                let result = self.b.foreign_call(&callee, &args)?;
                self.define(*dst, result)?;
            }
            Instr::ImportForeignModule { dst, path } => {
                let module = self.b.import_foreign_module(path)?;
                self.define(*dst, module)?;
            }
            Instr::StoreForeignModule { global, value } => {
                let var = self.b.package().new_foreign_module_var(global)?;
                let value = self.operand(value)?;
                self.b.store(&var, &value)?;
            }
            Instr::Load { dst, global } => {
                let var = self.global(global)?;
                let value = self.b.load(&var);
                self.define(*dst, value)?;
            }
            Instr::Store { global, value } => {
                let var = self.global(global)?;
                let value = self.operand(value)?;
                self.b.store(&var, &value)?;
            }
            Instr::Return(values) => {
                let values = self.operands(values)?;
                self.b.ret_values(&values)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn define(&mut self, dst: ValueId, value: Expr) -> SsaResult<()> {
        if self.values.insert(dst, value).is_some() {
            return Err(SsaError::invariant(format!("value %{} is defined twice", dst.0)));
        }
        Ok(())
    }

    fn func(&mut self, func: &FuncRef) -> SsaResult<Expr> {
        Ok(self.b.package().new_func(&func.symbol, func.sig)?.expr().clone())
    }

    /// A package variable; declared as external when another package
    /// defines it.
    fn global(&mut self, global: &GlobalRef) -> SsaResult<Global> {
        self.b.package().extern_var(&global.symbol, global.ty)
    }

    fn operands(&mut self, operands: &[Operand]) -> SsaResult<Vec<Expr>> {
        operands.iter().map(|operand| self.operand(operand)).collect()
    }

    fn operand(&mut self, operand: &Operand) -> SsaResult<Expr> {
        match operand {
            Operand::Value(id) => self
                .values
                .get(id)
                .cloned()
                .ok_or_else(|| SsaError::invariant(format!("value %{} is used before it is defined", id.0))),
            Operand::Param(i) => self.b.param(*i),
            Operand::Func(func) => {
                let func = self.func(func)?;
                self.b.make_closure(&func)
            }
            Operand::Const(value) => self.constant(value),
        }
    }

    fn constant(&mut self, value: &Const) -> SsaResult<Expr> {
        match value {
            Const::Int { value, ty } => {
                let ty = self.b.package().prog_mut().raw_type(*ty)?;
                self.b.const_int(&ty, *value)
            }
            Const::Float { bits, ty } => {
                let ty = self.b.package().prog_mut().raw_type(*ty)?;
                self.b.const_float(&ty, f64::from_bits(*bits))
            }
            Const::Bool(value) => self.b.const_bool(*value),
            Const::String(text) => self.b.string_lit(text),
            Const::Nil(ty) => {
                let ty = self.b.package().prog_mut().raw_type(*ty)?;
                Ok(self.b.null(&ty))
            }
        }
    }
}
