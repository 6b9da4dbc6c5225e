use crate::builder::Builder;
use crate::error::{SsaError, SsaResult};
use crate::expr::Expr;
use crate::program::Program;
use crate::types::Type;
use fxhash::FxHashMap;
use indexmap::IndexMap;
use std::fmt;
use std::path::Path;
use tessera_ir::{self as ir, FuncId, GlobalId, Linkage, Module, Value};
use tessera_types::TyId;

/// Name-keyed entries of one kind, each created at most once.
#[derive(Debug, Clone)]
pub struct SymbolTable<T> {
    entries: IndexMap<String, T>,
}

impl<T> Default for SymbolTable<T> {
    fn default() -> Self {
        SymbolTable { entries: IndexMap::new() }
    }
}

impl<T: Clone> SymbolTable<T> {
    /// Returns the entry for `name`, running `create` only if there is none.
    pub fn get_or_create(&mut self, name: &str, create: impl FnOnce() -> SsaResult<T>) -> SsaResult<T> {
        if let Some(entry) = self.entries.get(name) {
            return Ok(entry.clone());
        }
        let entry = create()?;
        self.entries.insert(name.to_string(), entry.clone());
        Ok(entry)
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A global variable of a package.
#[derive(Debug, Clone)]
pub struct Global {
    pub(crate) id: GlobalId,
    pub(crate) name: String,
    /// The variable's address.
    pub(crate) expr: Expr,
    /// Type of the stored value.
    pub(crate) elem: Type,
}

impl Global {
    pub fn id(&self) -> GlobalId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn elem(&self) -> &Type {
        &self.elem
    }
}

/// A function declared (and possibly defined) in a package.
#[derive(Debug, Clone)]
pub struct Function {
    pub(crate) id: FuncId,
    pub(crate) name: String,
    pub(crate) sig: TyId,
    pub(crate) expr: Expr,
}

impl Function {
    pub fn id(&self) -> FuncId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sig(&self) -> TyId {
        self.sig
    }

    /// The function's address, usable as a call target.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

/// Runs `create` against `$table` while the table is detached from the
/// package, so that the constructor can use the rest of the package freely.
macro_rules! with_table {
    ($self:ident . $table:ident, $name:expr, $create:expr) => {{
        let mut table = std::mem::take(&mut $self.$table);
        let result = table.get_or_create($name, || $create);
        $self.$table = table;
        result
    }};
}
pub(crate) use with_table;

/// One compilation unit: a module under construction and its symbol tables.
pub struct Package<'p> {
    pub(crate) prog: &'p mut Program,
    name: String,
    path: String,
    pub(crate) module: Module,
    vars: SymbolTable<Global>,
    fns: SymbolTable<Function>,
    pub(crate) stubs: SymbolTable<Function>,
    pub(crate) foreign_fns: SymbolTable<Function>,
    cstrs: FxHashMap<String, GlobalId>,
}

impl<'p> Package<'p> {
    pub(crate) fn new(prog: &'p mut Program, name: &str, path: &str) -> Self {
        let mut module = Module::new(path);
        module.triple = Some(prog.target().to_string());
        module.datalayout = prog.target().datalayout().map(str::to_string);
        Package {
            prog,
            name: name.to_string(),
            path: path.to_string(),
            module,
            vars: SymbolTable::default(),
            fns: SymbolTable::default(),
            stubs: SymbolTable::default(),
            foreign_fns: SymbolTable::default(),
            cstrs: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn prog(&self) -> &Program {
        self.prog
    }

    pub fn prog_mut(&mut self) -> &mut Program {
        self.prog
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn vars(&self) -> &SymbolTable<Global> {
        &self.vars
    }

    pub fn functions(&self) -> &SymbolTable<Function> {
        &self.fns
    }

    pub fn closure_stubs(&self) -> &SymbolTable<Function> {
        &self.stubs
    }

    pub fn foreign_funcs(&self) -> &SymbolTable<Function> {
        &self.foreign_fns
    }

    /// Defines a package variable of source type `ty`, zero-initialized.
    pub fn new_var(&mut self, name: &str, ty: TyId) -> SsaResult<Global> {
        with_table!(self.vars, name, {
            let elem = self.prog.raw_type(ty)?;
            let zero = Value::zero(elem.ll.clone());
            self.declare_var(name, elem, Some(zero), Linkage::External)
        })
    }

    /// Declares a variable defined by another package.
    pub fn extern_var(&mut self, name: &str, ty: TyId) -> SsaResult<Global> {
        with_table!(self.vars, name, {
            let elem = self.prog.raw_type(ty)?;
            self.declare_var(name, elem, None, Linkage::External)
        })
    }

    pub(crate) fn new_var_with(
        &mut self,
        name: &str,
        elem: Type,
        init: Value,
        linkage: Linkage,
    ) -> SsaResult<Global> {
        with_table!(self.vars, name, self.declare_var(name, elem, Some(init), linkage))
    }

    fn declare_var(&mut self, name: &str, elem: Type, init: Option<Value>, linkage: Linkage) -> SsaResult<Global> {
        let mut global = ir::Global::new(name, elem.ll.clone());
        global.initializer = init;
        global.linkage = linkage;
        let id = self.module.add_global(global)?;
        let ptr = self.prog.pointer(&elem)?;
        Ok(Global { id, name: name.to_string(), expr: Expr::new(Value::global(name), ptr), elem })
    }

    /// Declares a function with source signature `sig` under its link name.
    pub fn new_func(&mut self, name: &str, sig: TyId) -> SsaResult<Function> {
        with_table!(self.fns, name, self.declare_func(name, sig))
    }

    /// Declares the runtime package function `name`.
    pub fn rt_func(&mut self, name: &str) -> SsaResult<Expr> {
        let (full_name, sig) = self.prog.runtime_func(name)?;
        Ok(self.new_func(&full_name, sig)?.expr)
    }

    pub(crate) fn declare_func(&mut self, name: &str, sig: TyId) -> SsaResult<Function> {
        let ty = self.prog.func_type(sig)?;
        let id = self.module.add_function(ir::Function::new(name, ty))?;
        let ptr = self.prog.func_ptr_type(sig)?;
        Ok(Function { id, name: name.to_string(), sig, expr: Expr::new(Value::global(name), ptr) })
    }

    pub fn set_linkage(&mut self, func: &Function, linkage: Linkage) {
        self.module.function_mut(func.id).set_linkage(linkage);
    }

    /// Starts the body of a declared function.
    pub fn make_body(&mut self, func: &Function) -> SsaResult<Builder<'_, 'p>> {
        let f = self.module.function_mut(func.id);
        if !f.is_declaration() {
            return Err(SsaError::invariant(format!("function `{}` already has a body", func.name)));
        }
        let block = f.append_block("entry");
        Ok(Builder::new(self, func.id, func.sig, block))
    }

    /// A private NUL-terminated string constant, shared between uses of the
    /// same text.
    pub(crate) fn cstr_global(&mut self, text: &str) -> SsaResult<GlobalId> {
        if let Some(id) = self.cstrs.get(text) {
            return Ok(*id);
        }
        let value = Value::const_cstring(text);
        let mut global = ir::Global::new(format!("{}.cstr.{}", self.path, self.cstrs.len()), value.ty.clone());
        global.initializer = Some(value);
        global.linkage = Linkage::Private;
        global.constant = true;
        global.unnamed_addr = true;
        let id = self.module.add_global(global)?;
        self.cstrs.insert(text.to_string(), id);
        Ok(id)
    }

    pub fn to_ir_string(&self) -> String {
        self.module.to_string()
    }

    pub fn write_ir(&self, path: &Path) -> SsaResult<()> {
        std::fs::write(path, self.to_ir_string())
            .map_err(|source| SsaError::Io { path: path.to_path_buf(), source })
    }
}

impl fmt::Display for Package<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.module)
    }
}
