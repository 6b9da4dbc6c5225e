use crate::function::{Function, Linkage};
use crate::types::{Ident, LlType, NamedStruct};
use crate::value::Value;
use fxhash::{FxHashMap, FxHashSet};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalId(pub usize);

/// A symbol declared twice in one module in ways that cannot both hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("`{0}` is declared as both a function and a global")]
    KindClash(String),
    #[error("`{0}` is redeclared with a different type")]
    TypeClash(String),
}

/// A global variable or constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub name: String,
    /// Type of the stored value.
    pub ty: LlType,
    pub linkage: Linkage,
    /// `None` declares an external global.
    pub initializer: Option<Value>,
    pub constant: bool,
    pub unnamed_addr: bool,
}

impl Global {
    pub fn new(name: impl Into<String>, ty: LlType) -> Self {
        Global {
            name: name.into(),
            ty,
            linkage: Linkage::External,
            initializer: None,
            constant: false,
            unnamed_addr: false,
        }
    }

    pub fn as_value(&self) -> Value {
        Value::global(self.name.clone())
    }
}

impl fmt::Display for Global {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = ", Ident::global(&self.name))?;
        match &self.initializer {
            None => f.write_str("external ")?,
            Some(_) => {
                if let Some(keyword) = self.linkage.keyword() {
                    write!(f, "{} ", keyword)?;
                }
            }
        }
        if self.unnamed_addr {
            f.write_str("unnamed_addr ")?;
        }
        f.write_str(if self.constant { "constant " } else { "global " })?;
        match &self.initializer {
            Some(init) => writeln!(f, "{}", init.typed()),
            None => writeln!(f, "{}", self.ty),
        }
    }
}

/// One translation unit of textual IR.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub name: String,
    pub source_filename: Option<String>,
    pub datalayout: Option<String>,
    pub triple: Option<String>,
    globals: Vec<Global>,
    functions: Vec<Function>,
    global_index: FxHashMap<String, GlobalId>,
    function_index: FxHashMap<String, FuncId>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Module { source_filename: Some(name.clone()), name, ..Default::default() }
    }

    /// Adds a function. Redeclaring a function with the same type returns
    /// the existing id and leaves the first declaration (and any body) alone.
    pub fn add_function(&mut self, function: Function) -> Result<FuncId, SymbolError> {
        if self.global_index.contains_key(&function.name) {
            return Err(SymbolError::KindClash(function.name));
        }
        if let Some(&id) = self.function_index.get(&function.name) {
            if self.functions[id.0].ty != function.ty {
                return Err(SymbolError::TypeClash(function.name));
            }
            return Ok(id);
        }
        let id = FuncId(self.functions.len());
        self.function_index.insert(function.name.clone(), id);
        self.functions.push(function);
        Ok(id)
    }

    /// Adds a global, with the same redeclaration rules as functions.
    pub fn add_global(&mut self, global: Global) -> Result<GlobalId, SymbolError> {
        if self.function_index.contains_key(&global.name) {
            return Err(SymbolError::KindClash(global.name));
        }
        if let Some(&id) = self.global_index.get(&global.name) {
            if self.globals[id.0].ty != global.ty {
                return Err(SymbolError::TypeClash(global.name));
            }
            return Ok(id);
        }
        let id = GlobalId(self.globals.len());
        self.global_index.insert(global.name.clone(), id);
        self.globals.push(global);
        Ok(id)
    }

    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.0]
    }

    pub fn function_mut(&mut self, id: FuncId) -> &mut Function {
        &mut self.functions[id.0]
    }

    pub fn global(&self, id: GlobalId) -> &Global {
        &self.globals[id.0]
    }

    pub fn global_mut(&mut self, id: GlobalId) -> &mut Global {
        &mut self.globals[id.0]
    }

    pub fn get_function(&self, name: &str) -> Option<FuncId> {
        self.function_index.get(name).copied()
    }

    pub fn get_global(&self, name: &str) -> Option<GlobalId> {
        self.global_index.get(name).copied()
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn globals(&self) -> &[Global] {
        &self.globals
    }

    /// Identified structs referenced anywhere in the module, in first-use order.
    pub fn named_structs(&self) -> Vec<Rc<NamedStruct>> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        let mut visit = |named: &Rc<NamedStruct>| {
            if seen.insert(named.name.clone()) {
                out.push(named.clone());
            }
        };
        for global in &self.globals {
            global.ty.walk_named(&mut visit);
            if let Some(init) = &global.initializer {
                init.ty.walk_named(&mut visit);
            }
        }
        for function in &self.functions {
            LlType::Func(function.ty.clone()).walk_named(&mut visit);
            for inst in function.insts() {
                if let Some(ty) = inst.result_type() {
                    ty.walk_named(&mut visit);
                }
                if let crate::function::Inst::Call { ty, .. } = inst {
                    LlType::Func(ty.clone()).walk_named(&mut visit);
                }
            }
        }
        out
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;
        if let Some(source) = &self.source_filename {
            writeln!(f, "source_filename = \"{}\"", crate::types::escape_bytes(source.as_bytes()))?;
        }
        if let Some(layout) = &self.datalayout {
            writeln!(f, "target datalayout = \"{}\"", layout)?;
        }
        if let Some(triple) = &self.triple {
            writeln!(f, "target triple = \"{}\"", triple)?;
        }

        let named = self.named_structs();
        if !named.is_empty() {
            writeln!(f)?;
            for ty in &named {
                writeln!(f, "{}", ty.definition())?;
            }
        }

        if !self.globals.is_empty() {
            writeln!(f)?;
            for global in &self.globals {
                write!(f, "{}", global)?;
            }
        }

        for function in &self.functions {
            writeln!(f)?;
            write!(f, "{}", function)?;
        }
        Ok(())
    }
}
