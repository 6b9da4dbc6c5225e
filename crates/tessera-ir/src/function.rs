use crate::types::{FuncType, Ident, LlType};
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

/// Symbol linkage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Linkage {
    #[default]
    External,
    Internal,
    Private,
    /// Several identical definitions may exist across modules; the linker keeps one.
    LinkOnceAny,
}

impl Linkage {
    /// Keyword as written before a definition; external linkage is implicit.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Linkage::External => None,
            Linkage::Internal => Some("internal"),
            Linkage::Private => Some("private"),
            Linkage::LinkOnceAny => Some("linkonce"),
        }
    }
}

/// An instruction. Results are named by the owning function when appended.
#[derive(Debug, Clone, PartialEq)]
pub enum Inst {
    Call {
        callee: Value,
        /// Signature of the callee.
        ty: Rc<FuncType>,
        args: Vec<Value>,
        /// Marks the call as eligible for frame elision.
        tail: bool,
    },
    InsertValue {
        agg: Value,
        elem: Value,
        index: u32,
    },
    ExtractValue {
        agg: Value,
        index: u32,
        ty: LlType,
    },
    Load {
        ty: LlType,
        ptr: Value,
    },
    Store {
        value: Value,
        ptr: Value,
    },
    Ret(Option<Value>),
    Unreachable,
}

impl Inst {
    /// Type of the value the instruction produces, if any.
    pub fn result_type(&self) -> Option<LlType> {
        match self {
            Inst::Call { ty, .. } if !ty.ret.is_void() => Some(ty.ret.clone()),
            Inst::InsertValue { agg, .. } => Some(agg.ty.clone()),
            Inst::ExtractValue { ty, .. } | Inst::Load { ty, .. } => Some(ty.clone()),
            _ => None,
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(self, Inst::Ret(_) | Inst::Unreachable)
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inst::Call { callee, ty, args, tail } => {
                if *tail {
                    f.write_str("tail ")?;
                }
                if ty.variadic {
                    write!(f, "call {} {}(", ty, callee)?;
                } else {
                    write!(f, "call {} {}(", ty.ret, callee)?;
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg.typed())?;
                }
                f.write_str(")")
            }
            Inst::InsertValue { agg, elem, index } => {
                write!(f, "insertvalue {}, {}, {}", agg.typed(), elem.typed(), index)
            }
            Inst::ExtractValue { agg, index, .. } => write!(f, "extractvalue {}, {}", agg.typed(), index),
            Inst::Load { ty, ptr } => write!(f, "load {}, {}", ty, ptr.typed()),
            Inst::Store { value, ptr } => write!(f, "store {}, {}", value.typed(), ptr.typed()),
            Inst::Ret(Some(value)) => write!(f, "ret {}", value.typed()),
            Inst::Ret(None) => f.write_str("ret void"),
            Inst::Unreachable => f.write_str("unreachable"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub usize);

/// Position of an instruction inside a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstRef {
    pub block: BlockId,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub label: String,
    pub insts: Vec<(Option<String>, Inst)>,
}

impl BasicBlock {
    pub fn is_terminated(&self) -> bool {
        self.insts.last().map_or(false, |(_, inst)| inst.is_terminator())
    }
}

/// A function declaration or definition. A function without blocks is a declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub ty: Rc<FuncType>,
    pub linkage: Linkage,
    pub param_names: Vec<String>,
    pub blocks: Vec<BasicBlock>,
    next_value: usize,
}

impl Function {
    pub fn new(name: impl Into<String>, ty: Rc<FuncType>) -> Self {
        let param_names = (0..ty.params.len()).map(|i| format!("p{}", i)).collect();
        Function {
            name: name.into(),
            ty,
            linkage: Linkage::External,
            param_names,
            blocks: Vec::new(),
            next_value: 0,
        }
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn set_linkage(&mut self, linkage: Linkage) {
        self.linkage = linkage;
    }

    /// Address of the function.
    pub fn as_value(&self) -> Value {
        Value::global(self.name.clone())
    }

    /// The `i`-th parameter, or `None` when out of range.
    pub fn param(&self, i: usize) -> Option<Value> {
        let ty = self.ty.params.get(i)?.clone();
        Some(Value::local(ty, self.param_names[i].clone()))
    }

    pub fn append_block(&mut self, label: impl Into<String>) -> BlockId {
        self.blocks.push(BasicBlock { label: label.into(), insts: Vec::new() });
        BlockId(self.blocks.len() - 1)
    }

    /// Appends `inst` to `block`, naming its result. Returns the result value,
    /// if the instruction produces one, and the instruction's position.
    pub fn push(&mut self, block: BlockId, inst: Inst) -> (InstRef, Option<Value>) {
        let mut name = None;
        let result = inst.result_type().map(|ty| {
            let local = format!("v{}", self.next_value);
            self.next_value += 1;
            name = Some(local.clone());
            Value::local(ty, local)
        });
        let insts = &mut self.blocks[block.0].insts;
        insts.push((name, inst));
        (InstRef { block, index: insts.len() - 1 }, result)
    }

    pub fn inst(&self, at: InstRef) -> Option<&Inst> {
        self.blocks.get(at.block.0)?.insts.get(at.index).map(|(_, inst)| inst)
    }

    /// Iterates over all instructions in block order.
    pub fn insts(&self) -> impl Iterator<Item = &Inst> {
        self.blocks.iter().flat_map(|b| b.insts.iter().map(|(_, inst)| inst))
    }

    fn write_header(&self, f: &mut fmt::Formatter<'_>, define: bool) -> fmt::Result {
        f.write_str(if define { "define " } else { "declare " })?;
        if let Some(keyword) = self.linkage.keyword() {
            write!(f, "{} ", keyword)?;
        }
        write!(f, "{} {}(", self.ty.ret, Ident::global(&self.name))?;
        for (i, param) in self.ty.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if define {
                write!(f, "{} {}", param, Ident::local(&self.param_names[i]))?;
            } else {
                write!(f, "{}", param)?;
            }
        }
        if self.ty.variadic {
            f.write_str(if self.ty.params.is_empty() { "..." } else { ", ..." })?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_declaration() {
            self.write_header(f, false)?;
            return writeln!(f);
        }
        self.write_header(f, true)?;
        writeln!(f, " {{")?;
        for block in &self.blocks {
            writeln!(f, "{}:", block.label)?;
            for (name, inst) in &block.insts {
                match name {
                    Some(name) => writeln!(f, "  {} = {}", Ident::local(name), inst)?,
                    None => writeln!(f, "  {}", inst)?,
                }
            }
        }
        writeln!(f, "}}")
    }
}
