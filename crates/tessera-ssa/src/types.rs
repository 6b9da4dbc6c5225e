//! The type bridge: memoized lowering of source types to IR types.
//!
//! Every lowering result is an `Rc<TypeData>` stored in the program-wide
//! cache under the source type's id, so asking twice for the same source type
//! hands back the same allocation. Downstream code may compare lowered types
//! with [`Rc::ptr_eq`].

use crate::error::{SsaError, SsaResult};
use crate::program::Program;
use fxhash::{FxHashMap, FxHashSet};
use std::fmt;
use std::rc::Rc;
use tessera_ir::{FuncType, LlType};
use tessera_types::{BasicKind, TyId, TyKind};

/// Classification of a lowered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// No value: the lowering of the invalid type, used for `void`.
    Invalid,
    Bool,
    Signed,
    Unsigned,
    Float,
    Pointer,
    String,
    Interface,
    Slice,
    Map,
    Array,
    Struct,
    Tuple,
    /// A function value: `{ fn, ctx }`.
    Closure,
    /// The address of a function symbol. The source type is its signature.
    Func,
}

/// One lowering result.
#[derive(Debug, PartialEq)]
pub struct TypeData {
    pub ll: LlType,
    /// The source type this was lowered from.
    pub raw: TyId,
    pub kind: ValueKind,
}

/// A shared lowering result. Identity-comparable.
pub type Type = Rc<TypeData>;

impl fmt::Display for TypeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.ll, self.kind)
    }
}

/// Cache state of the bridge, owned by the [`Program`].
#[derive(Debug, Default)]
pub(crate) struct TypeBridge {
    types: FxHashMap<TyId, Type>,
    /// Function symbol types, keyed by signature.
    funcs: FxHashMap<TyId, Type>,
    /// Source types whose lowering is in progress.
    lowering: FxHashSet<TyId>,
    /// Cached types whose lowering went through the runtime package.
    uses_runtime: FxHashSet<TyId>,
}

impl TypeBridge {
    pub(crate) fn len(&self) -> usize {
        self.types.len() + self.funcs.len()
    }
}

impl Program {
    /// Lowers `ty`, or returns its cached lowering. Either way, a type that
    /// is carried by the runtime package marks the current package as
    /// needing it.
    pub fn raw_type(&mut self, ty: TyId) -> SsaResult<Type> {
        if let Some(cached) = self.bridge.types.get(&ty) {
            let cached = cached.clone();
            if self.bridge.uses_runtime.contains(&ty) {
                self.needs_runtime = true;
            }
            return Ok(cached);
        }
        if !self.bridge.lowering.insert(ty) {
            return Err(SsaError::invariant(format!(
                "type `{}` contains itself by value",
                self.types.display(ty)
            )));
        }
        let outer = std::mem::replace(&mut self.needs_runtime, false);
        let lowered = self.lower(ty);
        let used_runtime = self.needs_runtime;
        self.needs_runtime |= outer;
        self.bridge.lowering.remove(&ty);
        let (ll, kind) = lowered?;
        let lowered = Rc::new(TypeData { ll, raw: ty, kind });
        self.bridge.types.insert(ty, lowered.clone());
        if used_runtime {
            self.bridge.uses_runtime.insert(ty);
        }
        Ok(lowered)
    }

    /// The type of a function symbol with signature `sig`: a pointer, tagged
    /// [`ValueKind::Func`] so that calls through it are direct.
    pub fn func_ptr_type(&mut self, sig: TyId) -> SsaResult<Type> {
        if let Some(cached) = self.bridge.funcs.get(&sig) {
            return Ok(cached.clone());
        }
        if self.types.as_signature(sig).is_none() {
            return Err(SsaError::invariant(format!("`{}` is not a signature", self.types.display(sig))));
        }
        let lowered = Rc::new(TypeData { ll: LlType::Ptr, raw: sig, kind: ValueKind::Func });
        self.bridge.funcs.insert(sig, lowered.clone());
        Ok(lowered)
    }

    /// The IR function type of a source signature: lowered parameters, and
    /// `void`, the single result, or a literal struct of the results.
    pub fn func_type(&mut self, sig: TyId) -> SsaResult<Rc<FuncType>> {
        let signature = self
            .types
            .as_signature(sig)
            .cloned()
            .ok_or_else(|| SsaError::invariant(format!("`{}` is not a signature", self.types.display(sig))))?;
        let params = signature
            .params
            .iter()
            .map(|p| self.raw_type(*p).map(|t| t.ll.clone()))
            .collect::<SsaResult<Vec<_>>>()?;
        let ret = match signature.results.as_slice() {
            [] => LlType::Void,
            [single] => self.raw_type(*single)?.ll.clone(),
            results => {
                let tuple = self.types.tuple(results.to_vec());
                self.raw_type(tuple)?.ll.clone()
            }
        };
        Ok(Rc::new(FuncType { ret, params, variadic: false }))
    }

    /// Number of cached lowerings.
    pub fn cached_type_count(&self) -> usize {
        self.bridge.len()
    }

    fn lower(&mut self, ty: TyId) -> SsaResult<(LlType, ValueKind)> {
        let kind = self.types.kind(ty).clone();
        let lowered = match kind {
            TyKind::Basic(basic) => self.lower_basic(basic)?,
            TyKind::Pointer(_) => (LlType::Ptr, ValueKind::Pointer),
            TyKind::Slice(_) => (self.rt_slice()?, ValueKind::Slice),
            TyKind::Map { .. } => (self.rt_map()?, ValueKind::Map),
            TyKind::Interface(_) => (self.rt_iface()?, ValueKind::Interface),
            TyKind::Array { elem, len } => {
                let elem = self.raw_type(elem)?;
                (LlType::Array(len, Box::new(elem.ll.clone())), ValueKind::Array)
            }
            TyKind::Struct(fields) => {
                let fields = fields.iter().map(|f| f.ty).collect::<Vec<_>>();
                (LlType::Struct(self.lower_all(&fields)?), ValueKind::Struct)
            }
            TyKind::Tuple(elems) => (LlType::Struct(self.lower_all(&elems)?), ValueKind::Tuple),
            TyKind::Signature(_) => (LlType::Struct(vec![LlType::Ptr, LlType::Ptr]), ValueKind::Closure),
            TyKind::Chan { .. } => return Err(SsaError::unsupported("channel types")),
            TyKind::Named(id) => {
                let underlying = self.types.underlying(ty);
                if underlying == ty {
                    let name = self.types.named_type(id).qualified_name();
                    return Err(SsaError::invariant(format!("named type `{}` has no underlying type", name)));
                }
                match self.types.kind(underlying).clone() {
                    TyKind::Struct(fields) => {
                        let name = self.types.named_type(id).qualified_name();
                        let fields = fields.iter().map(|f| f.ty).collect::<Vec<_>>();
                        (LlType::named(name, self.lower_all(&fields)?), ValueKind::Struct)
                    }
                    _ => {
                        let lowered = self.raw_type(underlying)?;
                        (lowered.ll.clone(), lowered.kind)
                    }
                }
            }
        };
        Ok(lowered)
    }

    fn lower_basic(&mut self, basic: BasicKind) -> SsaResult<(LlType, ValueKind)> {
        let pointer_bits = self.layout.target().pointer_bits();
        let lowered = match basic {
            BasicKind::Invalid => (LlType::Void, ValueKind::Invalid),
            BasicKind::Bool => (LlType::i1(), ValueKind::Bool),
            BasicKind::Int => (LlType::Int(pointer_bits), ValueKind::Signed),
            BasicKind::Uint | BasicKind::Uintptr => (LlType::Int(pointer_bits), ValueKind::Unsigned),
            BasicKind::Int8 => (LlType::Int(8), ValueKind::Signed),
            BasicKind::Int16 => (LlType::Int(16), ValueKind::Signed),
            BasicKind::Int32 => (LlType::Int(32), ValueKind::Signed),
            BasicKind::Int64 => (LlType::Int(64), ValueKind::Signed),
            BasicKind::Uint8 => (LlType::Int(8), ValueKind::Unsigned),
            BasicKind::Uint16 => (LlType::Int(16), ValueKind::Unsigned),
            BasicKind::Uint32 => (LlType::Int(32), ValueKind::Unsigned),
            BasicKind::Uint64 => (LlType::Int(64), ValueKind::Unsigned),
            BasicKind::Float32 => (LlType::Float, ValueKind::Float),
            BasicKind::Float64 => (LlType::Double, ValueKind::Float),
            BasicKind::String => (self.rt_string()?, ValueKind::String),
            BasicKind::UnsafePointer => (LlType::Ptr, ValueKind::Pointer),
            BasicKind::Complex64 | BasicKind::Complex128 => {
                return Err(SsaError::unsupported(format!("{} values", basic.name())))
            }
        };
        Ok(lowered)
    }

    fn lower_all(&mut self, tys: &[TyId]) -> SsaResult<Vec<LlType>> {
        tys.iter().map(|ty| self.raw_type(*ty).map(|t| t.ll.clone())).collect()
    }
}
