//! Target description and memory layout of lowered types.
//!
//! [`TargetData`] wraps the opaque target triple; [`LayoutComputer`] answers
//! size, alignment and field-offset questions for [`LlType`]s under the
//! target's C ABI rules, caching every answer.

mod target;

pub use target::TargetData;

use fxhash::{FxHashMap, FxHashSet};
use miette::Diagnostic;
use repc::layout::{Array, BuiltinType, Record, RecordField, RecordKind, Type, TypeVariant};
use tessera_ir::LlType;
use thiserror::Error;

/// Errors that can occur during layout computation.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("type `{0}` has no size")]
    #[diagnostic(code("LAYOUT-001"), help("only first-class value types can be laid out in memory"))]
    Unsized(String),

    #[error("identified struct `{0}` contains itself by value")]
    #[diagnostic(code("LAYOUT-002"))]
    TypeRecursion(String),

    #[error("unsupported target `{0}`")]
    #[diagnostic(code("LAYOUT-003"), help("the target triple must have a known pointer width and C ABI"))]
    UnsupportedTarget(String),

    #[error("integer type `i{0}` has no C equivalent")]
    #[diagnostic(code("LAYOUT-004"))]
    UnsupportedInt(u32),

    #[error("layout computation failed: {0}")]
    #[diagnostic(code("LAYOUT-005"))]
    Repc(String),
}

impl From<repc::Error> for LayoutError {
    fn from(err: repc::Error) -> Self {
        LayoutError::Repc(err.to_string())
    }
}

/// Size and required alignment of a type, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layout {
    pub size: u64,
    pub align: u64,
}

impl Layout {
    pub const fn new(size: u64, align: u64) -> Self {
        Layout { size, align }
    }
}

fn builtin(builtin: BuiltinType) -> Type<()> {
    Type { layout: (), annotations: vec![], variant: TypeVariant::Builtin(builtin) }
}

fn record(fields: Vec<Type<()>>) -> Type<()> {
    let fields = fields
        .into_iter()
        .map(|ty| RecordField { layout: None, annotations: vec![], named: true, bit_width: None, ty })
        .collect();
    Type { layout: (), annotations: vec![], variant: TypeVariant::Record(Record { kind: RecordKind::Struct, fields }) }
}

/// Looks up the C ABI description of a target by its triple.
fn repc_target(target: &TargetData) -> Option<repc::Target> {
    let name = target.triple().to_string();
    repc::TARGETS.iter().copied().find(|t| t.name() == name)
}

/// Computes and caches layouts for one target.
///
/// Sizes and alignments come from `repc`, so structs follow the target's C
/// ABI: `double` fields are 4-aligned on i686, `i64` is 8-aligned on armv7.
pub struct LayoutComputer {
    target: TargetData,
    repc_target: Option<repc::Target>,
    cache: FxHashMap<LlType, Layout>,
    /// Identified structs whose layout is being computed.
    processing_layout: FxHashSet<String>,
}

impl LayoutComputer {
    pub fn new(target: TargetData) -> Self {
        let repc_target = repc_target(&target);
        LayoutComputer { target, repc_target, cache: FxHashMap::default(), processing_layout: FxHashSet::default() }
    }

    pub fn target(&self) -> &TargetData {
        &self.target
    }

    /// Gets or computes the layout of `ty`.
    pub fn layout_of(&mut self, ty: &LlType) -> Result<Layout, LayoutError> {
        if let Some(layout) = self.cache.get(ty) {
            return Ok(*layout);
        }
        let repc_ty = self.to_repc_type(ty)?;
        let computed = repc::compute_layout(self.abi()?, &repc_ty)?;
        let layout = Layout::new(computed.layout.size_bits / 8, computed.layout.field_alignment_bits / 8);
        self.cache.insert(ty.clone(), layout);
        Ok(layout)
    }

    pub fn size_of(&mut self, ty: &LlType) -> Result<u64, LayoutError> {
        self.layout_of(ty).map(|l| l.size)
    }

    pub fn align_of(&mut self, ty: &LlType) -> Result<u64, LayoutError> {
        self.layout_of(ty).map(|l| l.align)
    }

    /// Byte offsets of the fields of a struct type, or `None` for non-structs.
    pub fn field_offsets(&mut self, ty: &LlType) -> Result<Option<Vec<u64>>, LayoutError> {
        if ty.struct_fields().is_none() {
            return Ok(None);
        }
        let repc_ty = self.to_repc_type(ty)?;
        let computed = repc::compute_layout(self.abi()?, &repc_ty)?;
        let TypeVariant::Record(record) = computed.variant else {
            return Ok(None);
        };
        let offsets = record.fields.iter().map(|f| f.layout.as_ref().map_or(0, |l| l.offset_bits / 8)).collect();
        Ok(Some(offsets))
    }

    fn abi(&self) -> Result<repc::Target, LayoutError> {
        self.repc_target.ok_or_else(|| LayoutError::UnsupportedTarget(self.target.to_string()))
    }

    fn to_repc_type(&mut self, ty: &LlType) -> Result<Type<()>, LayoutError> {
        Ok(match ty {
            LlType::Void | LlType::Func(_) => return Err(LayoutError::Unsized(ty.to_string())),
            LlType::Int(bits) => builtin(match bits {
                1..=8 => BuiltinType::UnsignedChar,
                16 => BuiltinType::UnsignedShort,
                32 => BuiltinType::UnsignedInt,
                64 => BuiltinType::UnsignedLongLong,
                _ => return Err(LayoutError::UnsupportedInt(*bits)),
            }),
            LlType::Float => builtin(BuiltinType::Float),
            LlType::Double => builtin(BuiltinType::Double),
            LlType::Ptr => builtin(BuiltinType::Pointer),
            LlType::Array(len, elem) => Type {
                layout: (),
                annotations: vec![],
                variant: TypeVariant::Array(Array {
                    element_type: Box::new(self.to_repc_type(elem)?),
                    num_elements: Some(*len),
                }),
            },
            LlType::Struct(fields) => self.to_repc_record(fields)?,
            LlType::Named(named) => {
                if !self.processing_layout.insert(named.name.clone()) {
                    return Err(LayoutError::TypeRecursion(named.name.clone()));
                }
                let result = self.to_repc_record(&named.body);
                self.processing_layout.remove(&named.name);
                result?
            }
        })
    }

    fn to_repc_record(&mut self, fields: &[LlType]) -> Result<Type<()>, LayoutError> {
        let fields = fields.iter().map(|field| self.to_repc_type(field)).collect::<Result<Vec<_>, _>>()?;
        Ok(record(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repc_target_lookup() {
        let linux = TargetData::parse("x86_64-unknown-linux-gnu").unwrap();
        assert_eq!(repc_target(&linux).map(|t| t.name()), Some("x86_64-unknown-linux-gnu"));
        let bare = TargetData::parse("x86_64-acme-linux-gnu").unwrap();
        let mut lc = LayoutComputer::new(bare);
        assert!(repc_target(lc.target()).is_none());
        assert!(matches!(lc.size_of(&LlType::Ptr), Err(LayoutError::UnsupportedTarget(_))));
    }
}
