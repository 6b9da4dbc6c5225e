//! A small model of textual LLVM assembly.
//!
//! Only what the Tessera backend emits is modelled: scalar, pointer and
//! aggregate types, constants, calls, aggregate construction, loads and
//! stores. Modules print to text that `clang` accepts as a `.ll` input.

pub mod function;
pub mod module;
pub mod types;
pub mod value;

pub use function::{BasicBlock, BlockId, Function, Inst, InstRef, Linkage};
pub use module::{FuncId, Global, GlobalId, Module, SymbolError};
pub use types::{escape_bytes, FuncType, Ident, LlType, NamedStruct};
pub use value::{Repr, Typed, Value};
