//! Lowering of type-checked SSA to textual IR.
//!
//! A [`Program`] holds everything shared across packages: the source type
//! table, the memoized type bridge, the target layout and lazy handles to
//! the runtime and foreign support packages. Each source package is lowered
//! into a [`Package`], whose symbol tables make every declaration
//! idempotent, and whose bodies are filled in through a [`Builder`].

pub mod builder;
pub mod closure;
pub mod config;
pub mod error;
pub mod expr;
pub mod foreign;
pub mod lazy;
pub mod package;
pub mod program;
pub mod types;

pub use builder::Builder;
pub use closure::CLOSURE_STUB_PREFIX;
pub use config::DebugConfig;
pub use error::{SsaError, SsaResult};
pub use expr::Expr;
pub use foreign::{CALL_NO_ARGS, CALL_ONE_ARG, CALL_TWO_ARGS, FOREIGN_INIT, IMPORT_MODULE};
pub use lazy::{Lazy, Supplier};
pub use package::{Function, Global, Package, SymbolTable};
pub use program::{Program, FOREIGN_OBJECT};
pub use types::{Type, TypeData, ValueKind};
