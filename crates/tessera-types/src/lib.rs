//! Source-level model consumed by the Tessera backend: the interned type
//! universe, package scopes and SSA function bodies.

pub mod error;
pub mod package;
pub mod parse;
pub mod ssa;
pub mod ty;

pub use error::TypeParseError;
pub use package::{full_name, Member, PackageTypes, Scope, SourcePackage, MAIN_PACKAGE_NAME, UNSAFE_PACKAGE};
pub use parse::{error_type, parse_signature, parse_type};
pub use ssa::{Callee, Const, FuncRef, GlobalRef, Instr, Operand, SsaFunction, SsaGlobal, ValueId};
pub use ty::{BasicKind, ChanDir, Field, Method, NamedId, NamedType, Signature, TyId, TyKind, TypeDisplay, TypeTable};
