//! Build driver for the Tessera backend.
//!
//! A build run parses the build flags, loads the matched packages and their
//! imports through a [`PackageLoader`], lowers every package in dependency
//! order, and, outside plain build mode, writes each package's IR next to its
//! export file and links every `main` root into an executable. Run mode then
//! executes the linked program.
//!
//! Packages are described by `tessera.pkg.toml` manifests; see [`manifest`]
//! for the format.

pub mod args;
pub mod config;
pub mod driver;
pub mod error;
pub mod graph;
pub mod link;
pub mod loader;
pub mod lower;
pub mod manifest;
pub mod mode;

pub use args::{parse_args, skip_flag_args, ParsedArgs, BUILD_FLAGS};
pub use config::{BuildConfig, CONFIG_FILE};
pub use driver::{BuildReport, Driver};
pub use error::{BuildError, BuildResult};
pub use graph::PackageGraph;
pub use link::{link_args, Clang, Toolchain};
pub use loader::{ManifestLoader, PackageLoader, FOREIGN_PACKAGE, RUNTIME_PACKAGE};
pub use lower::{lower_package, ENTRY_POINT};
pub use manifest::{Manifest, MANIFEST_FILE};
pub use mode::Mode;
