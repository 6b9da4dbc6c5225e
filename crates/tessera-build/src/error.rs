use miette::Diagnostic;
use std::path::PathBuf;
use tessera_layout::LayoutError;
use tessera_ssa::SsaError;
use tessera_types::TypeParseError;
use thiserror::Error;

/// Errors that abort a build.
#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    #[error("failed to load packages: {message}")]
    #[diagnostic(code("BUILD-LOAD-001"))]
    LoadFailure { message: String },

    #[error("invalid package manifest {path}")]
    #[diagnostic(code("BUILD-LOAD-002"), help("see the manifest format in the tessera-build crate docs"))]
    Manifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid type in package {package}")]
    #[diagnostic(code("BUILD-LOAD-003"))]
    ManifestType {
        package: String,
        #[source]
        #[diagnostic_source]
        source: TypeParseError,
    },

    #[error("unknown flag: {flag}")]
    #[diagnostic(code("BUILD-FLAG-001"), help("supported flags: {supported}"))]
    UnknownFlag { flag: String, supported: String },

    #[error("invalid configuration {path}: {message}")]
    #[diagnostic(code("BUILD-CONFIG-001"))]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Target(#[from] LayoutError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ssa(#[from] SsaError),

    #[error("linking {app} failed: {message}")]
    #[diagnostic(code("BUILD-LINK-001"))]
    Link { app: PathBuf, message: String },

    #[error("failed to run {app}")]
    #[diagnostic(code("BUILD-EXEC-001"))]
    Exec {
        app: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {path}")]
    #[diagnostic(code("BUILD-IO-001"))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub fn load(message: impl Into<String>) -> Self {
        BuildError::LoadFailure { message: message.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io { path: path.into(), source }
    }
}

pub type BuildResult<T> = Result<T, BuildError>;
