use miette::Diagnostic;
use std::path::PathBuf;
use tessera_ir::SymbolError;
use tessera_layout::LayoutError;
use thiserror::Error;

/// Errors raised while lowering a package.
#[derive(Debug, Error, Diagnostic)]
pub enum SsaError {
    /// A construct the backend knows about but does not lower.
    #[error("unsupported feature: {feature}")]
    #[diagnostic(
        code("SSA-UNSUPPORTED-001"),
        help("this is a gap in the backend's coverage, not a problem in the program")
    )]
    UnsupportedFeature { feature: String },

    /// An internal inconsistency, usually a support package that does not
    /// match what the backend expects.
    #[error("invariant violation: {message}")]
    #[diagnostic(
        code("SSA-INVARIANT-001"),
        help("check that the runtime and foreign support packages match this compiler")
    )]
    InvariantViolation { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Layout(#[from] LayoutError),

    #[error("failed to write IR file {path}")]
    #[diagnostic(code("SSA-IO-001"))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SsaError {
    pub fn unsupported(feature: impl Into<String>) -> Self {
        SsaError::UnsupportedFeature { feature: feature.into() }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        SsaError::InvariantViolation { message: message.into() }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, SsaError::UnsupportedFeature { .. })
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, SsaError::InvariantViolation { .. })
    }
}

impl From<SymbolError> for SsaError {
    fn from(err: SymbolError) -> Self {
        SsaError::invariant(err.to_string())
    }
}

pub type SsaResult<T> = Result<T, SsaError>;
