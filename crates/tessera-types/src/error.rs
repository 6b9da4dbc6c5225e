use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// A malformed type expression in a package manifest.
#[derive(Debug, Error, Diagnostic, Clone)]
#[error("invalid type syntax: {message}")]
#[diagnostic(
    code("TYPES-PARSE-001"),
    help("Types are written in source syntax, e.g. `func(int, []string) (bool, error)` or `pkg/path.Name`")
)]
pub struct TypeParseError {
    #[source_code]
    pub src: String,
    #[label("{message}")]
    pub span: SourceSpan,
    pub message: String,
}
