use crate::error::{SsaError, SsaResult};
use std::fmt;
use tessera_types::TypeTable;

/// Produces a support package on first use. It may intern new types.
pub type Supplier<T> = Box<dyn FnOnce(&mut TypeTable) -> SsaResult<T>>;

/// A value that is either known up front or produced on demand.
pub enum Lazy<T> {
    /// Nothing was configured.
    Empty,
    Resolved(T),
    /// Invoked at most once; replaced by `Resolved` on success.
    Pending(Supplier<T>),
}

impl<T> Default for Lazy<T> {
    fn default() -> Self {
        Lazy::Empty
    }
}

impl<T> Lazy<T> {
    pub fn pending(supplier: impl FnOnce(&mut TypeTable) -> SsaResult<T> + 'static) -> Self {
        Lazy::Pending(Box::new(supplier))
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Lazy::Resolved(_))
    }

    /// Returns the value, running the supplier if this is the first request.
    ///
    /// A supplier that fails is not retried: later calls report the slot as
    /// unavailable.
    pub fn resolve(&mut self, table: &mut TypeTable, what: &str) -> SsaResult<&T> {
        if let Lazy::Pending(_) = self {
            if let Lazy::Pending(supplier) = std::mem::take(self) {
                *self = Lazy::Resolved(supplier(table)?);
            }
        }
        match self {
            Lazy::Resolved(value) => Ok(value),
            _ => Err(SsaError::invariant(format!("{} support package is not available", what))),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lazy::Empty => f.write_str("Empty"),
            Lazy::Resolved(value) => f.debug_tuple("Resolved").field(value).finish(),
            Lazy::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}
