use thiserror::Error;

use crate::key::Key;

/// Canonical result for the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error raised by caller-supplied callables.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    /// The source cannot be turned into a sequence.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unsupported comparator, join type, or combinator configuration.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("key '{0}' not found")]
    KeyNotFound(Key),

    #[error("property '{path}' not found: {reason}")]
    PropertyNotFound { path: String, reason: String },

    /// Failure raised inside a transform, predicate or effect.
    #[error("upstream failure: {0}")]
    Upstream(#[source] BoxError),

    #[error("buffer limit of {limit} entries exceeded in {operator}")]
    BufferExceeded { operator: &'static str, limit: usize },

    // Adapters map their decode/read failures into this variant when the
    // failure happens during a pull.
    #[error("source error: {0}")]
    Source(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Wrap any error raised by caller code.
    pub fn upstream(err: impl Into<BoxError>) -> Self {
        Error::Upstream(err.into())
    }

    pub fn property_not_found(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::PropertyNotFound {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Upstream(Box::new(e))
    }
}
