/// Error types for literal-bind
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A bound value has no literal form on the backend
    #[error("Unsupported value: {0}")]
    UnsupportedValue(String),

    /// A row cannot be shaped into the requested fetch mode
    #[error("Cannot project row: {0}")]
    Projection(String),

    /// Entry point the backend gives no support for
    #[error("{0} is not implemented by this driver")]
    Unimplemented(&'static str),

    /// Failure reported by the backend, passed through unchanged
    #[error("Execution failed: {0}")]
    Execution(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Positional and named keys were bound on the same statement
    #[error("Cannot bind {got} key '{key}' on a statement using {expected} placeholders")]
    MixedPlaceholderStyle {
        key: String,
        expected: &'static str,
        got: &'static str,
    },

    /// Error during SQL template parsing
    #[error("Failed to parse SQL template: {0}")]
    Parse(#[from] regex::Error),
}

impl Error {
    /// Wraps any backend error as [`Error::Execution`].
    pub fn execution<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Execution(error.into())
    }
}

#[cfg(feature = "mysql")]
impl From<sqlx::Error> for Error {
    fn from(error: sqlx::Error) -> Self {
        Error::Execution(Box::new(error))
    }
}

/// Result type alias for literal-bind operations
pub type Result<T> = std::result::Result<T, Error>;
