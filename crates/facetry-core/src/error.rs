//! Error types for Facetry.

use std::path::{Path, PathBuf};

/// Errors that can occur while resolving schemas, building queries, or
/// executing a search round trip.
///
/// Configuration and type-mismatch errors indicate a programming error or a
/// tampered client state and are never worth retrying. Index errors belong to
/// the external collaborator and are passed through untouched.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid schema or search configuration (unknown field, capability
    /// mismatch, malformed facet spec, unusable filter).
    #[error("Configuration error: {message}")]
    Config {
        /// Field the problem was found on, when known
        field: Option<String>,
        /// What went wrong
        message: String,
    },

    /// Interval arithmetic or a range override applied to a value of the
    /// wrong kind.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Kind the operation required
        expected: String,
        /// Kind that was supplied
        found: String,
    },

    /// Failure reported by the search index. The wrapped error is surfaced
    /// exactly as the index reported it.
    #[error(transparent)]
    Index(Box<dyn std::error::Error + Send + Sync>),

    /// Settings could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O error while reading settings.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// File that was being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Convenience `Result` type alias for Facetry operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a configuration error not tied to a specific field.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            field: None,
            message: message.into(),
        }
    }

    /// Creates a configuration error naming the offending field.
    pub fn config_field<F, M>(field: F, message: M) -> Self
    where
        F: Into<String>,
        M: Into<String>,
    {
        let field = field.into();
        Error::Config {
            message: format!("field '{field}': {}", message.into()),
            field: Some(field),
        }
    }

    /// Creates a type-mismatch error.
    pub fn type_mismatch<E, F>(expected: E, found: F) -> Self
    where
        E: Into<String>,
        F: Into<String>,
    {
        Error::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Wraps a failure reported by the search index.
    pub fn index<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Index(Box::new(source))
    }

    /// Creates a parse error.
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Error::Parse(message.into())
    }

    /// Creates an I/O error annotated with the path being accessed.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns true for errors caused by schema or configuration problems.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Config { .. } | Error::TypeMismatch { .. })
    }
}
