use std::sync::Arc;

/// Represents a result type for operations in this crate.
///
/// The error variant is the crate-wide [`Error`] enum.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum representing possible errors.
///
/// Evaluation itself never fails for bad request data (missing ids, unknown time zones,
/// unsupported operators): those resolve to a disabled outcome with a reason instead. Errors are
/// reserved for invalid configuration at the mutation boundary and for snapshot loading.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A value failed validation at construction time. Invalid values are never clamped.
    #[error("invalid argument `{argument}`: {message}")]
    InvalidArgument {
        /// Name of the offending argument.
        argument: &'static str,
        /// Human-readable description of the problem.
        message: String,
    },

    /// The flag is marked permanent and cannot be deleted.
    #[error("flag `{0}` is permanent and cannot be deleted")]
    PermanentFlag(String),

    /// The flag is present in the snapshot but its definition failed to parse.
    #[error("error parsing flag configuration")]
    FlagParseError,

    /// Malformed snapshot JSON.
    #[error(transparent)]
    // serde_json::Error is not clonable, so we're wrapping it in an Arc.
    Json(Arc<serde_json::Error>),

    /// An I/O error.
    #[error(transparent)]
    Io(Arc<std::io::Error>),
}

impl Error {
    pub(crate) fn invalid_argument(argument: &'static str, message: impl Into<String>) -> Error {
        Error::InvalidArgument {
            argument,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(Arc::new(value))
    }
}
