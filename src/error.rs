//! Error types for the addon bridge.
//!
//! The host ABI signals failure through status codes; this module defines the
//! crate-side error type those codes are translated into, and the `Result`
//! alias used throughout.

use crate::sys::Status;

/// Main error type for bridge operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The host ABI rejected a call with a non-ok status.
    #[error("{message} ({status})")]
    Abi {
        /// Status code reported by the host.
        status: Status,
        /// Message from the host's extended error info, or the generic
        /// fallback when the host supplied none.
        message: String,
    },

    /// A native failure with a plain message, e.g. from the off-thread
    /// phase of a background work unit.
    #[error("{0}")]
    Message(String),
}

/// Fallback description used when the host reports a failure without one.
pub const GENERIC_ABI_MESSAGE: &str = "Error in native callback";

impl Error {
    /// Create an error from a plain message.
    pub fn from_reason(reason: impl Into<String>) -> Self {
        Error::Message(reason.into())
    }

    /// The status code behind this error, if it came from the ABI.
    pub fn status(&self) -> Option<Status> {
        match self {
            Error::Abi { status, .. } => Some(*status),
            Error::Message(_) => None,
        }
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        match self {
            Error::Abi { message, .. } => message,
            Error::Message(msg) => msg,
        }
    }

    /// Whether the host expected a differently typed value. These map to a
    /// type-error value when surfaced to script.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(
            self.status(),
            Some(
                Status::ObjectExpected
                    | Status::StringExpected
                    | Status::NameExpected
                    | Status::FunctionExpected
                    | Status::NumberExpected
                    | Status::BooleanExpected
                    | Status::ArrayExpected
            )
        )
    }
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;
