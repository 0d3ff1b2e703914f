//! Error taxonomy for the bypass client
//!
//! Every public operation either resolves with a fully populated value or
//! fails with exactly one of these variants.

use thiserror::Error;

/// Main error type for the client
#[derive(Debug, Error)]
pub enum Error {
    /// A required input was empty; raised before any network activity
    #[error("Validation failed for {field}: {message}")]
    Validation {
        /// The input that failed validation
        field: String,
        /// Error message describing the validation failure
        message: String,
    },

    /// Network failure or non-2xx HTTP status
    #[error("{message}")]
    Transport {
        /// Best available message (remote `message` field or a synthesized one)
        message: String,
        /// HTTP status, absent for connection-level failures
        status: Option<u16>,
    },

    /// A success response whose body could not be decoded into the expected shape
    #[error("{message}")]
    Normalization {
        /// What was wrong with the body
        message: String,
    },

    /// The remote refused to create a task or omitted its id
    #[error("Failed to create task: {message}")]
    TaskCreation {
        /// Message reported by the remote
        message: String,
    },

    /// Polling exceeded the caller's time budget
    #[error("Task timed out after {timeout_ms}ms")]
    TaskTimeout {
        /// The configured timeout in milliseconds
        timeout_ms: u64,
    },

    /// The caller's cancellation token fired
    #[error("Operation cancelled: {operation}")]
    Cancelled {
        /// The step that was interrupted
        operation: String,
    },

    /// Configuration errors
    #[error("Configuration error in {field}: {message}")]
    Config {
        /// The configuration field that has an error
        field: String,
        /// Error message describing the issue
        message: String,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a validation error
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a transport error for a connection-level failure
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
        }
    }

    /// Create a transport error for a non-success HTTP status
    pub fn http_status<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Transport {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Create a normalization error
    pub fn normalization<S: Into<String>>(message: S) -> Self {
        Self::Normalization {
            message: message.into(),
        }
    }

    /// Create a task creation error
    pub fn task_creation<S: Into<String>>(message: S) -> Self {
        Self::TaskCreation {
            message: message.into(),
        }
    }

    /// Create a task timeout error
    pub fn task_timeout(timeout_ms: u64) -> Self {
        Self::TaskTimeout { timeout_ms }
    }

    /// Create a cancellation error
    pub fn cancelled<S: Into<String>>(operation: S) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Create a configuration error
    pub fn config<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Prepend an operation prefix to transport and normalization messages.
    ///
    /// The variant is preserved; other kinds pass through untouched.
    pub fn with_context(self, prefix: &str) -> Self {
        match self {
            Error::Transport { message, status } => Error::Transport {
                message: format!("{}: {}", prefix, message),
                status,
            },
            Error::Normalization { message } => Error::Normalization {
                message: format!("{}: {}", prefix, message),
            },
            other => other,
        }
    }

    /// HTTP status attached to a transport error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Check if this error happened before touching the network
    pub fn is_local(&self) -> bool {
        matches!(self, Error::Validation { .. } | Error::Config { .. })
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "validation",
            Error::Transport { .. } => "transport",
            Error::Normalization { .. } => "normalization",
            Error::TaskCreation { .. } => "task_creation",
            Error::TaskTimeout { .. } => "task_timeout",
            Error::Cancelled { .. } => "cancelled",
            Error::Config { .. } => "config",
            Error::Io(..) => "io",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::normalization(format!("Invalid response body: {}", err))
    }
}
