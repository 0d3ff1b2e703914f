//! Error formatting utilities
//!
//! Renders client errors for terminal output, including nested causes.

use crate::Error;
use std::error::Error as StdError;

/// Format error for display, appending any nested causes
pub fn format_error(error: &Error) -> String {
    let formatted = match error {
        Error::Transport {
            message,
            status: Some(status),
        } if !message.contains(&status.to_string()) => {
            format!("{} (HTTP {})", message, status)
        }

        Error::Validation { field, message } => {
            format!("Invalid {}: {}", field, message)
        }

        _ => error.to_string(),
    };

    let mut result = formatted;
    let mut source = error.source();

    while let Some(cause) = source {
        if !result.contains(&cause.to_string()) {
            result = format!("{} (caused by {})", result, cause);
        }
        source = cause.source();
    }

    result
}

/// Format error for structured logging
pub fn format_error_for_logging(error: &Error) -> String {
    format!("[{}] {}", error.category(), format_error(error))
}
