//! Error types for reading and writing pages.
//!
//! Only stream-level failures surface here. Semantic problems inside a page
//! (bad offsets, missing images, unknown component types) are logged and
//! degraded locally; encode-time problems become
//! [`EncodeIssue`](crate::encoder::EncodeIssue)s.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for codec operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CodecError {
    // =========================================================================
    // STREAM ERRORS
    // =========================================================================
    /// The markup is not well-formed.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Well-formed markup that cannot be a page.
    #[error("Malformed page at byte {position}: {message}")]
    Malformed {
        /// Byte offset in the input where the problem was noticed.
        position: u64,
        /// Description of the problem.
        message: String,
    },

    /// The page declares an unknown or non-ASCII-compatible character encoding.
    #[error("Unsupported character encoding '{name}'")]
    UnsupportedEncoding {
        /// Encoding name as declared.
        name: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // =========================================================================
    // RESOURCE ERRORS
    // =========================================================================
    /// A resource could not be fetched.
    #[error("Failed to fetch '{location}': {message}")]
    Fetch {
        /// Location that was requested.
        location: String,
        /// Detailed error message.
        message: String,
    },

    /// Remote locations are disabled by configuration.
    #[error("Remote location '{location}' is not allowed")]
    RemoteDisabled {
        /// Location that was requested.
        location: String,
    },

    // =========================================================================
    // PIPELINE ERRORS
    // =========================================================================
    /// The load was cancelled by its ticket.
    #[error("Operation cancelled")]
    Cancelled,

    /// A background worker has shut down.
    #[error("Worker '{worker}' is no longer running")]
    WorkerStopped {
        /// Thread name of the worker.
        worker: String,
    },

    /// Configuration file could not be read or parsed.
    #[error("Invalid configuration '{path}': {message}")]
    Config {
        /// Configuration file path.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

impl CodecError {
    /// Create a fetch error with location context.
    pub fn fetch(location: impl ToString, source: impl std::fmt::Display) -> Self {
        Self::Fetch {
            location: location.to_string(),
            message: source.to_string(),
        }
    }

    pub(crate) fn malformed(position: u64, message: impl Into<String>) -> Self {
        Self::Malformed {
            position,
            message: message.into(),
        }
    }

    /// Check if this error is recoverable (user can fix and retry).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. }
                | Self::RemoteDisabled { .. }
                | Self::Cancelled
                | Self::Config { .. }
                | Self::Io(_)
        )
    }

    /// Get a user-friendly suggestion for fixing this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Xml(_) | Self::Malformed { .. } => {
                Some("The page file is damaged; restore it from a backup or re-save it.")
            }
            Self::UnsupportedEncoding { .. } => Some("Re-save the page with UTF-8 encoding."),
            Self::Fetch { .. } => Some("Check that the file exists and the network is reachable."),
            Self::RemoteDisabled { .. } => {
                Some("Enable remote loading in the configuration or use a local copy.")
            }
            Self::Io(_) => Some("Check file permissions and available disk space."),
            Self::Config { .. } => Some("Fix the configuration file or remove it to use defaults."),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_errors_are_not_recoverable() {
        let error = CodecError::malformed(12, "content outside paragraph");
        assert!(!error.is_recoverable());
        assert!(error.suggestion().is_some());
        assert_eq!(
            error.to_string(),
            "Malformed page at byte 12: content outside paragraph"
        );
    }

    #[test]
    fn fetch_errors_carry_location() {
        let error = CodecError::fetch("pages/logo.png", "not found");
        assert!(error.is_recoverable());
        assert_eq!(error.to_string(), "Failed to fetch 'pages/logo.png': not found");
    }
}
