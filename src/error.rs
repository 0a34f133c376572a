//! Error types and Result aliases for gdbstream
//!
//! The parsing pipeline itself never returns errors (unrecognized output is an
//! event, not a failure). These types cover the surrounding operations:
//! configuration and pattern-file IO, positional pattern edits and the
//! session channels.

use std::fmt;
use std::path::PathBuf;

/// Result type alias for gdbstream operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gdbstream
#[derive(Debug)]
pub enum Error {
    // === Pattern store errors ===
    /// Positional edit outside the store
    PatternIndexOutOfRange {
        index: usize,
        len: usize,
    },

    /// Failed to load a pattern table file
    PatternFileLoadFailed {
        path: PathBuf,
        reason: String,
    },

    /// Failed to save a pattern table file
    PatternFileSaveFailed {
        path: PathBuf,
        reason: String,
    },

    /// Failed to set up the pattern file watcher
    PatternWatchFailed {
        reason: String,
    },

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    /// Failed to save configuration file
    ConfigSaveFailed {
        path: PathBuf,
        reason: String,
    },

    /// Configuration file not found
    ConfigNotFound,

    /// Configuration validation failed
    ConfigValidationFailed {
        field: String,
        reason: String,
    },

    /// Failed to serialize configuration
    ConfigSerializationFailed {
        format: String,
        reason: String,
    },

    /// Failed to parse configuration
    ConfigParseFailed {
        format: String,
        reason: String,
    },

    // === Session errors ===
    /// The session task has stopped and no longer accepts requests
    SessionClosed,

    /// The session task panicked or was aborted
    SessionTaskFailed {
        reason: String,
    },

    // === I/O and regex errors ===
    /// I/O errors
    Io(std::io::Error),

    /// Regex compilation errors
    Regex(regex::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Pattern store errors
            Error::PatternIndexOutOfRange { index, len } => {
                write!(
                    f,
                    "Pattern index {} out of range (store has {} entries)",
                    index, len
                )
            }
            Error::PatternFileLoadFailed { path, reason } => {
                write!(f, "Failed to load patterns from '{}': {}", path.display(), reason)
            }
            Error::PatternFileSaveFailed { path, reason } => {
                write!(f, "Failed to save patterns to '{}': {}", path.display(), reason)
            }
            Error::PatternWatchFailed { reason } => {
                write!(f, "Failed to watch pattern file: {}", reason)
            }

            // Configuration errors
            Error::ConfigLoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path.display(), reason)
            }
            Error::ConfigSaveFailed { path, reason } => {
                write!(f, "Failed to save config to '{}': {}", path.display(), reason)
            }
            Error::ConfigNotFound => {
                write!(f, "Configuration file not found")
            }
            Error::ConfigValidationFailed { field, reason } => {
                write!(f, "Configuration validation failed for '{}': {}", field, reason)
            }
            Error::ConfigSerializationFailed { format, reason } => {
                write!(f, "Failed to serialize config as {}: {}", format, reason)
            }
            Error::ConfigParseFailed { format, reason } => {
                write!(f, "Failed to parse {} config: {}", format, reason)
            }

            // Session errors
            Error::SessionClosed => {
                write!(f, "Debugger session is closed")
            }
            Error::SessionTaskFailed { reason } => {
                write!(f, "Debugger session task failed: {}", reason)
            }

            // I/O and regex errors
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Regex(err) => write!(f, "Regex compilation error: {}", err),

            // Generic fallback
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Regex(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Regex(err)
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Error::ConfigValidationFailed {
            field: err.field().to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
