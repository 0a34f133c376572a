//! Configuration management for gdbstream
//!
//! Settings for line reassembly, the pattern table location and the session
//! driver. Every field has a default, so a partial file (or none at all)
//! yields a usable configuration.

pub mod loader;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::parser::reassembler::{
    DEFAULT_CONTINUATION_PATTERN, DEFAULT_LINE_TERMINATOR, DEFAULT_MAX_BLOCK_LINES,
    DEFAULT_MAX_PENDING_BYTES,
};

/// Upper bound for `parser.max_pending_bytes`
const MAX_PENDING_BYTES_LIMIT: usize = 64 * 1024 * 1024;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Line reassembly settings
    pub parser: ParserConfig,

    /// Pattern table location
    pub patterns: PatternConfig,

    /// Session driver settings
    pub session: SessionConfig,
}

/// Line reassembly settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Physical line sentinel
    pub line_terminator: String,

    /// A physical line matching any of these is continued on the next line
    pub continuation_patterns: Vec<String>,

    /// Accept a prompt that has not been followed by a line terminator yet
    pub accept_unterminated_terminators: bool,

    /// Physical lines buffered before a block is flushed without terminator
    pub max_block_lines: usize,

    /// Bytes of an unfinished physical line kept before it is flushed
    pub max_pending_bytes: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            line_terminator: DEFAULT_LINE_TERMINATOR.to_string(),
            continuation_patterns: vec![DEFAULT_CONTINUATION_PATTERN.to_string()],
            accept_unterminated_terminators: true,
            max_block_lines: DEFAULT_MAX_BLOCK_LINES,
            max_pending_bytes: DEFAULT_MAX_PENDING_BYTES,
        }
    }
}

/// Pattern table location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Pattern table file; the built-in table is used when unset
    pub file: Option<PathBuf>,

    /// Reload the table when the file changes
    pub watch: bool,
}

/// Session driver settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Broadcast buffer size for parser events
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            event_capacity: 256,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Line terminator cannot be empty")]
    EmptyLineTerminator,

    #[error("Invalid continuation pattern '{pattern}': {reason}")]
    InvalidContinuationPattern { pattern: String, reason: String },

    #[error("Invalid block line limit: {0} (must be between 1 and 1000000)")]
    InvalidMaxBlockLines(usize),

    #[error("Invalid pending byte limit: {0} (must be between 1 and 67108864)")]
    InvalidMaxPendingBytes(usize),

    #[error("Invalid event capacity: {0} (must be between 1 and 65536)")]
    InvalidEventCapacity(usize),

    #[error("Pattern file watching requires a pattern file")]
    WatchWithoutFile,
}

impl ConfigError {
    /// Dotted path of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::EmptyLineTerminator => "parser.line_terminator",
            ConfigError::InvalidContinuationPattern { .. } => "parser.continuation_patterns",
            ConfigError::InvalidMaxBlockLines(_) => "parser.max_block_lines",
            ConfigError::InvalidMaxPendingBytes(_) => "parser.max_pending_bytes",
            ConfigError::InvalidEventCapacity(_) => "session.event_capacity",
            ConfigError::WatchWithoutFile => "patterns.watch",
        }
    }
}

impl Config {
    /// Check every field, returning the first problem found
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.parser.line_terminator.is_empty() {
            return Err(ConfigError::EmptyLineTerminator);
        }

        for pattern in &self.parser.continuation_patterns {
            if let Err(e) = regex::Regex::new(pattern) {
                return Err(ConfigError::InvalidContinuationPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                });
            }
        }

        if self.parser.max_block_lines == 0 || self.parser.max_block_lines > 1_000_000 {
            return Err(ConfigError::InvalidMaxBlockLines(self.parser.max_block_lines));
        }

        let pending = self.parser.max_pending_bytes;
        if pending == 0 || pending > MAX_PENDING_BYTES_LIMIT {
            return Err(ConfigError::InvalidMaxPendingBytes(pending));
        }

        if self.session.event_capacity == 0 || self.session.event_capacity > 65_536 {
            return Err(ConfigError::InvalidEventCapacity(self.session.event_capacity));
        }

        if self.patterns.watch && self.patterns.file.is_none() {
            return Err(ConfigError::WatchWithoutFile);
        }

        Ok(())
    }
}
