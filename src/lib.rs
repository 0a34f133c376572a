//! gdbstream - event parsing for debugger console output
//!
//! This library turns the raw, arbitrarily fragmented text a debugger (GDB)
//! writes to its console into an ordered stream of typed events, and keeps
//! track of which caller each reply belongs to when several callers share
//! one command channel.
//!
//! ## Features
//!
//! - **Line Reassembly:** Fragments split anywhere are rebuilt into logical
//!   lines, including messages the debugger wrapped over several lines
//! - **Pattern Classification:** An ordered, editable rule table maps lines
//!   to target-state changes, replies and prompts
//! - **Interpreters:** Pluggable handlers claim replies to specific commands
//! - **Command Tracking:** FIFO command queue with a readiness gate and
//!   per-caller reply attribution
//! - **Hot Reload:** Pattern tables persisted as TOML or JSON, reapplied when
//!   the file changes
//!
//! ## Module Organization
//!
//! - [`parser`] - Reassembly, classification, command tracking and the [`Parser`]
//! - [`patterns`] - Pattern store, built-in GDB rules, persistence and file watching
//! - [`session`] - Tokio task driving a parser, with an event broadcast bus
//! - [`config`] - Configuration loading and validation
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```
//! use gdbstream::{EventKind, Parser, SharedPatternStore};
//!
//! let mut parser = Parser::new(SharedPatternStore::with_builtin());
//! parser.set_next_command("Backtrace", "bt");
//!
//! let events = parser.process_fragment("#0  main () at main.c:5\n(gdb) ");
//! assert_eq!(events.last().map(|e| e.kind), Some(EventKind::Prompt));
//! assert_eq!(events.last().and_then(|e| e.caller_id.as_deref()), Some("Backtrace"));
//! assert!(parser.is_ready());
//! ```

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod parser;
pub mod patterns;
pub mod session;

// Re-exports for core functionality
pub use config::loader::ConfigLoader;
pub use config::Config;
pub use error::{Error, Result};
pub use parser::{
    Command, CommandInterpreter, EventKind, EventListener, Interpreter, Parser, ParserEvent,
    ParserState, PredicateInterpreter,
};
pub use patterns::{PatternEntry, PatternRecord, PatternStore, SharedPatternStore};
pub use session::{DebuggerSession, ParserEventBus, SessionHandle};

/// The current version of gdbstream from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The crate name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// The crate description from Cargo.toml
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build a parser from the configuration found in the default locations
///
/// A configuration that fails to load is reported and replaced by defaults.
/// The pattern table named by the configuration must load if it exists.
pub fn init() -> Result<Parser> {
    info!("Initializing {} v{}", NAME, VERSION);

    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load configuration: {}. Using defaults", e);
            Config::default()
        }
    };

    Parser::from_config(&config)
}

/// Build a parser from a specific configuration file
pub fn init_with_config(config_path: &std::path::Path) -> Result<Parser> {
    info!(
        "Initializing {} v{} with config: {}",
        NAME,
        VERSION,
        config_path.display()
    );

    if !config_path.exists() {
        return Err(Error::ConfigLoadFailed {
            path: config_path.to_path_buf(),
            reason: "Configuration file does not exist".to_string(),
        });
    }

    let config = ConfigLoader::load_from_path(config_path)?;
    Parser::from_config(&config)
}

/// Describe a startup error with hints for the user
pub fn handle_startup_error(error: &Error) -> String {
    match error {
        Error::ConfigLoadFailed { path, reason } => {
            format!(
                "Configuration Error: Failed to load config from '{}': {}\n\nTry:\n• Check the file path and permissions\n• Run without --config to use defaults",
                path.display(),
                reason
            )
        }
        Error::ConfigParseFailed { format, reason } => {
            format!(
                "Configuration Error: Failed to parse {} config: {}\n\nTry:\n• Check configuration file syntax",
                format, reason
            )
        }
        Error::ConfigValidationFailed { field, reason } => {
            format!(
                "Configuration Error: Validation failed for '{}': {}\n\nTry:\n• Check configuration value\n• Remove the field to use its default",
                field, reason
            )
        }
        Error::PatternFileLoadFailed { path, reason } => {
            format!(
                "Pattern Error: Failed to load patterns from '{}': {}\n\nTry:\n• Check the table syntax ([[pattern]] entries with id and pattern)\n• Dump the built-in table with --dump-patterns",
                path.display(),
                reason
            )
        }
        _ => {
            format!(
                "Unexpected Error: {}\n\nPlease report this issue with debug logs enabled",
                error
            )
        }
    }
}
