//! Line classification
//!
//! Interpreters are consulted first, then the pattern store. A line nobody
//! recognizes is `Unrecognized` and becomes a `NoExecCommand` event.

use tracing::trace;

use super::command::Command;
use super::event::EventKind;
use super::interpreter::{InterpreterRef, InterpreterRegistry};
use crate::patterns::SharedPatternStore;

/// Outcome of classifying one logical line
#[derive(Clone)]
pub enum Classification {
    /// Claimed by a registered interpreter
    Interpreter(InterpreterRef),
    /// Matched a pattern store entry
    Pattern { id: i32, kind: EventKind },
    /// Neither claimed nor matched
    Unrecognized,
}

impl Classification {
    /// Event kind this classification produces
    pub fn kind(&self) -> EventKind {
        match self {
            Classification::Interpreter(_) => EventKind::Interpreter,
            Classification::Pattern { kind, .. } => *kind,
            Classification::Unrecognized => EventKind::NoExecCommand,
        }
    }
}

impl std::fmt::Debug for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Interpreter(handler) => {
                f.debug_tuple("Interpreter").field(&handler.name()).finish()
            }
            Classification::Pattern { id, kind } => f
                .debug_struct("Pattern")
                .field("id", id)
                .field("kind", kind)
                .finish(),
            Classification::Unrecognized => f.write_str("Unrecognized"),
        }
    }
}

/// Interpreters plus the pattern store
#[derive(Debug, Clone)]
pub struct EventClassifier {
    interpreters: InterpreterRegistry,
    patterns: SharedPatternStore,
}

impl EventClassifier {
    pub fn new(patterns: SharedPatternStore) -> Self {
        Self {
            interpreters: InterpreterRegistry::new(),
            patterns,
        }
    }

    pub fn interpreters(&self) -> &InterpreterRegistry {
        &self.interpreters
    }

    pub fn interpreters_mut(&mut self) -> &mut InterpreterRegistry {
        &mut self.interpreters
    }

    pub fn patterns(&self) -> &SharedPatternStore {
        &self.patterns
    }

    /// Classify `line` against the live rule set
    pub fn classify(&self, line: &str, current: Option<&Command>) -> Classification {
        if let Some(handler) = self.interpreters.find(line, current) {
            trace!("'{}' claimed by {}", line, handler.name());
            return Classification::Interpreter(handler.clone());
        }

        match self.patterns.find(line) {
            Some(id) => Classification::Pattern {
                id,
                kind: EventKind::from_pattern_id(id),
            },
            None => Classification::Unrecognized,
        }
    }
}
