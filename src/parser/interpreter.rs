//! Interpreters
//!
//! An interpreter claims logical lines that need more than a pattern match,
//! typically the reply to one specific command. Registered interpreters are
//! tried in registration order before the pattern store; the first claim wins.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use super::command::Command;
use crate::error::Result;

/// A handler that may claim a logical line
pub trait Interpreter: Send + Sync {
    /// Handler name, used for logging and unregistering
    fn name(&self) -> &str;

    /// Id reported in `Interpreter` events
    fn id(&self) -> i32;

    /// Whether this handler claims `line`, given the command in flight
    fn claims(&self, line: &str, current: Option<&Command>) -> bool;
}

/// Shared handle to a registered interpreter
pub type InterpreterRef = Arc<dyn Interpreter>;

/// Claims the answer to a particular command
///
/// A line is claimed when a command is in flight, its text matches the
/// command regex, its caller matches (if one was given), and the line
/// matches the answer regex.
#[derive(Debug, Clone)]
pub struct CommandInterpreter {
    name: String,
    id: i32,
    caller_id: Option<String>,
    command: Regex,
    answer: Regex,
}

impl CommandInterpreter {
    pub fn new(name: impl Into<String>, id: i32, command: &str, answer: &str) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            id,
            caller_id: None,
            command: Regex::new(command)?,
            answer: Regex::new(answer)?,
        })
    }

    /// Only claim replies to commands queued by `caller_id`
    pub fn for_caller(mut self, caller_id: impl Into<String>) -> Self {
        self.caller_id = Some(caller_id.into());
        self
    }
}

impl Interpreter for CommandInterpreter {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> i32 {
        self.id
    }

    fn claims(&self, line: &str, current: Option<&Command>) -> bool {
        let Some(command) = current else {
            return false;
        };
        if let Some(caller) = &self.caller_id {
            if caller != &command.caller_id {
                return false;
            }
        }
        self.command.is_match(&command.text) && self.answer.is_match(line)
    }
}

/// Claims lines with an arbitrary predicate
pub struct PredicateInterpreter<F> {
    name: String,
    id: i32,
    predicate: F,
}

impl<F> PredicateInterpreter<F>
where
    F: Fn(&str, Option<&Command>) -> bool + Send + Sync,
{
    pub fn new(name: impl Into<String>, id: i32, predicate: F) -> Self {
        Self {
            name: name.into(),
            id,
            predicate,
        }
    }
}

impl<F> Interpreter for PredicateInterpreter<F>
where
    F: Fn(&str, Option<&Command>) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> i32 {
        self.id
    }

    fn claims(&self, line: &str, current: Option<&Command>) -> bool {
        (self.predicate)(line, current)
    }
}

impl<F> fmt::Debug for PredicateInterpreter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateInterpreter")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Interpreters in priority order
#[derive(Default, Clone)]
pub struct InterpreterRegistry {
    handlers: Vec<InterpreterRef>,
}

impl InterpreterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler at the lowest priority
    pub fn register(&mut self, handler: InterpreterRef) {
        debug!("Registered interpreter '{}' ({})", handler.name(), handler.id());
        self.handlers.push(handler);
    }

    /// Remove every handler named `name`; returns whether any was removed
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|h| h.name() != name);
        before != self.handlers.len()
    }

    /// First handler claiming `line`
    pub fn find(&self, line: &str, current: Option<&Command>) -> Option<&InterpreterRef> {
        self.handlers.iter().find(|h| h.claims(line, current))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for InterpreterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|h| h.name()))
            .finish()
    }
}
