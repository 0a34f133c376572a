//! Parser events
//!
//! One [`ParserEvent`] is emitted per classified logical line. Pattern ids
//! map to event kinds through a fixed table ([`EventKind::from_pattern_id`]).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::command::Command;
use super::interpreter::InterpreterRef;

/// Pattern ids with a fixed meaning
pub mod ids {
    pub const TARGET_LOADED: i32 = 1;
    pub const TARGET_NO_LOADED: i32 = 2;
    pub const TARGET_RUNNING: i32 = 3;
    pub const TARGET_STOPPED: i32 = 4;
    pub const TARGET_EXITED: i32 = 5;
    pub const TARGET_CRASHED: i32 = 6;
    /// Reserved; unrecognized lines never match a pattern
    pub const NOT_EXEC_COMMAND: i32 = 7;
    pub const PROMPT: i32 = 8;
}

/// Semantic category of a logical line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Claimed by an interpreter
    Interpreter,
    TargetLoaded,
    TargetNoLoaded,
    TargetRunning,
    TargetStopped,
    TargetExited,
    TargetCrashed,
    /// Neither claimed nor matched
    NoExecCommand,
    /// Recognized reply that completes the current command
    Done,
    /// Debugger ready for the next command
    Prompt,
}

impl EventKind {
    /// Map a matched pattern id to its event kind
    ///
    /// Ids outside the fixed table are recognized replies and map to `Done`.
    pub fn from_pattern_id(id: i32) -> Self {
        match id {
            ids::TARGET_LOADED => EventKind::TargetLoaded,
            ids::TARGET_NO_LOADED => EventKind::TargetNoLoaded,
            ids::TARGET_RUNNING => EventKind::TargetRunning,
            ids::TARGET_STOPPED => EventKind::TargetStopped,
            ids::TARGET_EXITED => EventKind::TargetExited,
            ids::TARGET_CRASHED => EventKind::TargetCrashed,
            ids::NOT_EXEC_COMMAND => EventKind::NoExecCommand,
            ids::PROMPT => EventKind::Prompt,
            _ => EventKind::Done,
        }
    }

    /// Whether this kind releases the readiness gate
    pub fn completes_command(self) -> bool {
        matches!(self, EventKind::Done | EventKind::Prompt)
    }

    /// Whether this kind reports a target state change
    pub fn is_target_state(self) -> bool {
        matches!(
            self,
            EventKind::TargetLoaded
                | EventKind::TargetNoLoaded
                | EventKind::TargetRunning
                | EventKind::TargetStopped
                | EventKind::TargetExited
                | EventKind::TargetCrashed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Interpreter => "interpreter",
            EventKind::TargetLoaded => "target_loaded",
            EventKind::TargetNoLoaded => "target_no_loaded",
            EventKind::TargetRunning => "target_running",
            EventKind::TargetStopped => "target_stopped",
            EventKind::TargetExited => "target_exited",
            EventKind::TargetCrashed => "target_crashed",
            EventKind::NoExecCommand => "no_exec_command",
            EventKind::Done => "done",
            EventKind::Prompt => "prompt",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified logical line
#[derive(Clone)]
pub struct ParserEvent {
    /// Event category
    pub kind: EventKind,
    /// Correlation id of the attributed command, 0 when unattributed
    pub correlation_id: u64,
    /// Caller that queued the attributed command
    pub caller_id: Option<String>,
    /// Matched pattern id, or the claiming interpreter's id
    pub resolved_id: Option<i32>,
    /// Claiming interpreter for `Interpreter` events
    pub interpreter: Option<InterpreterRef>,
    /// The logical line
    pub text: String,
    /// When the line was classified
    pub timestamp: DateTime<Utc>,
}

impl ParserEvent {
    /// Create an unattributed event
    pub fn new(kind: EventKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            correlation_id: 0,
            caller_id: None,
            resolved_id: None,
            interpreter: None,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create an event for a line claimed by `handler`
    pub fn interpreted(handler: InterpreterRef, text: impl Into<String>) -> Self {
        let mut event = Self::new(EventKind::Interpreter, text);
        event.resolved_id = Some(handler.id());
        event.interpreter = Some(handler);
        event
    }

    pub fn with_resolved_id(mut self, id: i32) -> Self {
        self.resolved_id = Some(id);
        self
    }

    /// Attribute the event to `command`, if any
    pub fn attributed_to(mut self, command: Option<&Command>) -> Self {
        if let Some(command) = command {
            self.correlation_id = command.correlation_id;
            self.caller_id = Some(command.caller_id.clone());
        }
        self
    }

    /// Whether the event was attributed to a queued command
    pub fn is_attributed(&self) -> bool {
        self.correlation_id != 0
    }

    /// Name of the claiming interpreter
    pub fn interpreter_name(&self) -> Option<&str> {
        self.interpreter.as_ref().map(|h| h.name())
    }
}

impl fmt::Debug for ParserEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserEvent")
            .field("kind", &self.kind)
            .field("correlation_id", &self.correlation_id)
            .field("caller_id", &self.caller_id)
            .field("resolved_id", &self.resolved_id)
            .field("interpreter", &self.interpreter_name())
            .field("text", &self.text)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}
