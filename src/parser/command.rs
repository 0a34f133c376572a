//! Command queue and readiness gate
//!
//! Several callers share one debugger command channel. Commands are queued
//! FIFO; while one is in flight the gate is `Busy`, and the next prompt (or
//! completing reply) releases it and tells the parser which caller the reply
//! belonged to.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A debugger command queued by a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Logical owner, used to route the reply
    pub caller_id: String,
    /// Raw command text sent to the debugger
    pub text: String,
    /// Tracker-assigned id, starting at 1
    pub correlation_id: u64,
}

/// Readiness gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GateState {
    /// The debugger can accept a command
    #[default]
    Ready,
    /// A command is in flight
    Busy,
}

/// FIFO of pending commands plus the readiness gate
#[derive(Debug)]
pub struct CommandTracker {
    queue: VecDeque<Command>,
    current: Option<Command>,
    state: GateState,
    next_correlation_id: u64,
}

impl CommandTracker {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            current: None,
            state: GateState::Ready,
            next_correlation_id: 1,
        }
    }
}

impl Default for CommandTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTracker {
    /// Queue a command
    ///
    /// Returns the command to send now when the gate was `Ready`; otherwise
    /// it waits in the queue.
    pub fn set_next_command(
        &mut self,
        caller_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Option<Command> {
        let command = Command {
            caller_id: caller_id.into(),
            text: text.into(),
            correlation_id: self.next_correlation_id,
        };
        self.next_correlation_id += 1;
        debug!(
            "Queued command #{} '{}' for {}",
            command.correlation_id, command.text, command.caller_id
        );
        self.queue.push_back(command);
        self.dispatch_next()
    }

    /// Make the next queued command current if the gate is `Ready`
    pub fn dispatch_next(&mut self) -> Option<Command> {
        if self.state == GateState::Busy {
            return None;
        }
        let command = self.queue.pop_front()?;
        if let Some(stale) = self.current.take() {
            warn!(
                "Command #{} '{}' never completed, dropping it",
                stale.correlation_id, stale.text
            );
        }
        debug!("Gate busy with command #{}", command.correlation_id);
        self.state = GateState::Busy;
        self.current = Some(command.clone());
        Some(command)
    }

    /// Release the gate; returns the command that just completed
    ///
    /// `None` means the prompt was spontaneous.
    pub fn on_prompt_detected(&mut self) -> Option<Command> {
        self.state = GateState::Ready;
        let completed = self.current.take();
        match &completed {
            Some(command) => debug!(
                "Command #{} for {} completed",
                command.correlation_id, command.caller_id
            ),
            None => debug!("Spontaneous prompt"),
        }
        completed
    }

    /// Drop every queued and in-flight command and force `Ready`
    ///
    /// Returns how many commands were discarded.
    pub fn clear_all_command(&mut self) -> usize {
        let discarded = self.queue.len() + usize::from(self.current.is_some());
        self.queue.clear();
        self.current = None;
        self.state = GateState::Ready;
        if discarded > 0 {
            debug!("Cleared {} pending commands", discarded);
        }
        discarded
    }

    pub fn is_ready(&self) -> bool {
        self.state == GateState::Ready
    }

    /// Override the gate, for external recovery
    pub fn set_ready(&mut self, ready: bool) {
        self.state = if ready {
            GateState::Ready
        } else {
            GateState::Busy
        };
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Command in flight, if any
    pub fn current(&self) -> Option<&Command> {
        self.current.as_ref()
    }

    /// Queued commands not yet sent, oldest first
    pub fn pending(&self) -> impl Iterator<Item = &Command> {
        self.queue.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }
}
