//! Debugger output parser
//!
//! [`Parser`] is the single entry point for raw debugger output. Each
//! fragment goes through line reassembly, classification (interpreters
//! first, then the pattern store) and caller resolution through the command
//! tracker; every logical line becomes exactly one [`ParserEvent`].

pub mod classifier;
pub mod command;
pub mod event;
pub mod interpreter;
pub mod reassembler;

use std::fmt;

use tracing::{debug, trace, warn};

use crate::config::{Config, ParserConfig};
use crate::error::Result;
use crate::patterns::{file, SharedPatternStore};

pub use classifier::{Classification, EventClassifier};
pub use command::{Command, CommandTracker, GateState};
pub use event::{EventKind, ParserEvent};
pub use interpreter::{CommandInterpreter, Interpreter, InterpreterRef, PredicateInterpreter};
pub use reassembler::{BlockTerminators, LineReassembler};

/// Receiver of parser events
pub trait EventListener: Send {
    fn on_event(&mut self, event: &ParserEvent);
}

impl EventListener for tokio::sync::mpsc::UnboundedSender<ParserEvent> {
    fn on_event(&mut self, event: &ParserEvent) {
        if self.send(event.clone()).is_err() {
            trace!("Event receiver dropped, discarding {}", event.kind);
        }
    }
}

/// Snapshot of one debugger session's parsing state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserState {
    pub ready: bool,
    pub current_command: Option<Command>,
    /// Buffered output not yet returned as logical lines
    pub pending_buffer: String,
    /// Enabled block-terminator patterns
    pub block_terminators: Vec<String>,
}

/// Orchestrates reassembly, classification and command tracking
pub struct Parser {
    reassembler: LineReassembler,
    classifier: EventClassifier,
    tracker: CommandTracker,
    listeners: Vec<Box<dyn EventListener>>,
}

impl Parser {
    /// Create a parser over a shared pattern store with default settings
    pub fn new(patterns: SharedPatternStore) -> Self {
        Self::with_reassembler(patterns, LineReassembler::new())
    }

    /// Create a parser with explicit reassembly settings
    pub fn with_config(patterns: SharedPatternStore, config: &ParserConfig) -> Self {
        Self::with_reassembler(patterns, LineReassembler::with_config(config))
    }

    /// Create a parser from a full configuration, loading the pattern table
    ///
    /// Falls back to the built-in table when no pattern file is configured
    /// or the configured file does not exist yet.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = file::load_or_builtin(config.patterns.file.as_deref())?;
        Ok(Self::with_config(store.into(), &config.parser))
    }

    fn with_reassembler(patterns: SharedPatternStore, reassembler: LineReassembler) -> Self {
        Self {
            reassembler,
            classifier: EventClassifier::new(patterns),
            tracker: CommandTracker::new(),
            listeners: Vec::new(),
        }
    }

    /// Feed one raw fragment; returns whether any logical line was processed
    pub fn process_parsing(&mut self, fragment: &str) -> bool {
        !self.process_fragment(fragment).is_empty()
    }

    /// Feed one raw fragment; returns the events it produced, in order
    ///
    /// Listeners are notified of each event before the next line is
    /// classified.
    pub fn process_fragment(&mut self, fragment: &str) -> Vec<ParserEvent> {
        let lines = {
            let store = self.classifier.patterns().read();
            self.reassembler.feed(fragment, &*store)
        };

        let mut events = Vec::with_capacity(lines.len());
        for line in lines {
            let event = self.classify_line(line);
            for listener in &mut self.listeners {
                listener.on_event(&event);
            }
            events.push(event);
        }
        events
    }

    fn classify_line(&mut self, line: String) -> ParserEvent {
        let classification = self.classifier.classify(&line, self.tracker.current());
        let event = match classification {
            Classification::Interpreter(handler) => {
                ParserEvent::interpreted(handler, line).attributed_to(self.tracker.current())
            }
            Classification::Pattern { id, kind } if kind.completes_command() => {
                let completed = self.tracker.on_prompt_detected();
                ParserEvent::new(kind, line)
                    .with_resolved_id(id)
                    .attributed_to(completed.as_ref())
            }
            Classification::Pattern { id, kind } => ParserEvent::new(kind, line)
                .with_resolved_id(id)
                .attributed_to(self.tracker.current()),
            Classification::Unrecognized => {
                ParserEvent::new(EventKind::NoExecCommand, line).attributed_to(self.tracker.current())
            }
        };
        debug!(
            "{} #{}: {}",
            event.kind, event.correlation_id, event.text
        );
        event
    }

    /// Queue a command; returns it when it should be sent right away
    pub fn set_next_command(
        &mut self,
        caller_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Option<Command> {
        self.tracker.set_next_command(caller_id, text)
    }

    /// Next command to send, if the debugger is ready and one is queued
    pub fn next_command(&mut self) -> Option<Command> {
        self.tracker.dispatch_next()
    }

    /// Drop all queued and in-flight commands; the parser becomes ready
    pub fn clear_all_command(&mut self) -> usize {
        self.tracker.clear_all_command()
    }

    /// Clear commands and discard buffered output
    pub fn reset(&mut self) {
        let discarded = self.tracker.clear_all_command();
        self.reassembler.clear();
        debug!("Parser reset, {} commands discarded", discarded);
    }

    pub fn is_ready(&self) -> bool {
        self.tracker.is_ready()
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.tracker.set_ready(ready);
    }

    /// Set the physical line sentinel; an empty sentinel is ignored
    pub fn set_line_terminator(&mut self, sentinel: &str) {
        self.reassembler.set_line_terminator(sentinel);
    }

    pub fn line_terminator(&self) -> &str {
        self.reassembler.line_terminator()
    }

    /// Register an event listener
    pub fn subscribe<L>(&mut self, listener: L)
    where
        L: EventListener + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Add an interpreter at the lowest priority
    pub fn register_interpreter(&mut self, handler: InterpreterRef) {
        self.classifier.interpreters_mut().register(handler);
    }

    /// Remove interpreters by name; returns whether any was removed
    pub fn unregister_interpreter(&mut self, name: &str) -> bool {
        let removed = self.classifier.interpreters_mut().unregister(name);
        if !removed {
            warn!("No interpreter named '{}'", name);
        }
        removed
    }

    /// Shared pattern store used for classification
    pub fn patterns(&self) -> &SharedPatternStore {
        self.classifier.patterns()
    }

    /// Command tracker, for inspection
    pub fn tracker(&self) -> &CommandTracker {
        &self.tracker
    }

    /// Snapshot of the session state
    pub fn state(&self) -> ParserState {
        ParserState {
            ready: self.tracker.is_ready(),
            current_command: self.tracker.current().cloned(),
            pending_buffer: self.reassembler.pending_text(),
            block_terminators: self.patterns().read().block_terminator_patterns(),
        }
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("reassembler", &self.reassembler)
            .field("classifier", &self.classifier)
            .field("tracker", &self.tracker)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
