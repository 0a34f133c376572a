//! Debugger Session Driver
//!
//! Runs a [`Parser`] on its own tokio task so output fragments, command
//! requests and recovery actions from any number of producers are applied
//! one at a time, in arrival order. Classified events fan out on a
//! broadcast bus; commands that become sendable are delivered on an
//! outbound channel for the transport to write to the debugger.

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::parser::{Command, Parser, ParserEvent};

/// Subscription handle for receiving parser events
pub struct ParserEventSubscription {
    receiver: broadcast::Receiver<ParserEvent>,
}

impl ParserEventSubscription {
    /// Receive the next event, waiting if necessary
    ///
    /// Returns `None` once every bus handle is dropped.
    pub async fn recv(&mut self) -> Option<ParserEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!("Parser event subscriber lagged by {} events", count);
                }
            }
        }
    }

    /// Try to receive an event without waiting
    pub fn try_recv(&mut self) -> Option<ParserEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Empty)
                | Err(broadcast::error::TryRecvError::Closed) => return None,
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!("Parser event subscriber lagged by {} events", count);
                }
            }
        }
    }
}

/// Broadcast bus for parser events
///
/// The session task is the only publisher of parser output; a parser run
/// without a session reports through [`Parser::subscribe`] instead.
#[derive(Clone)]
pub struct ParserEventBus {
    sender: broadcast::Sender<ParserEvent>,
}

impl ParserEventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> ParserEventSubscription {
        ParserEventSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Publish an event to all current subscribers
    pub fn publish(&self, event: ParserEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ParserEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Work item for the session task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRequest {
    /// Raw debugger output fragment
    Output(String),
    /// Queue a command for a caller
    Command { caller_id: String, text: String },
    /// Drop every queued and in-flight command
    ClearAll,
    /// Override the readiness gate
    SetReady(bool),
    /// Change the physical line sentinel
    SetLineTerminator(String),
}

/// Session task spawner
pub struct DebuggerSession;

impl DebuggerSession {
    /// Spawn the session task
    ///
    /// Events are published on `bus` in addition to any listener already
    /// subscribed to `parser`. Commands are written to `outbound` when the
    /// debugger is ready for them.
    pub fn start(
        parser: Parser,
        bus: ParserEventBus,
        outbound: mpsc::UnboundedSender<Command>,
    ) -> SessionHandle {
        let id = Uuid::new_v4();
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = mpsc::channel::<()>(1);

        let task_bus = bus.clone();
        let task = tokio::spawn(run(id, parser, task_bus, outbound, request_rx, stop_rx));

        info!("Debugger session {} started", id);
        SessionHandle {
            id,
            request_tx,
            stop_tx,
            bus,
            task,
        }
    }
}

async fn run(
    id: Uuid,
    mut parser: Parser,
    bus: ParserEventBus,
    outbound: mpsc::UnboundedSender<Command>,
    mut request_rx: mpsc::UnboundedReceiver<SessionRequest>,
    mut stop_rx: mpsc::Receiver<()>,
) -> Parser {
    loop {
        tokio::select! {
            biased;
            _ = stop_rx.recv() => {
                debug!("Stopping debugger session {}", id);
                break;
            }
            request = request_rx.recv() => {
                match request {
                    Some(request) => handle_request(&mut parser, &bus, &outbound, request),
                    None => {
                        debug!("Request channel closed for session {}", id);
                        break;
                    }
                }
            }
        }
    }

    info!("Debugger session {} stopped", id);
    parser
}

fn handle_request(
    parser: &mut Parser,
    bus: &ParserEventBus,
    outbound: &mpsc::UnboundedSender<Command>,
    request: SessionRequest,
) {
    match request {
        SessionRequest::Output(fragment) => {
            for event in parser.process_fragment(&fragment) {
                bus.publish(event);
            }
            dispatch(parser.next_command(), outbound);
        }
        SessionRequest::Command { caller_id, text } => {
            dispatch(parser.set_next_command(caller_id, text), outbound);
        }
        SessionRequest::ClearAll => {
            parser.clear_all_command();
        }
        SessionRequest::SetReady(ready) => {
            parser.set_ready(ready);
            dispatch(parser.next_command(), outbound);
        }
        SessionRequest::SetLineTerminator(sentinel) => {
            parser.set_line_terminator(&sentinel);
        }
    }
}

fn dispatch(command: Option<Command>, outbound: &mpsc::UnboundedSender<Command>) {
    if let Some(command) = command {
        debug!("Sending command #{} '{}'", command.correlation_id, command.text);
        if outbound.send(command).is_err() {
            warn!("Command transport closed, command not delivered");
        }
    }
}

/// Handle to a running session
pub struct SessionHandle {
    id: Uuid,
    request_tx: mpsc::UnboundedSender<SessionRequest>,
    stop_tx: mpsc::Sender<()>,
    bus: ParserEventBus,
    task: JoinHandle<Parser>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Subscribe to this session's events
    pub fn subscribe(&self) -> ParserEventSubscription {
        self.bus.subscribe()
    }

    pub fn request(&self, request: SessionRequest) -> Result<()> {
        self.request_tx
            .send(request)
            .map_err(|_| Error::SessionClosed)
    }

    /// Feed a raw output fragment
    pub fn send_output(&self, fragment: impl Into<String>) -> Result<()> {
        self.request(SessionRequest::Output(fragment.into()))
    }

    /// Queue a command for `caller_id`
    pub fn queue_command(&self, caller_id: impl Into<String>, text: impl Into<String>) -> Result<()> {
        self.request(SessionRequest::Command {
            caller_id: caller_id.into(),
            text: text.into(),
        })
    }

    pub fn clear_all(&self) -> Result<()> {
        self.request(SessionRequest::ClearAll)
    }

    pub fn set_ready(&self, ready: bool) -> Result<()> {
        self.request(SessionRequest::SetReady(ready))
    }

    pub fn set_line_terminator(&self, sentinel: impl Into<String>) -> Result<()> {
        self.request(SessionRequest::SetLineTerminator(sentinel.into()))
    }

    /// Stop after the request being handled; queued requests are dropped
    pub async fn stop(self) -> Result<Parser> {
        let _ = self.stop_tx.send(()).await;
        Self::join(self.task).await
    }

    /// Handle every queued request, then stop
    pub async fn finish(self) -> Result<Parser> {
        drop(self.request_tx);
        Self::join(self.task).await
    }

    async fn join(task: JoinHandle<Parser>) -> Result<Parser> {
        task.await.map_err(|e| Error::SessionTaskFailed {
            reason: e.to_string(),
        })
    }
}
