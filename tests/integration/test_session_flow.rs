//! Integration Tests for the Session Driver
//!
//! Drives a parser on its tokio task the way a debugger transport would:
//! commands go out on the outbound channel, output comes back in fragments.

#[path = "../test_utils/fixtures.rs"]
mod fixtures;

use fixtures::*;
use gdbstream::session::SessionRequest;
use gdbstream::{Command, DebuggerSession, EventKind, ParserEventBus};
use tokio::sync::mpsc;

#[tokio::test]
async fn test_transport_round_trip() {
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Command>();
    let session = DebuggerSession::start(builtin_parser(), ParserEventBus::new(64), outbound_tx);
    let mut events = session.subscribe();

    session.queue_command("Breakpoints", "break main").unwrap();
    session.queue_command("Runner", "run").unwrap();

    // A fake debugger answering each command as it is sent
    let replies = [
        ("break main", "Breakpoint 1 at 0x1139: file main.c, line 4.\n(gdb) "),
        ("run", "Starting program: /tmp/a.out \n\nBreakpoint 1, main () at main.c:4\n(gdb) "),
    ];
    for (expected, reply) in replies {
        let command = outbound_rx.recv().await.unwrap();
        assert_eq!(command.text, expected);
        for chunk in reply.as_bytes().chunks(5) {
            session
                .send_output(String::from_utf8(chunk.to_vec()).unwrap())
                .unwrap();
        }
    }

    let mut received = Vec::new();
    while received.len() < 5 {
        received.push(events.recv().await.unwrap());
    }
    assert_eq!(
        kinds(&received),
        vec![
            EventKind::Done,
            EventKind::Prompt,
            EventKind::TargetRunning,
            EventKind::TargetStopped,
            EventKind::Prompt,
        ]
    );
    assert_eq!(received[0].caller_id.as_deref(), Some("Breakpoints"));
    assert_eq!(received[4].caller_id.as_deref(), Some("Runner"));

    let parser = session.finish().await.unwrap();
    assert!(parser.is_ready());
}

#[tokio::test]
async fn test_requests_applied_in_order() {
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let session = DebuggerSession::start(builtin_parser(), ParserEventBus::default(), outbound_tx);

    session.set_ready(false).unwrap();
    session.queue_command("A", "info frame").unwrap();
    session.request(SessionRequest::SetReady(true)).unwrap();

    let sent = outbound_rx.recv().await.unwrap();
    assert_eq!(sent.caller_id, "A");

    let parser = session.finish().await.unwrap();
    assert!(!parser.is_ready());
    assert_eq!(parser.state().current_command.map(|c| c.caller_id), Some("A".to_string()));
}

#[tokio::test]
async fn test_multiple_subscribers() {
    let (outbound_tx, _outbound_rx) = mpsc::unbounded_channel();
    let session = DebuggerSession::start(builtin_parser(), ParserEventBus::new(16), outbound_tx);
    let mut first = session.subscribe();
    let mut second = session.subscribe();

    session.send_output(WRAPPED_BREAKPOINT).unwrap();

    for sub in [&mut first, &mut second] {
        assert_eq!(sub.recv().await.unwrap().kind, EventKind::TargetStopped);
        assert_eq!(sub.recv().await.unwrap().kind, EventKind::Prompt);
    }
    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_bus_outlives_session() {
    let (outbound_tx, _outbound_rx) = mpsc::unbounded_channel();
    let bus = ParserEventBus::new(4);
    let session = DebuggerSession::start(builtin_parser(), bus.clone(), outbound_tx);
    let mut events = bus.subscribe();

    let parser = session.stop().await.unwrap();
    assert!(parser.is_ready());

    // The bus outlives the session
    bus.publish(gdbstream::ParserEvent::new(EventKind::Prompt, "(gdb)"));
    assert_eq!(events.recv().await.unwrap().kind, EventKind::Prompt);
}
