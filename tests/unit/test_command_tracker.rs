//! Unit tests for command tracking

use gdbstream::parser::{CommandTracker, GateState};

#[cfg(test)]
mod command_tracker_tests {
    use super::*;

    #[test]
    fn test_fifo_order_and_correlation_ids() {
        let mut tracker = CommandTracker::new();
        let first = tracker.set_next_command("Backtrace", "bt").unwrap();
        assert!(tracker.set_next_command("Locals", "info locals").is_none());
        assert!(tracker.set_next_command("Registers", "info registers").is_none());

        let pending: Vec<&str> = tracker.pending().map(|c| c.caller_id.as_str()).collect();
        assert_eq!(pending, vec!["Locals", "Registers"]);

        assert_eq!(tracker.on_prompt_detected().unwrap(), first);
        let second = tracker.dispatch_next().unwrap();
        assert_eq!(second.caller_id, "Locals");
        assert_eq!(second.correlation_id, first.correlation_id + 1);

        tracker.on_prompt_detected();
        let third = tracker.dispatch_next().unwrap();
        assert_eq!(third.caller_id, "Registers");
        assert_eq!(third.correlation_id, 3);
    }

    #[test]
    fn test_dispatch_while_busy_does_nothing() {
        let mut tracker = CommandTracker::new();
        tracker.set_next_command("A", "run");
        tracker.set_next_command("B", "bt");

        assert!(tracker.dispatch_next().is_none());
        assert_eq!(tracker.state(), GateState::Busy);
        assert_eq!(tracker.current().map(|c| c.text.as_str()), Some("run"));
    }

    #[test]
    fn test_ready_with_empty_queue() {
        let mut tracker = CommandTracker::default();
        assert!(tracker.dispatch_next().is_none());
        assert_eq!(tracker.state(), GateState::Ready);
    }

    #[test]
    fn test_clear_all_is_idempotent() {
        let mut tracker = CommandTracker::new();
        assert_eq!(tracker.clear_all_command(), 0);

        tracker.set_next_command("A", "run");
        tracker.set_next_command("B", "bt");
        assert_eq!(tracker.clear_all_command(), 2);
        assert_eq!(tracker.clear_all_command(), 0);

        assert!(tracker.is_ready());
        assert_eq!(tracker.pending_len(), 0);
    }

    #[test]
    fn test_correlation_ids_survive_clear() {
        let mut tracker = CommandTracker::new();
        tracker.set_next_command("A", "run");
        tracker.clear_all_command();

        let next = tracker.set_next_command("B", "bt").unwrap();
        assert_eq!(next.correlation_id, 2);
    }

    #[test]
    fn test_spontaneous_prompts_while_ready() {
        let mut tracker = CommandTracker::new();
        for _ in 0..3 {
            assert!(tracker.on_prompt_detected().is_none());
        }
        assert!(tracker.is_ready());
    }
}
