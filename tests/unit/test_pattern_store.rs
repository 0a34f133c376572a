//! Unit tests for the pattern store

use gdbstream::parser::event::ids;
use gdbstream::parser::reassembler::BlockTerminators;
use gdbstream::patterns::{PatternEntry, PatternRecord, PatternStore, SharedPatternStore};
use gdbstream::Error;

#[cfg(test)]
mod pattern_store_tests {
    use super::*;

    #[test]
    fn test_priority_is_position() {
        let mut store = PatternStore::new();
        store.append(r"^\(gdb\)$", 10, true);
        store.append("Breakpoint", 5, false);

        assert_eq!(store.find("Breakpoint 1 hit"), Some(5));
        assert_eq!(store.find("(gdb)"), Some(10));
    }

    #[test]
    fn test_lower_id_does_not_win() {
        let mut store = PatternStore::new();
        store.append("hit", 900, false);
        store.append("Breakpoint", 1, false);

        assert_eq!(store.find("Breakpoint 1 hit"), Some(900));
    }

    #[test]
    fn test_get_lists_disabled_entries() {
        let store = PatternStore::from_records(vec![
            PatternRecord::new(1, "a"),
            PatternRecord {
                enabled: false,
                ..PatternRecord::new(2, "b")
            },
        ]);

        assert_eq!(store.get().len(), 2);
        assert!(!store.get()[1].is_enabled());
        assert_eq!(store.find("b"), None);
    }

    #[test]
    fn test_append_returns_index() {
        let mut store = PatternStore::new();
        assert_eq!(store.append("a", 1, false), 0);
        assert_eq!(store.append("b", 2, false), 1);
        assert_eq!(store.push(PatternEntry::new(3, "c")), 2);
    }

    #[test]
    fn test_replace_does_not_reorder() {
        let mut store = PatternStore::with_builtin();
        let before: Vec<i32> = store.get().iter().map(PatternEntry::id).collect();

        store
            .replace_at(3, PatternEntry::new(20000, "^custom$").with_comment("mine"))
            .unwrap();

        let after: Vec<i32> = store.get().iter().map(PatternEntry::id).collect();
        assert_eq!(after.len(), before.len());
        for (i, (a, b)) in before.iter().zip(after.iter()).enumerate() {
            if i == 3 {
                assert_eq!(*b, 20000);
            } else {
                assert_eq!(a, b);
            }
        }
        assert!(store.get()[3].is_user_defined());
    }

    #[test]
    fn test_out_of_range_edits() {
        let mut store = PatternStore::new();
        assert!(matches!(
            store.set_enabled(4, false),
            Err(Error::PatternIndexOutOfRange { index: 4, len: 0 })
        ));
    }

    #[test]
    fn test_invalid_pattern_kept_but_inert() {
        let mut store = PatternStore::new();
        store.append("[unclosed", 20000, false);
        store.append("unclosed", 20001, false);

        assert_eq!(store.len(), 2);
        assert!(!store.get()[0].is_valid());
        assert_eq!(store.find("[unclosed"), Some(20001));
    }

    #[test]
    fn test_terminator_set() {
        let mut store = PatternStore::with_builtin();
        assert!(store.is_block_terminator("(gdb) "));
        assert!(!store.is_block_terminator("Continuing."));

        let index = store.append(r"^>\s*$", 20000, true);
        assert!(store.is_block_terminator(">"));
        assert_eq!(store.block_terminator_patterns().len(), 2);

        store.set_enabled(index, false).unwrap();
        assert!(!store.is_block_terminator(">"));
    }

    #[test]
    fn test_builtin_kinds() {
        let store = PatternStore::with_builtin();
        assert_eq!(
            store.find("Program terminated with signal SIGKILL, Killed."),
            Some(ids::TARGET_CRASHED)
        );
        assert_eq!(
            store.find("No executable file specified."),
            Some(ids::TARGET_NO_LOADED)
        );
        assert_eq!(store.find("Program exited with code 01."), Some(ids::TARGET_EXITED));
        assert_eq!(store.find("No stack."), Some(10006));
    }

    #[test]
    fn test_shared_store_handles_see_edits() {
        let parser_side = SharedPatternStore::with_builtin();
        let editor_side = parser_side.clone();
        let len = parser_side.len();

        editor_side.append("^Locals:", 20000, false);
        assert_eq!(parser_side.len(), len + 1);
        assert_eq!(parser_side.find("Locals: x"), Some(20000));

        editor_side.set_enabled(len, false).unwrap();
        assert_eq!(parser_side.find("Locals: x"), None);
        assert!(!parser_side.records()[len].enabled);
    }
}
