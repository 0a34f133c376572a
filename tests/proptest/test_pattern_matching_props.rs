//! Property-based tests for pattern lookup

use gdbstream::patterns::{PatternRecord, PatternStore};
use proptest::prelude::*;

fn record() -> impl Strategy<Value = PatternRecord> {
    ("[a-e]{1,3}", 0i32..30000, any::<bool>()).prop_map(|(word, id, enabled)| PatternRecord {
        enabled,
        ..PatternRecord::new(id, regex::escape(&word))
    })
}

proptest! {
    #[test]
    fn test_find_returns_first_enabled_match(
        records in prop::collection::vec(record(), 0..20),
        text in "[a-e ]{0,30}",
    ) {
        let expected = records
            .iter()
            .find(|r| r.enabled && text.contains(r.pattern.as_str()))
            .map(|r| r.id);

        let store = PatternStore::from_records(records);
        prop_assert_eq!(store.find(&text), expected);
    }

    #[test]
    fn test_appending_never_changes_earlier_match(
        records in prop::collection::vec(record(), 1..20),
        extra in record(),
        text in "[a-e ]{0,30}",
    ) {
        let mut store = PatternStore::from_records(records);
        let before = store.find(&text);
        store.append(&extra.pattern, extra.id, false);

        if before.is_some() {
            prop_assert_eq!(store.find(&text), before);
        }
    }

    #[test]
    fn test_disabling_everything_matches_nothing(
        records in prop::collection::vec(record(), 0..20),
        text in "[a-e ]{0,30}",
    ) {
        let mut store = PatternStore::from_records(records);
        for index in 0..store.len() {
            store.set_enabled(index, false).unwrap();
        }
        prop_assert_eq!(store.find(&text), None);
    }

    #[test]
    fn test_builtin_lookup_doesnt_panic(s in "\\PC*") {
        let _ = PatternStore::with_builtin().find(&s);
    }
}
