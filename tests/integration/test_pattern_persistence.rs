//! Integration Tests for Pattern Persistence
//!
//! Pattern tables saved to disk, loaded through the configuration and
//! reapplied to a running parser.

use std::fs;

use gdbstream::config::loader::ConfigLoader;
use gdbstream::patterns::{file, watcher, PatternRecord, PatternStore};
use gdbstream::{Config, EventKind, Parser, SharedPatternStore};
use tempfile::TempDir;

#[test]
fn test_parser_from_config_with_pattern_file() {
    let temp_dir = TempDir::new().unwrap();
    let patterns_path = temp_dir.path().join("patterns.toml");

    let mut store = PatternStore::with_builtin();
    store.append(r"^\$\d+ = ", 20000, false);
    file::save(&store, &patterns_path).unwrap();

    let mut config = Config::default();
    config.patterns.file = Some(patterns_path.clone());
    let config_path = temp_dir.path().join("config.json");
    ConfigLoader::new().save_to_path(&config, &config_path).unwrap();

    let loaded = ConfigLoader::load_from_path(&config_path).unwrap();
    let mut parser = Parser::from_config(&loaded).unwrap();

    let events = parser.process_fragment("$1 = 42\n(gdb) ");
    assert_eq!(events[0].kind, EventKind::Done);
    assert_eq!(events[0].resolved_id, Some(20000));
}

#[test]
fn test_from_config_rejects_malformed_table() {
    let temp_dir = TempDir::new().unwrap();
    let patterns_path = temp_dir.path().join("patterns.toml");
    fs::write(&patterns_path, "[[pattern]]\nid = \"not a number\"\n").unwrap();

    let mut config = Config::default();
    config.patterns.file = Some(patterns_path);
    assert!(Parser::from_config(&config).is_err());
}

#[test]
fn test_edited_file_applied_to_running_parser() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("patterns.json");

    let shared = SharedPatternStore::with_builtin();
    file::save_records(&shared.records(), &path).unwrap();
    let mut parser = Parser::new(shared.clone());

    assert_eq!(
        parser.process_fragment("Locals: none\n(gdb) ")[0].kind,
        EventKind::NoExecCommand
    );

    // Editor appends a user rule and disables the prompt's neighbour
    let mut records = file::read_records(&path).unwrap();
    records.push(PatternRecord::new(20000, "^Locals:"));
    records[1].enabled = false;
    file::save_records(&records, &path).unwrap();

    let changed = watcher::apply_records(&shared, file::read_records(&path).unwrap());
    assert_eq!(changed, 2);

    assert_eq!(
        parser.process_fragment("Locals: none\n(gdb) ")[0].kind,
        EventKind::Done
    );
    assert_eq!(
        parser.process_fragment("Reading symbols from ./a.out...\n(gdb) ")[0].kind,
        EventKind::NoExecCommand
    );
}

#[test]
fn test_shrunk_file_disables_but_keeps_entries() {
    let shared = SharedPatternStore::with_builtin();
    let len = shared.len();
    let prompt_only: Vec<PatternRecord> = shared.records().into_iter().take(1).collect();

    watcher::apply_records(&shared, prompt_only);

    assert_eq!(shared.len(), len);
    let records = shared.records();
    assert!(records[0].enabled);
    assert!(records[1..].iter().all(|r| !r.enabled));
    assert_eq!(shared.find("Continuing."), None);
    assert_eq!(shared.find("(gdb)"), Some(8));
}

#[test]
fn test_dump_format_is_loadable() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("dumped.toml");

    let rendered = file::to_toml_string(&PatternStore::with_builtin().records()).unwrap();
    assert!(rendered.contains("[[pattern]]"));
    fs::write(&path, rendered).unwrap();

    assert_eq!(
        file::read_records(&path).unwrap(),
        PatternStore::with_builtin().records()
    );
}
