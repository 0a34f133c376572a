//! Built-in GDB console rules
//!
//! Order matters: more specific rules come first (a crash signal must be
//! seen before the generic "Program received signal" stop rule).

use super::PatternRecord;
use crate::parser::event::ids;

/// (id, pattern, comment, terminates_block)
const BUILTIN_PATTERNS: &[(i32, &str, &str, bool)] = &[
    // Prompt
    (ids::PROMPT, r"^\(gdb\)\s*$", "GDB prompt", true),
    // Target loading
    (
        ids::TARGET_LOADED,
        r"^Reading symbols from .+\.\.\.(done\.)?$",
        "Symbols loaded",
        false,
    ),
    (
        ids::TARGET_NO_LOADED,
        r": No such file or directory\.$",
        "Target file missing",
        false,
    ),
    (
        ids::TARGET_NO_LOADED,
        r"not in executable format",
        "Target is not an executable",
        false,
    ),
    (
        ids::TARGET_NO_LOADED,
        r"^No executable file specified\.",
        "No target loaded",
        false,
    ),
    // Crashes before the generic signal stop
    (
        ids::TARGET_CRASHED,
        r"^Program received signal SIG(SEGV|ABRT|BUS|FPE|ILL)",
        "Fatal signal",
        false,
    ),
    (
        ids::TARGET_CRASHED,
        r"^Program terminated with signal ",
        "Target killed by signal",
        false,
    ),
    // Running
    (ids::TARGET_RUNNING, r"^Starting program: ", "Target started", false),
    (ids::TARGET_RUNNING, r"^Continuing\.$", "Target resumed", false),
    // Stopped
    (ids::TARGET_STOPPED, r"^Breakpoint \d+, ", "Breakpoint hit", false),
    (
        ids::TARGET_STOPPED,
        r"^Temporary breakpoint \d+, ",
        "Temporary breakpoint hit",
        false,
    ),
    (
        ids::TARGET_STOPPED,
        r"^Program received signal ",
        "Target interrupted by signal",
        false,
    ),
    // Exited
    (
        ids::TARGET_EXITED,
        r"^Program exited normally\.$",
        "Target exited",
        false,
    ),
    (
        ids::TARGET_EXITED,
        r"^Program exited with code \d+\.$",
        "Target exited with code",
        false,
    ),
    (
        ids::TARGET_EXITED,
        r"^\[Inferior \d+ \(process \d+\) exited (normally|with code \d+)\]$",
        "Inferior exited",
        false,
    ),
    // Informational replies
    (
        10001,
        r"^Breakpoint \d+ at 0x[0-9a-fA-F]+",
        "Breakpoint set",
        false,
    ),
    (10002, r"^Deleted breakpoint", "Breakpoint deleted", false),
    (
        10003,
        r"^No breakpoints or watchpoints\.$",
        "Empty breakpoint list",
        false,
    ),
    (
        10004,
        r#"^No symbol ".*" in current context\.$"#,
        "Unknown symbol",
        false,
    ),
    (
        10005,
        r"^The program is not being run\.$",
        "Target not running",
        false,
    ),
    (10006, r"^No stack\.$", "No backtrace available", false),
    (
        10007,
        r"^Kill the program being debugged\? \(y or n\) \[answered Y; input not from terminal\]$",
        "Kill confirmed",
        false,
    ),
    (10008, r"^Undefined command: ", "Unknown command", false),
    (10009, r"^\^done", "MI done record", false),
];

/// Records for the built-in rule table, in priority order
pub fn builtin_records() -> Vec<PatternRecord> {
    BUILTIN_PATTERNS
        .iter()
        .map(|&(id, pattern, comment, terminates_block)| PatternRecord {
            id,
            pattern: pattern.to_string(),
            comment: comment.to_string(),
            enabled: true,
            terminates_block,
        })
        .collect()
}
