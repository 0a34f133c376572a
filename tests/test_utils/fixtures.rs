//! Test Fixtures
//!
//! Captured GDB transcripts and helpers shared by the integration, unit and
//! property tests (included with `#[path]`).

#![allow(dead_code)]

use gdbstream::parser::reassembler::LineReassembler;
use gdbstream::{EventKind, Parser, ParserEvent, SharedPatternStore};
use regex::Regex;

/// A short debugging session: load, break, run, hit, continue, exit
///
/// Prompts sit on their own lines, as when each reply is captured before
/// the next command is written.
pub const BREAKPOINT_SESSION: &str = "Reading symbols from ./a.out...\n\
(gdb) \n\
Breakpoint 1 at 0x1139: file main.c, line 4.\n\
(gdb) \n\
Starting program: /tmp/a.out \n\
\n\
Breakpoint 1, main () at main.c:4\n\
4\t  int x = 42;\n\
(gdb) \n\
Continuing.\n\
[Inferior 1 (process 4242) exited normally]\n\
(gdb) ";

/// Output where the debugger wrapped one message over two physical lines
pub const WRAPPED_BREAKPOINT: &str = "Breakpoint 1, 0x3de4ac at \nmain.cpp, line 23\n(gdb)\n";

/// Crash report followed by a backtrace request's reply
pub const CRASH_SESSION: &str = "Program received signal SIGSEGV, Segmentation fault.\n\
0x0000555555555131 in crash () at crash.c:3\n\
3\t  *p = 1;\n\
(gdb) \n\
#0  0x0000555555555131 in crash () at crash.c:3\n\
#1  0x0000555555555146 in main () at crash.c:8\n\
(gdb) ";

/// Replies captured from a pipe, each starting on the previous prompt's line
pub const PIPED_SESSION: &str = "(gdb) Breakpoint 1 at 0x1139: file main.c, line 4.\n\
(gdb) Starting program: /tmp/a.out \n\
\n\
Breakpoint 1, main () at main.c:4\n\
(gdb) ";

/// Parser over the built-in pattern table
pub fn builtin_parser() -> Parser {
    Parser::new(SharedPatternStore::with_builtin())
}

/// The GDB prompt as a block-terminator set
pub fn prompt_terminators() -> Vec<Regex> {
    vec![Regex::new(r"^\(gdb\)\s*$").expect("prompt regex")]
}

/// Feed `input` in one fragment
pub fn feed_whole(reassembler: &mut LineReassembler, input: &str) -> Vec<String> {
    reassembler.feed(input, &prompt_terminators())
}

/// Feed `input` one character at a time
pub fn feed_chars(reassembler: &mut LineReassembler, input: &str) -> Vec<String> {
    let terminators = prompt_terminators();
    let mut buf = [0u8; 4];
    input
        .chars()
        .flat_map(|c| reassembler.feed(c.encode_utf8(&mut buf), &terminators))
        .collect()
}

/// Feed `input` split at the given byte-length cut points
pub fn feed_split(reassembler: &mut LineReassembler, input: &str, sizes: &[usize]) -> Vec<String> {
    let terminators = prompt_terminators();
    let mut lines = Vec::new();
    let mut rest = input;
    let mut sizes = sizes.iter().cycle();

    while !rest.is_empty() {
        let mut cut = sizes.next().copied().unwrap_or(rest.len()).max(1).min(rest.len());
        while !rest.is_char_boundary(cut) {
            cut += 1;
        }
        let (fragment, tail) = rest.split_at(cut);
        lines.extend(reassembler.feed(fragment, &terminators));
        rest = tail;
    }
    lines
}

/// Event kinds in order
pub fn kinds(events: &[ParserEvent]) -> Vec<EventKind> {
    events.iter().map(|e| e.kind).collect()
}

/// Feed `input` to `parser` one character at a time, collecting events
pub fn parse_chars(parser: &mut Parser, input: &str) -> Vec<ParserEvent> {
    let mut buf = [0u8; 4];
    let mut events = Vec::new();
    for c in input.chars() {
        events.extend(parser.process_fragment(c.encode_utf8(&mut buf)));
    }
    events
}

#[cfg(test)]
mod fixture_tests {
    use super::*;

    #[test]
    fn test_breakpoint_session_events() {
        let mut parser = builtin_parser();
        let events = parser.process_fragment(BREAKPOINT_SESSION);

        assert_eq!(
            kinds(&events),
            vec![
                EventKind::TargetLoaded,
                EventKind::Prompt,
                EventKind::Done,
                EventKind::Prompt,
                EventKind::TargetRunning,
                EventKind::TargetStopped,
                EventKind::NoExecCommand,
                EventKind::Prompt,
                EventKind::TargetRunning,
                EventKind::TargetExited,
                EventKind::Prompt,
            ]
        );
    }

    #[test]
    fn test_split_helpers_agree() {
        let whole = feed_whole(&mut LineReassembler::new(), CRASH_SESSION);
        let chars = feed_chars(&mut LineReassembler::new(), CRASH_SESSION);
        let split = feed_split(&mut LineReassembler::new(), CRASH_SESSION, &[3, 7, 1]);

        assert_eq!(whole, chars);
        assert_eq!(whole, split);
    }

    #[test]
    fn test_piped_session_lines() {
        assert_eq!(
            feed_whole(&mut LineReassembler::new(), PIPED_SESSION),
            vec![
                "(gdb)",
                "Breakpoint 1 at 0x1139: file main.c, line 4.",
                "(gdb)",
                "Starting program: /tmp/a.out",
                "Breakpoint 1, main () at main.c:4",
                "(gdb)",
            ]
        );
    }
}
