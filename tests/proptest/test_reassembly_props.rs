//! Property-based tests for line reassembly
//!
//! Transcripts are built from whole debugger lines, then fed in arbitrary
//! fragment sizes. The logical lines must not depend on the split.

#[path = "../test_utils/fixtures.rs"]
mod fixtures;

use fixtures::*;
use gdbstream::parser::reassembler::LineReassembler;
use proptest::prelude::*;
use regex::Regex;

fn debugger_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("(gdb) ".to_string()),
        Just("(gdb)".to_string()),
        Just(String::new()),
        Just("Continuing.".to_string()),
        Just("Breakpoint 1, 0x3de4ac at ".to_string()),
        Just("main.cpp, line 23".to_string()),
        Just("\tat main.c:4".to_string()),
        Just("(gdb) Breakpoint 1 at 0x1139: file main.c, line 4.".to_string()),
        Just("(gdb) Continuing.".to_string()),
        Just("(gdb)   (gdb) ".to_string()),
        Just("Program exited normally.".to_string()),
        Just("\r".to_string()),
        "#[0-9] [a-z_ ]{1,20}",
        "[A-Za-z0-9=$ ]{1,40}",
    ]
}

fn transcript() -> impl Strategy<Value = String> {
    prop::collection::vec(debugger_line(), 0..40).prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn test_fragment_size_does_not_change_lines(
        input in transcript(),
        sizes in prop::collection::vec(1usize..12, 1..8),
    ) {
        let whole = feed_whole(&mut LineReassembler::new(), &input);
        let split = feed_split(&mut LineReassembler::new(), &input, &sizes);
        prop_assert_eq!(whole, split);
    }

    #[test]
    fn test_single_characters_match_whole(input in transcript()) {
        let whole = feed_whole(&mut LineReassembler::new(), &input);
        let chars = feed_chars(&mut LineReassembler::new(), &input);
        prop_assert_eq!(whole, chars);
    }

    #[test]
    fn test_open_ended_terminator_is_split_invariant(
        input in transcript(),
        sizes in prop::collection::vec(1usize..12, 1..8),
    ) {
        let terminators = vec![
            Regex::new(r"^\(gdb\)\s*$").unwrap(),
            Regex::new("^Program exited").unwrap(),
        ];
        let whole = LineReassembler::new().feed(&input, &terminators);

        let mut split = LineReassembler::new();
        let mut lines = Vec::new();
        let mut rest = input.as_str();
        for size in sizes.iter().cycle() {
            if rest.is_empty() {
                break;
            }
            let mut cut = (*size).min(rest.len());
            while !rest.is_char_boundary(cut) {
                cut += 1;
            }
            let (fragment, tail) = rest.split_at(cut);
            lines.extend(split.feed(fragment, &terminators));
            rest = tail;
        }
        prop_assert_eq!(whole, lines);
    }

    #[test]
    fn test_no_blank_or_padded_lines(input in transcript()) {
        for line in feed_whole(&mut LineReassembler::new(), &input) {
            prop_assert!(!line.is_empty());
            prop_assert_eq!(line.trim_end(), line.as_str());
        }
    }

    #[test]
    fn test_trailing_prompt_drains_buffer(input in transcript()) {
        let mut reassembler = LineReassembler::new();
        feed_whole(&mut reassembler, &input);
        let lines = feed_whole(&mut reassembler, "\n(gdb)\n");

        prop_assert_eq!(lines.last().map(String::as_str), Some("(gdb)"));
        prop_assert!(!reassembler.has_pending());
    }

    #[test]
    fn test_arbitrary_text_doesnt_panic(s in "\\PC*") {
        let mut reassembler = LineReassembler::new();
        let _ = feed_chars(&mut reassembler, &s);
    }
}
