//! Line Reassembly
//!
//! Turns raw debugger output, delivered in fragments of any size, into
//! complete logical lines.
//!
//! Output is split into physical lines on the line-terminator sentinel and
//! collected into a block. A block is complete when a blank physical line or
//! a line starting with a block terminator (the prompt) arrives. On
//! completion, physical lines the debugger wrapped (by default: lines ending
//! in a space or tab) are folded into the following line, and the resulting
//! logical lines are returned followed by the terminator itself.
//!
//! A line starts with a terminator when a terminator rule matches one of its
//! non-blank prefixes; the shortest matching prefix is the terminator and
//! whatever follows it on the line is treated as a new physical line. The
//! same prefix scan runs over a complete line and over the unfinished tail
//! of the buffer, so delivering the same text in one fragment or one
//! character at a time gives the same logical lines.

use regex::Regex;
use tracing::{trace, warn};

use crate::config::ParserConfig;

/// Default physical line sentinel
pub const DEFAULT_LINE_TERMINATOR: &str = "\n";

/// Default continuation rule: the debugger wrapped a line after whitespace
pub const DEFAULT_CONTINUATION_PATTERN: &str = r"[ \t]$";

/// Default number of physical lines buffered before a forced flush
pub const DEFAULT_MAX_BLOCK_LINES: usize = 10_000;

/// Default size of an unfinished physical line before a forced flush
pub const DEFAULT_MAX_PENDING_BYTES: usize = 1 << 20;

/// Terminators are only looked for in this many leading bytes of a line
pub const MAX_TERMINATOR_LEN: usize = 256;

/// Source of block-terminator rules
pub trait BlockTerminators {
    /// Whether `line` completes the current block
    fn is_block_terminator(&self, line: &str) -> bool;
}

impl BlockTerminators for [Regex] {
    fn is_block_terminator(&self, line: &str) -> bool {
        self.iter().any(|r| r.is_match(line))
    }
}

impl BlockTerminators for Vec<Regex> {
    fn is_block_terminator(&self, line: &str) -> bool {
        self.as_slice().is_block_terminator(line)
    }
}

/// Fragment buffer producing complete logical lines
#[derive(Debug)]
pub struct LineReassembler {
    /// Text not yet split into physical lines
    pending: String,
    /// Bytes of the unfinished line already checked for a terminator
    scanned: usize,
    /// The unfinished line follows a terminator on the same physical line
    after_terminator: bool,
    /// Physical lines of the block being assembled
    block: Vec<String>,
    /// Physical line sentinel
    line_terminator: String,
    /// Lines matching any of these continue on the next physical line
    continuation_patterns: Vec<Regex>,
    /// Flush threshold for blocks that never see a terminator
    max_block_lines: usize,
    /// Flush threshold for an unfinished physical line
    max_pending_bytes: usize,
    /// Whether a partial line starting with a terminator completes the block
    accept_unterminated: bool,
}

impl LineReassembler {
    /// Create a reassembler with default rules
    pub fn new() -> Self {
        Self {
            pending: String::new(),
            scanned: 0,
            after_terminator: false,
            block: Vec::new(),
            line_terminator: DEFAULT_LINE_TERMINATOR.to_string(),
            continuation_patterns: Regex::new(DEFAULT_CONTINUATION_PATTERN)
                .into_iter()
                .collect(),
            max_block_lines: DEFAULT_MAX_BLOCK_LINES,
            max_pending_bytes: DEFAULT_MAX_PENDING_BYTES,
            accept_unterminated: true,
        }
    }
}

impl Default for LineReassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl LineReassembler {
    /// Create a reassembler from parser configuration
    ///
    /// Continuation patterns that fail to compile are skipped with a warning.
    pub fn with_config(config: &ParserConfig) -> Self {
        let continuation_patterns = config
            .continuation_patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!("Ignoring continuation pattern '{}': {}", pattern, e);
                    None
                }
            })
            .collect();

        let mut reassembler = Self {
            continuation_patterns,
            max_block_lines: config.max_block_lines.max(1),
            max_pending_bytes: config.max_pending_bytes.max(1),
            accept_unterminated: config.accept_unterminated_terminators,
            ..Self::new()
        };
        reassembler.set_line_terminator(&config.line_terminator);
        reassembler
    }

    /// Set the physical line sentinel; an empty sentinel is ignored
    ///
    /// Multi-character sentinels are matched whole, also when they arrive
    /// split across fragments.
    pub fn set_line_terminator(&mut self, sentinel: &str) {
        if sentinel.is_empty() {
            warn!("Ignoring empty line terminator");
            return;
        }
        self.line_terminator = sentinel.to_string();
    }

    pub fn line_terminator(&self) -> &str {
        &self.line_terminator
    }

    /// Replace the continuation rules
    pub fn set_continuation_patterns(&mut self, patterns: Vec<Regex>) {
        self.continuation_patterns = patterns;
    }

    /// Feed one raw fragment; returns the logical lines it completed
    pub fn feed<T>(&mut self, fragment: &str, terminators: &T) -> Vec<String>
    where
        T: BlockTerminators + ?Sized,
    {
        trace!("Reassembler fed {} bytes", fragment.len());
        let sentinel_len = self.line_terminator.len();

        // Earlier text holds no complete sentinel, only possibly its start
        let mut search_from = floor_char_boundary(
            &self.pending,
            self.pending.len().saturating_sub(sentinel_len - 1),
        );
        self.pending.push_str(fragment);

        let mut lines = Vec::new();
        let mut consumed = 0;
        loop {
            let found = self.pending[search_from..].find(self.line_terminator.as_str());
            let Some(offset) = found else {
                break;
            };
            let end = search_from + offset;
            let physical = self.pending[consumed..end].to_string();
            consumed = end + sentinel_len;
            search_from = consumed;

            let after_terminator = std::mem::take(&mut self.after_terminator);
            self.push_physical(physical, after_terminator, terminators, &mut lines);
        }
        if consumed > 0 {
            self.pending.drain(..consumed);
            self.scanned = 0;
        }

        if self.accept_unterminated {
            self.accept_partial_terminators(terminators, &mut lines);
        }

        if self.pending.len() >= self.max_pending_bytes {
            warn!(
                "No line terminator after {} bytes, flushing",
                self.pending.len()
            );
            let physical = std::mem::take(&mut self.pending);
            let after_terminator = std::mem::take(&mut self.after_terminator);
            self.scanned = 0;
            self.push_physical(physical, after_terminator, terminators, &mut lines);
            self.flush_block(&mut lines);
        }

        lines
    }

    /// Everything buffered but not yet returned, physical lines rejoined
    pub fn pending_text(&self) -> String {
        let mut text = self.block.join(&self.line_terminator);
        if !self.block.is_empty() {
            text.push_str(&self.line_terminator);
        }
        text.push_str(self.unfinished_line());
        text
    }

    /// Whether any input is buffered
    pub fn has_pending(&self) -> bool {
        !self.unfinished_line().is_empty() || !self.block.is_empty()
    }

    /// Number of physical lines waiting for a terminator
    pub fn pending_block_lines(&self) -> usize {
        self.block.len()
    }

    /// Discard all buffered input
    pub fn clear(&mut self) {
        self.pending.clear();
        self.scanned = 0;
        self.after_terminator = false;
        self.block.clear();
    }

    /// The unfinished line, without whitespace left over after a terminator
    fn unfinished_line(&self) -> &str {
        if self.after_terminator {
            self.pending.trim_start()
        } else {
            &self.pending
        }
    }

    fn push_physical<T>(
        &mut self,
        mut physical: String,
        after_terminator: bool,
        terminators: &T,
        out: &mut Vec<String>,
    ) where
        T: BlockTerminators + ?Sized,
    {
        if self.line_terminator == "\n" && physical.ends_with('\r') {
            physical.pop();
        }

        let mut line = if after_terminator {
            physical.trim_start()
        } else {
            physical.as_str()
        };

        if line.trim().is_empty() {
            if !after_terminator {
                self.flush_block(out);
            }
            return;
        }

        while let Some(len) = terminator_prefix(line, 0, terminators) {
            self.flush_block(out);
            push_logical(out, line[..len].to_string());
            line = line[len..].trim_start();
            if line.is_empty() {
                return;
            }
        }

        self.block.push(line.to_string());
        if self.block.len() >= self.max_block_lines {
            warn!(
                "No block terminator after {} lines, flushing",
                self.block.len()
            );
            self.flush_block(out);
        }
    }

    /// Complete the block on a terminator at the start of the unfinished line
    fn accept_partial_terminators<T>(&mut self, terminators: &T, out: &mut Vec<String>)
    where
        T: BlockTerminators + ?Sized,
    {
        loop {
            let end = self.pending.len() - self.undecided_suffix_len();
            let start = if self.after_terminator {
                self.pending.len() - self.pending.trim_start().len()
            } else {
                0
            };
            if end <= start {
                return;
            }

            let text = &self.pending[start..end];
            let Some(len) = terminator_prefix(text, self.scanned, terminators) else {
                self.scanned = text.len();
                return;
            };

            let terminator = text[..len].to_string();
            self.pending.drain(..start + len);
            self.scanned = 0;
            self.after_terminator = true;
            self.flush_block(out);
            push_logical(out, terminator);
        }
    }

    fn flush_block(&mut self, out: &mut Vec<String>) {
        let mut current: Option<String> = None;
        for physical in std::mem::take(&mut self.block) {
            current = Some(match current.take() {
                Some(mut acc) if self.continues(&acc) => {
                    acc.push_str(physical.trim_start());
                    acc
                }
                Some(acc) => {
                    push_logical(out, acc);
                    physical
                }
                None => physical,
            });
        }
        if let Some(acc) = current {
            push_logical(out, acc);
        }
    }

    fn continues(&self, line: &str) -> bool {
        self.continuation_patterns.iter().any(|r| r.is_match(line))
    }

    /// Length of the buffer tail that may still turn into a sentinel
    ///
    /// With the `"\n"` sentinel a trailing `'\r'` is also undecided, since it
    /// is stripped only when it ends the line.
    fn undecided_suffix_len(&self) -> usize {
        let partial = (1..self.line_terminator.len())
            .rev()
            .filter(|&n| self.line_terminator.is_char_boundary(n))
            .find(|&n| self.pending.ends_with(&self.line_terminator[..n]))
            .unwrap_or(0);

        if partial == 0 && self.line_terminator == "\n" && self.pending.ends_with('\r') {
            1
        } else {
            partial
        }
    }
}

/// Length of the shortest non-blank prefix of `text` matching a terminator
///
/// Prefixes up to `checked` bytes long are skipped.
fn terminator_prefix<T>(text: &str, checked: usize, terminators: &T) -> Option<usize>
where
    T: BlockTerminators + ?Sized,
{
    let limit = text.len().min(MAX_TERMINATOR_LEN);
    (checked + 1..=limit)
        .filter(|&len| text.is_char_boundary(len))
        .find(|&len| {
            let prefix = &text[..len];
            !prefix.trim().is_empty() && terminators.is_block_terminator(prefix)
        })
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn push_logical(out: &mut Vec<String>, line: String) {
    let trimmed = line.trim_end();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}
