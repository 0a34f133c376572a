//! Pattern Store
//!
//! Ordered, mutable registry of classification rules. Position in the store
//! is match priority: [`PatternStore::find`] returns the id of the first
//! enabled entry whose regex matches, regardless of numeric id.
//!
//! The store is shared between the parser and whatever edits it (the pattern
//! file watcher, an external editor) through [`SharedPatternStore`]. Entries
//! are only ever replaced in place or appended, never removed.

pub mod builtin;
pub mod file;
pub mod watcher;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::parser::reassembler::BlockTerminators;

/// Ids at or above this value are user-authored by convention
pub const USER_PATTERN_ID_BASE: i32 = 20000;

fn default_enabled() -> bool {
    true
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Persisted form of a single rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRecord {
    /// Rule id, mapped to an event kind by the parser
    pub id: i32,
    /// Unanchored regular expression
    pub pattern: String,
    /// Free-form description shown in editors
    #[serde(default)]
    pub comment: String,
    /// Disabled rules are kept but never match
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Whether a matching line completes a reassembly block
    #[serde(default, skip_serializing_if = "is_false")]
    pub terminates_block: bool,
}

impl PatternRecord {
    /// Create an enabled record with an empty comment
    pub fn new(id: i32, pattern: impl Into<String>) -> Self {
        Self {
            id,
            pattern: pattern.into(),
            comment: String::new(),
            enabled: true,
            terminates_block: false,
        }
    }
}

/// A rule with its compiled regex
///
/// Pattern text that fails to compile leaves the entry in place with no
/// regex; such an entry never matches.
#[derive(Debug, Clone)]
pub struct PatternEntry {
    record: PatternRecord,
    regex: Option<Regex>,
}

impl PatternEntry {
    /// Create an enabled entry
    pub fn new(id: i32, pattern: impl Into<String>) -> Self {
        Self::from_record(PatternRecord::new(id, pattern))
    }

    /// Compile a persisted record
    pub fn from_record(record: PatternRecord) -> Self {
        let regex = match Regex::new(&record.pattern) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!(
                    "Pattern {} '{}' does not compile and will never match: {}",
                    record.id, record.pattern, e
                );
                None
            }
        };
        Self { record, regex }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.record.comment = comment.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.record.enabled = enabled;
        self
    }

    /// Mark the entry as a block terminator
    pub fn terminating_block(mut self) -> Self {
        self.record.terminates_block = true;
        self
    }

    pub fn id(&self) -> i32 {
        self.record.id
    }

    pub fn pattern(&self) -> &str {
        &self.record.pattern
    }

    pub fn comment(&self) -> &str {
        &self.record.comment
    }

    pub fn is_enabled(&self) -> bool {
        self.record.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.record.enabled = enabled;
    }

    pub fn terminates_block(&self) -> bool {
        self.record.terminates_block
    }

    /// Whether the pattern text compiled
    pub fn is_valid(&self) -> bool {
        self.regex.is_some()
    }

    /// Whether the id falls in the user-authored range
    pub fn is_user_defined(&self) -> bool {
        self.record.id >= USER_PATTERN_ID_BASE
    }

    /// Match against a logical line; disabled and invalid entries never match
    #[inline]
    pub fn is_match(&self, text: &str) -> bool {
        self.record.enabled && self.regex.as_ref().is_some_and(|r| r.is_match(text))
    }

    pub fn record(&self) -> &PatternRecord {
        &self.record
    }

    pub fn into_record(self) -> PatternRecord {
        self.record
    }
}

impl PartialEq for PatternEntry {
    fn eq(&self, other: &Self) -> bool {
        self.record == other.record
    }
}

impl From<PatternRecord> for PatternEntry {
    fn from(record: PatternRecord) -> Self {
        Self::from_record(record)
    }
}

/// Ordered registry of classification rules
#[derive(Debug, Clone, Default)]
pub struct PatternStore {
    entries: Vec<PatternEntry>,
}

impl PatternStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the built-in debugger console rules
    pub fn with_builtin() -> Self {
        Self::from_records(builtin::builtin_records())
    }

    /// Build a store from persisted records, keeping their order
    pub fn from_records(records: impl IntoIterator<Item = PatternRecord>) -> Self {
        Self {
            entries: records.into_iter().map(PatternEntry::from_record).collect(),
        }
    }

    /// Live ordered view of all entries, disabled ones included
    pub fn get(&self) -> &[PatternEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a rule at the lowest priority; returns its index
    pub fn append(&mut self, pattern: &str, id: i32, terminates_block: bool) -> usize {
        let mut entry = PatternEntry::new(id, pattern);
        if terminates_block {
            entry = entry.terminating_block();
        }
        self.push(entry)
    }

    /// Append a prepared entry; returns its index
    pub fn push(&mut self, entry: PatternEntry) -> usize {
        debug!("Appending pattern {} '{}'", entry.id(), entry.pattern());
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Replace the entry at `index` without touching any other position
    pub fn replace_at(&mut self, index: usize, entry: PatternEntry) -> Result<()> {
        let len = self.entries.len();
        let slot = self
            .entries
            .get_mut(index)
            .ok_or(Error::PatternIndexOutOfRange { index, len })?;
        debug!(
            "Replacing pattern at {}: {} '{}' -> {} '{}'",
            index,
            slot.id(),
            slot.pattern(),
            entry.id(),
            entry.pattern()
        );
        *slot = entry;
        Ok(())
    }

    /// Toggle the entry at `index`
    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> Result<()> {
        let len = self.entries.len();
        let slot = self
            .entries
            .get_mut(index)
            .ok_or(Error::PatternIndexOutOfRange { index, len })?;
        slot.set_enabled(enabled);
        Ok(())
    }

    /// Id of the first enabled entry matching `text`, in registration order
    pub fn find(&self, text: &str) -> Option<i32> {
        self.find_entry(text).map(PatternEntry::id)
    }

    /// First enabled entry matching `text`
    pub fn find_entry(&self, text: &str) -> Option<&PatternEntry> {
        self.entries.iter().find(|entry| entry.is_match(text))
    }

    /// Pattern texts of the enabled block terminators, in order
    pub fn block_terminator_patterns(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.terminates_block() && entry.is_enabled())
            .map(|entry| entry.pattern().to_string())
            .collect()
    }

    /// Persisted form of every entry, in order
    pub fn records(&self) -> Vec<PatternRecord> {
        self.entries.iter().map(|e| e.record().clone()).collect()
    }
}

impl BlockTerminators for PatternStore {
    fn is_block_terminator(&self, line: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.terminates_block() && entry.is_match(line))
    }
}

/// Shared handle to a [`PatternStore`]
///
/// Each read or write takes the lock for a single operation, so an edit is
/// atomic at the granularity of one record.
#[derive(Debug, Clone, Default)]
pub struct SharedPatternStore {
    inner: Arc<RwLock<PatternStore>>,
}

impl SharedPatternStore {
    pub fn new(store: PatternStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Shared handle to the built-in rule table
    pub fn with_builtin() -> Self {
        Self::new(PatternStore::with_builtin())
    }

    /// Read access to the live store
    pub fn read(&self) -> RwLockReadGuard<'_, PatternStore> {
        // A panicked writer leaves a fully assigned record behind, so the
        // data is still usable.
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access to the live store
    pub fn write(&self) -> RwLockWriteGuard<'_, PatternStore> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn find(&self, text: &str) -> Option<i32> {
        self.read().find(text)
    }

    pub fn append(&self, pattern: &str, id: i32, terminates_block: bool) -> usize {
        self.write().append(pattern, id, terminates_block)
    }

    pub fn replace_at(&self, index: usize, entry: PatternEntry) -> Result<()> {
        self.write().replace_at(index, entry)
    }

    pub fn set_enabled(&self, index: usize, enabled: bool) -> Result<()> {
        self.write().set_enabled(index, enabled)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn records(&self) -> Vec<PatternRecord> {
        self.read().records()
    }
}

impl From<PatternStore> for SharedPatternStore {
    fn from(store: PatternStore) -> Self {
        Self::new(store)
    }
}
