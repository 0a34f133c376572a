//! Pattern File Watcher
//!
//! Watches the pattern table file and applies edits to a live
//! [`SharedPatternStore`]. A changed file is applied record by record:
//! existing positions are replaced in place, extra records are appended and
//! positions the file no longer has are disabled. Entries are never removed,
//! so indices held by an editor stay valid.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::{file, PatternEntry, PatternRecord, SharedPatternStore};
use crate::error::{Error, Result};

/// Interval between checks in [`PatternFileWatcher::start_background_watch`]
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Pattern table file watcher
pub struct PatternFileWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
    event_rx: Receiver<notify::Result<Event>>,
    store: SharedPatternStore,
    is_watching: Arc<AtomicBool>,
}

impl PatternFileWatcher {
    /// Start watching `path`, applying changes to `store`
    ///
    /// The parent directory is watched, since editors often replace the file
    /// rather than write it in place.
    pub fn new(path: PathBuf, store: SharedPatternStore) -> Result<Self> {
        let (event_tx, event_rx) = channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            if let Err(e) = event_tx.send(res) {
                error!("Failed to send file watch event: {}", e);
            }
        })
        .map_err(|e| Error::PatternWatchFailed {
            reason: format!("Failed to create watcher: {}", e),
        })?;

        let watch_path = path.parent().ok_or_else(|| Error::PatternWatchFailed {
            reason: "Pattern file has no parent directory".to_string(),
        })?;

        watcher
            .watch(watch_path, RecursiveMode::NonRecursive)
            .map_err(|e| Error::PatternWatchFailed {
                reason: format!("Failed to watch directory: {}", e),
            })?;

        info!("Started watching pattern file: {}", path.display());

        Ok(Self {
            path,
            _watcher: watcher,
            event_rx,
            store,
            is_watching: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Drain pending file events and reapply the file if it changed
    ///
    /// Returns whether the file was reapplied.
    pub fn check_and_reload(&mut self) -> Result<bool> {
        let mut changed = false;
        loop {
            match self.event_rx.try_recv() {
                Ok(Ok(event)) => {
                    if self.is_pattern_file_event(&event) {
                        debug!("Pattern file change detected: {:?}", event.kind);
                        changed = true;
                    }
                }
                Ok(Err(e)) => error!("File watch error: {}", e),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    error!("File watch channel disconnected");
                    self.is_watching.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }

        if !changed || !self.path.exists() {
            return Ok(false);
        }

        let updated = self.apply_file()?;
        info!("Pattern file reloaded, {} entries updated", updated);
        Ok(true)
    }

    /// Read the file and apply it to the store; returns changed positions
    pub fn apply_file(&self) -> Result<usize> {
        let records = file::read_records(&self.path)?;
        Ok(apply_records(&self.store, records))
    }

    fn is_pattern_file_event(&self, event: &Event) -> bool {
        event.paths.iter().any(|p| {
            p.file_name() == self.path.file_name()
                && p.canonicalize()
                    .ok()
                    .zip(self.path.canonicalize().ok())
                    .is_some_and(|(a, b)| a == b)
        })
    }

    /// Poll for changes on a tokio task until stopped
    pub fn start_background_watch(
        path: PathBuf,
        store: SharedPatternStore,
    ) -> Result<(Arc<AtomicBool>, tokio::task::JoinHandle<()>)> {
        let mut watcher = Self::new(path, store)?;
        let flag = watcher.is_watching.clone();

        let handle = tokio::spawn(async move {
            while watcher.is_watching() {
                if let Err(e) = watcher.check_and_reload() {
                    warn!("Failed to reload pattern file: {}", e);
                }
                sleep(POLL_INTERVAL).await;
            }
            info!("Pattern watcher stopped");
        });

        Ok((flag, handle))
    }

    pub fn stop(&self) {
        self.is_watching.store(false, Ordering::SeqCst);
    }

    pub fn is_watching(&self) -> bool {
        self.is_watching.load(Ordering::SeqCst)
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

/// Apply a full table to the live store without removing entries
///
/// Returns the number of positions that changed.
pub fn apply_records(store: &SharedPatternStore, records: Vec<PatternRecord>) -> usize {
    let mut guard = store.write();
    let incoming = records.len();
    let mut changed = 0;

    for (index, record) in records.into_iter().enumerate() {
        let unchanged = guard.get().get(index).map(|e| e.record() == &record);
        match unchanged {
            Some(true) => {}
            Some(false) => {
                if guard.replace_at(index, PatternEntry::from_record(record)).is_ok() {
                    changed += 1;
                }
            }
            None => {
                guard.push(PatternEntry::from_record(record));
                changed += 1;
            }
        }
    }

    for index in incoming..guard.len() {
        if guard.get()[index].is_enabled() && guard.set_enabled(index, false).is_ok() {
            debug!("Disabling pattern at {}, no longer in file", index);
            changed += 1;
        }
    }

    changed
}
