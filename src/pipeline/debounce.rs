use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Tracks when each candidate file was last reported changed.
///
/// A flat map rather than a queue: repeated notifications for one path
/// coalesce to the most recent touch, so a file being rewritten in a burst
/// is released exactly once, after the burst ends.
#[derive(Debug, Default)]
pub struct DebounceRegister {
    entries: Mutex<HashMap<PathBuf, Instant>>,
}

impl DebounceRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `path` as changed now. Safe to call from any thread.
    pub fn record(&self, path: PathBuf) {
        self.record_at(path, Instant::now());
    }

    /// Removes and returns every path that has been quiet for at least
    /// `min_quiet` as of the call. Paths still inside their quiet window
    /// stay registered for a later drain. `Duration::ZERO` releases
    /// everything.
    pub fn drain(&self, min_quiet: Duration) -> Vec<PathBuf> {
        self.drain_at(min_quiet, Instant::now())
    }

    fn record_at(&self, path: PathBuf, now: Instant) {
        let mut entries = self.entries.lock().expect("debounce lock poisoned");
        entries.insert(path, now);
    }

    fn drain_at(&self, min_quiet: Duration, now: Instant) -> Vec<PathBuf> {
        let mut entries = self.entries.lock().expect("debounce lock poisoned");
        let quiet: Vec<PathBuf> = entries
            .iter()
            .filter(|(_, last_seen)| now.duration_since(**last_seen) >= min_quiet)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &quiet {
            entries.remove(path);
        }
        quiet
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("debounce lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
