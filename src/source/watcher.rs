use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// Matches candidate files by name. The full path is never inspected, so a
/// recursive watch treats `a/x.csv` and `b/x.csv` the same way.
#[derive(Debug, Clone)]
pub struct NameFilter {
    regex: Regex,
}

impl NameFilter {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        match path.file_name() {
            Some(name) => self.regex.is_match(&name.to_string_lossy()),
            None => false,
        }
    }
}

/// Keeps the underlying filesystem subscription alive. Dropping it
/// unsubscribes; no further callbacks are delivered.
pub struct DirWatcher {
    _watcher: RecommendedWatcher,
}

/// Subscribes to change notifications under `root` and invokes `on_path`
/// with each created or modified regular file whose name matches `filter`.
///
/// Rename, remove, access, and directory events never reach the callback.
/// The callback runs on the watcher's own thread and may be invoked
/// concurrently with the caller.
pub fn watch(
    root: &Path,
    recursive: bool,
    filter: NameFilter,
    on_path: impl Fn(PathBuf) + Send + 'static,
) -> Result<DirWatcher, WatchError> {
    let handler = move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if !is_file_change(&event.kind) {
                return;
            }
            for path in event.paths {
                if filter.matches(&path) && path.is_file() {
                    on_path(path);
                }
            }
        }
        Err(err) => warn!(error = %err, "filesystem watcher error"),
    };

    let mut watcher = notify::recommended_watcher(handler)?;
    let mode = if recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    watcher.watch(root, mode)?;

    Ok(DirWatcher { _watcher: watcher })
}

/// Creations and content/metadata modifications count; renames do not, so a
/// file moved into place is picked up by the create half of the move only.
fn is_file_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(
                ModifyKind::Data(_) | ModifyKind::Metadata(_) | ModifyKind::Any | ModifyKind::Other
            )
    )
}
