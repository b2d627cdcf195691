pub mod scan;
pub mod watcher;

pub use scan::existing_files;
pub use watcher::{watch, DirWatcher, NameFilter, WatchError};
