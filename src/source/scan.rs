use super::watcher::NameFilter;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lists the regular files under `root` whose names match `filter`,
/// descending into subdirectories only when `recursive` is set. The result
/// is sorted so downstream batch contents are deterministic.
pub fn existing_files(
    root: &Path,
    recursive: bool,
    filter: &NameFilter,
) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if recursive {
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file() && filter.matches(entry.path()) {
                files.push(entry.into_path());
            }
        }
    } else {
        for entry in root.read_dir()? {
            let entry = entry?;
            if entry.file_type()?.is_file() && filter.matches(&entry.path()) {
                files.push(entry.path());
            }
        }
    }

    files.sort();
    Ok(files)
}
