use std::path::PathBuf;
use uuid::Uuid;

/// A sealed group of settled files awaiting archiving.
///
/// Paths keep the order they were accumulated in. Once sealed the batch is
/// never mutated; ownership moves to the archive queue and then the worker.
#[derive(Debug, Clone)]
pub struct FileBatch {
    /// Identifies the batch in log output across the hand-off boundary.
    pub batch_id: Uuid,

    pub paths: Vec<PathBuf>,
}

impl FileBatch {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            paths,
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
