use crate::pipeline::archiver::ArchiveQueue;
use crate::pipeline::batch::FileBatch;
use std::mem;
use std::path::PathBuf;
use std::sync::Mutex;

/// Collects settled paths into fixed-size batches.
///
/// The open batch lives behind a mutex; sealing it and handing it to the
/// archive queue happens under the same lock as the triggering `add`, so
/// concurrent producers can neither lose a path across the hand-off nor
/// land one in two batches.
pub struct BatchAccumulator {
    capacity: usize,
    open: Mutex<Vec<PathBuf>>,
    queue: ArchiveQueue,
}

impl BatchAccumulator {
    pub fn new(capacity: usize, queue: ArchiveQueue) -> Self {
        Self {
            capacity,
            open: Mutex::new(Vec::with_capacity(capacity)),
            queue,
        }
    }

    /// Appends a path to the open batch, sealing and handing it off the
    /// moment it reaches capacity. Never blocks on archiving I/O.
    pub fn add(&self, path: PathBuf) {
        let mut open = self.open.lock().expect("accumulator lock poisoned");
        open.push(path);
        if open.len() >= self.capacity {
            let sealed = mem::replace(&mut *open, Vec::with_capacity(self.capacity));
            self.queue.enqueue(FileBatch::new(sealed));
        }
    }

    /// Seals and hands off the open batch even if it is not full. A no-op
    /// when nothing has accumulated.
    pub fn flush(&self) {
        let mut open = self.open.lock().expect("accumulator lock poisoned");
        if open.is_empty() {
            return;
        }
        let sealed = mem::take(&mut *open);
        self.queue.enqueue(FileBatch::new(sealed));
    }

    /// Number of paths waiting in the open batch.
    pub fn pending(&self) -> usize {
        self.open.lock().expect("accumulator lock poisoned").len()
    }
}
