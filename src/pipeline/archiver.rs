use crate::pipeline::batch::FileBatch;
use crate::sink::{LogSink, LogSinkExt};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Items travelling from the accumulator to the worker. `Shutdown` is the
/// end-of-stream sentinel: the worker finishes every batch queued ahead of
/// it, then exits.
pub(crate) enum WorkItem {
    Batch(FileBatch),
    Shutdown,
}

/// Producer handle for the worker's queue. Cloneable; enqueueing never
/// blocks and never performs I/O.
#[derive(Clone)]
pub struct ArchiveQueue {
    tx: mpsc::UnboundedSender<WorkItem>,
}

impl ArchiveQueue {
    pub(crate) fn channel() -> (ArchiveQueue, mpsc::UnboundedReceiver<WorkItem>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ArchiveQueue { tx }, rx)
    }

    pub fn enqueue(&self, batch: FileBatch) {
        debug!(batch_id = %batch.batch_id, files = batch.len(), "batch queued for archiving");
        if self.tx.send(WorkItem::Batch(batch)).is_err() {
            // Worker already exited; nothing downstream can accept the batch.
            warn!("archive queue closed, batch dropped");
        }
    }

    fn send_shutdown(&self) {
        let _ = self.tx.send(WorkItem::Shutdown);
    }
}

/// Counters reported by the worker when it exits.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArchiveStats {
    pub archives_written: u64,
    pub files_archived: u64,
    pub batches_failed: u64,
    pub name_collisions: u64,
}

/// Settings the worker needs to name and place archives.
#[derive(Debug, Clone)]
pub struct ArchiveSettings {
    pub dir: PathBuf,
    pub prefix: String,
    pub sequence_offset: u64,
}

/// Owns the single background worker that turns batches into tar files.
///
/// Lifecycle: `start()` spawns the worker and returns the queue handle
/// (idempotent); `stop()` enqueues the sentinel and waits for the worker to
/// drain everything ahead of it. Archives are written strictly one at a
/// time, in batch order.
pub struct ArchiveWriter {
    settings: ArchiveSettings,
    sink: Arc<dyn LogSink>,
    queue: Option<ArchiveQueue>,
    worker: Option<JoinHandle<ArchiveStats>>,
}

impl ArchiveWriter {
    pub fn new(settings: ArchiveSettings, sink: Arc<dyn LogSink>) -> Self {
        Self {
            settings,
            sink,
            queue: None,
            worker: None,
        }
    }

    /// Spawns the worker if it is not already running and returns the
    /// producer handle to its queue.
    pub fn start(&mut self) -> ArchiveQueue {
        if let Some(queue) = &self.queue {
            return queue.clone();
        }

        let (queue, rx) = ArchiveQueue::channel();
        let settings = self.settings.clone();
        let sink = Arc::clone(&self.sink);
        self.worker = Some(tokio::task::spawn_blocking(move || {
            run_worker(rx, settings, sink)
        }));
        self.queue = Some(queue.clone());
        queue
    }

    /// Signals end-of-stream and waits for the worker to finish every batch
    /// enqueued before the call. Returns the worker's final counters, or
    /// `None` when the writer was never started.
    pub async fn stop(&mut self) -> Option<ArchiveStats> {
        let queue = self.queue.take()?;
        let worker = self.worker.take()?;

        queue.send_shutdown();
        match worker.await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(error = %e, "archive worker panicked");
                None
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

fn run_worker(
    mut rx: mpsc::UnboundedReceiver<WorkItem>,
    settings: ArchiveSettings,
    sink: Arc<dyn LogSink>,
) -> ArchiveStats {
    let mut stats = ArchiveStats::default();
    let mut sequence = settings.sequence_offset;

    while let Some(item) = rx.blocking_recv() {
        let batch = match item {
            WorkItem::Batch(batch) => batch,
            WorkItem::Shutdown => break,
        };

        let file_name = format!("{}{}.tar", settings.prefix, sequence);
        let dst = settings.dir.join(&file_name);

        if dst.is_file() {
            sink.error(format!(
                "archive {} already exists, skipped writing {} files",
                file_name,
                batch.len()
            ));
            stats.name_collisions += 1;
            // The colliding number is consumed, never reused, so a later
            // batch cannot silently land on the same ambiguous name.
            sequence += 1;
            continue;
        }

        match write_archive(&dst, &batch) {
            Ok(written) => {
                sink.info(format!("archived {} files as {}", written, file_name));
                stats.archives_written += 1;
                stats.files_archived += written as u64;
            }
            Err(e) => {
                sink.error(format!("failed to write archive {}: {}", file_name, e));
                stats.batches_failed += 1;
            }
        }
        sequence += 1;
    }

    stats
}

/// Serializes a batch into a new tar file at `dst`. Entries are stored under
/// their base names. Paths that vanished since they settled are omitted;
/// returns the number of entries actually written.
fn write_archive(dst: &Path, batch: &FileBatch) -> io::Result<usize> {
    let file = OpenOptions::new().write(true).create_new(true).open(dst)?;
    let mut builder = tar::Builder::new(file);
    let mut written = 0;

    for path in &batch.paths {
        let name = match path.file_name() {
            Some(name) => name.to_owned(),
            None => continue,
        };
        let mut source = match File::open(path) {
            Ok(source) => source,
            // Deleted between settling and archiving. Expected race with a
            // live producer; skip the entry.
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        builder.append_file(Path::new(&name), &mut source)?;
        written += 1;
    }

    builder.finish()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{Level, MemorySink};
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    fn settings(dir: &Path, prefix: &str, offset: u64) -> ArchiveSettings {
        ArchiveSettings {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
            sequence_offset: offset,
        }
    }

    fn make_source_files(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                fs::write(&path, format!("contents of {}", name)).unwrap();
                path
            })
            .collect()
    }

    fn tar_entry_names(path: &Path) -> Vec<String> {
        let mut archive = tar::Archive::new(File::open(path).unwrap());
        archive
            .entries()
            .unwrap()
            .map(|e| {
                e.unwrap()
                    .path()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_writes_batches_in_order_with_increasing_sequence() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let sink = Arc::new(MemorySink::new());

        let mut writer = ArchiveWriter::new(settings(dst.path(), "", 0), sink.clone());
        let queue = writer.start();

        let first = make_source_files(src.path(), &["a.csv", "b.csv"]);
        let second = make_source_files(src.path(), &["c.csv"]);
        queue.enqueue(FileBatch::new(first));
        queue.enqueue(FileBatch::new(second));

        let stats = writer.stop().await.unwrap();
        assert_eq!(stats.archives_written, 2);
        assert_eq!(stats.files_archived, 3);
        assert_eq!(stats.batches_failed, 0);

        assert_eq!(
            tar_entry_names(&dst.path().join("0.tar")),
            vec!["a.csv", "b.csv"]
        );
        assert_eq!(tar_entry_names(&dst.path().join("1.tar")), vec!["c.csv"]);
        assert!(!dst.path().join("2.tar").exists());
    }

    #[tokio::test]
    async fn test_prefix_and_offset_shape_archive_names() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let sink = Arc::new(MemorySink::new());

        let mut writer = ArchiveWriter::new(settings(dst.path(), "run_", 5), sink);
        let queue = writer.start();
        queue.enqueue(FileBatch::new(make_source_files(src.path(), &["x.csv"])));

        writer.stop().await.unwrap();
        assert!(dst.path().join("run_5.tar").is_file());
    }

    #[tokio::test]
    async fn test_collision_skips_batch_and_consumes_sequence() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let sink = Arc::new(MemorySink::new());

        // Occupy the first name in the series.
        fs::write(dst.path().join("pre0.tar"), b"already here").unwrap();

        let mut writer = ArchiveWriter::new(settings(dst.path(), "pre", 0), sink.clone());
        let queue = writer.start();
        queue.enqueue(FileBatch::new(make_source_files(src.path(), &["a.csv"])));
        queue.enqueue(FileBatch::new(make_source_files(src.path(), &["b.csv"])));

        let stats = writer.stop().await.unwrap();
        assert_eq!(stats.name_collisions, 1);
        assert_eq!(stats.archives_written, 1);

        // The occupied archive is untouched and the second batch moved on
        // to the next number.
        assert_eq!(fs::read(dst.path().join("pre0.tar")).unwrap(), b"already here");
        assert_eq!(tar_entry_names(&dst.path().join("pre1.tar")), vec!["b.csv"]);

        let errors = sink.messages_at(Level::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("pre0.tar"));
    }

    #[tokio::test]
    async fn test_vanished_file_is_omitted_without_error() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let sink = Arc::new(MemorySink::new());

        let paths = make_source_files(src.path(), &["kept.csv", "gone.csv"]);
        fs::remove_file(&paths[1]).unwrap();

        let mut writer = ArchiveWriter::new(settings(dst.path(), "", 0), sink.clone());
        let queue = writer.start();
        queue.enqueue(FileBatch::new(paths));

        let stats = writer.stop().await.unwrap();
        assert_eq!(stats.archives_written, 1);
        assert_eq!(stats.files_archived, 1);
        assert!(sink.messages_at(Level::Error).is_empty());

        assert_eq!(tar_entry_names(&dst.path().join("0.tar")), vec!["kept.csv"]);
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_stop_the_worker() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let sink = Arc::new(MemorySink::new());

        // A directory in the batch survives the open() but fails the copy,
        // failing the whole batch.
        let bad_dir = src.path().join("not_a_file.csv");
        fs::create_dir(&bad_dir).unwrap();

        let mut writer = ArchiveWriter::new(settings(dst.path(), "", 0), sink.clone());
        let queue = writer.start();
        queue.enqueue(FileBatch::new(vec![bad_dir]));
        queue.enqueue(FileBatch::new(make_source_files(src.path(), &["ok.csv"])));

        let stats = writer.stop().await.unwrap();
        assert_eq!(stats.batches_failed, 1);
        assert_eq!(stats.archives_written, 1);

        // The failed batch consumed sequence 0; the good one landed on 1.
        assert_eq!(tar_entry_names(&dst.path().join("1.tar")), vec!["ok.csv"]);
        assert_eq!(sink.messages_at(Level::Error).len(), 1);
    }

    #[tokio::test]
    async fn test_start_twice_is_a_no_op() {
        let dst = TempDir::new().unwrap();
        let sink = Arc::new(MemorySink::new());

        let mut writer = ArchiveWriter::new(settings(dst.path(), "", 0), sink);
        let first = writer.start();
        let second = writer.start();
        assert!(writer.is_running());

        // Both handles feed the same worker.
        drop((first, second));
        writer.stop().await.unwrap();
        assert!(!writer.is_running());
    }

    #[tokio::test]
    async fn test_stop_without_start_is_a_no_op() {
        let dst = TempDir::new().unwrap();
        let sink = Arc::new(MemorySink::new());
        let mut writer = ArchiveWriter::new(settings(dst.path(), "", 0), sink);
        assert!(writer.stop().await.is_none());
    }

    #[tokio::test]
    async fn test_archive_entries_carry_file_contents() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let sink = Arc::new(MemorySink::new());

        let mut writer = ArchiveWriter::new(settings(dst.path(), "", 0), sink);
        let queue = writer.start();
        queue.enqueue(FileBatch::new(make_source_files(src.path(), &["r.csv"])));
        writer.stop().await.unwrap();

        let mut archive = tar::Archive::new(File::open(dst.path().join("0.tar")).unwrap());
        let mut entry = archive.entries().unwrap().next().unwrap().unwrap();
        let mut contents = String::new();
        entry.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "contents of r.csv");
    }
}
