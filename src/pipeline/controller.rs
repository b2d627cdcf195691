use crate::config::types::Config;
use crate::pipeline::accumulator::BatchAccumulator;
use crate::pipeline::archiver::{ArchiveSettings, ArchiveStats, ArchiveWriter};
use crate::pipeline::debounce::DebounceRegister;
use crate::sink::{LogSink, LogSinkExt};
use crate::source::scan::existing_files;
use crate::source::watcher::{watch, DirWatcher, NameFilter, WatchError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::parse::ConfigError),

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("watch error: {0}")]
    Watch(#[from] WatchError),

    #[error("initial scan failed: {0}")]
    Scan(#[from] std::io::Error),
}

/// Everything that only exists while the pipeline runs.
struct RunningPipeline {
    // Held for its Drop: unsubscribes the event source.
    _watcher: DirWatcher,
    debounce: Arc<DebounceRegister>,
    accumulator: Arc<BatchAccumulator>,
    writer: ArchiveWriter,
}

/// Owns the pipeline lifecycle: validates configuration, wires the watcher
/// through debounce and accumulation into the archive worker on `start`,
/// and unwinds the whole chain in order on `stop`.
pub struct PipelineController {
    config: Config,
    filter: NameFilter,
    sink: Arc<dyn LogSink>,
    running: Option<RunningPipeline>,
}

impl PipelineController {
    /// Validates `config` and prepares a stopped pipeline. Fails if either
    /// directory is missing, the batch size is zero, or the pattern does
    /// not compile.
    pub fn new(config: Config, sink: Arc<dyn LogSink>) -> Result<Self, PipelineError> {
        crate::config::parse::validate_config(&config)?;
        let filter = NameFilter::new(&config.source.pattern)?;
        Ok(Self {
            config,
            filter,
            sink,
            running: None,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Starts the archive worker, subscribes to the source directory, and
    /// unless `ignore_existing` feeds every already-present matching file
    /// straight into the accumulator (pre-existing files are assumed
    /// settled). A watcher or scan failure tears down everything already
    /// started before the error is returned.
    pub async fn start(&mut self) -> Result<(), PipelineError> {
        if self.running.is_some() {
            warn!("pipeline already running, start ignored");
            return Ok(());
        }

        let mut writer = ArchiveWriter::new(
            ArchiveSettings {
                dir: self.config.archive.dir.clone(),
                prefix: self.config.archive.prefix.clone(),
                sequence_offset: self.config.archive.sequence_offset,
            },
            Arc::clone(&self.sink),
        );
        let queue = writer.start();

        let debounce = Arc::new(DebounceRegister::new());
        let accumulator = Arc::new(BatchAccumulator::new(
            self.config.archive.batch_size,
            queue,
        ));

        let on_change = {
            let debounce = Arc::clone(&debounce);
            let accumulator = Arc::clone(&accumulator);
            let delay = self.config.debounce.delay;
            move |path: PathBuf| {
                debounce.record(path);
                for settled in debounce.drain(delay) {
                    if settled.is_file() {
                        accumulator.add(settled);
                    }
                }
            }
        };

        let watcher = match watch(
            &self.config.source.dir,
            self.config.source.recursive,
            self.filter.clone(),
            on_change,
        ) {
            Ok(watcher) => watcher,
            Err(e) => {
                self.sink.error("starting file system observer failed");
                writer.stop().await;
                return Err(e.into());
            }
        };
        self.sink.info("file system observer started");

        if !self.config.source.ignore_existing {
            let existing = match existing_files(
                &self.config.source.dir,
                self.config.source.recursive,
                &self.filter,
            ) {
                Ok(existing) => existing,
                Err(e) => {
                    self.sink.error("scanning existing files failed");
                    drop(watcher);
                    writer.stop().await;
                    return Err(e.into());
                }
            };
            let count = existing.len();
            for path in existing {
                accumulator.add(path);
            }
            self.sink
                .info(format!("included {} existing files", count));
        }

        self.running = Some(RunningPipeline {
            _watcher: watcher,
            debounce,
            accumulator,
            writer,
        });
        Ok(())
    }

    /// Unsubscribes from the source, force-releases every debounced path
    /// regardless of quiet time, flushes the partial batch, and waits for
    /// the worker to archive everything. Returns the worker's counters.
    pub async fn stop(&mut self) -> Result<ArchiveStats, PipelineError> {
        let Some(mut running) = self.running.take() else {
            warn!("pipeline not running, stop ignored");
            return Ok(ArchiveStats::default());
        };

        // Unsubscribe before draining so no event can re-register a path
        // we are about to release.
        drop(running._watcher);

        for path in running.debounce.drain(Duration::ZERO) {
            if path.is_file() {
                running.accumulator.add(path);
            }
        }
        running.accumulator.flush();

        let stats = running.writer.stop().await.unwrap_or_default();
        self.sink.info("file system observer stopped");
        info!(
            archives = stats.archives_written,
            files = stats.files_archived,
            failed = stats.batches_failed,
            collisions = stats.name_collisions,
            "pipeline stopped"
        );
        Ok(stats)
    }
}
