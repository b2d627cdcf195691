pub mod accumulator;
pub mod archiver;
pub mod batch;
pub mod controller;
pub mod debounce;

pub use accumulator::BatchAccumulator;
pub use archiver::{ArchiveQueue, ArchiveSettings, ArchiveStats, ArchiveWriter};
pub use batch::FileBatch;
pub use controller::{PipelineController, PipelineError};
pub use debounce::DebounceRegister;
