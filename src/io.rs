//! Loading raw acquisitions, batch orchestration and progress reporting.
//!
//! Decoding vendor formats is out of scope here; a decoder plugs in by
//! implementing [`RawFileSource`].
pub mod batch;
pub mod loader;
pub mod progress;

pub use batch::{run_batch, FileOutcome};
pub use loader::{load_with_retry, LoadError, MemoryRawFile, RawFileSource};
pub use progress::{AtomicProgress, NoProgress, ProgressSink};
