use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "parallelism")]
use rayon::prelude::*;

use super::loader::{load_with_retry, LoadError, RawFileSource};
use super::progress::{percent_of, ProgressSink};
use crate::params::RetryPolicy;
use crate::spectrum::SpectralStore;

/// The result of processing one file of a batch
#[derive(Debug)]
pub struct FileOutcome<T> {
    pub file_id: usize,
    pub name: String,
    pub result: Result<T, LoadError>,
}

impl<T> FileOutcome<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

fn process_one<S, T, F>(
    file_id: usize,
    source: &mut S,
    policy: &RetryPolicy,
    process: &F,
) -> FileOutcome<T>
where
    S: RawFileSource,
    F: Fn(usize, SpectralStore) -> Result<T, LoadError>,
{
    let result = load_with_retry(source, policy).and_then(|store| process(file_id, store));
    if let Err(e) = &result {
        log::error!("Failed to process {} (file {file_id}): {e}", source.name());
    }
    FileOutcome {
        file_id,
        name: source.name().to_string(),
        result,
    }
}

/// Load and process every file in `sources`.
///
/// Each file is loaded with `policy` and handed to `process` together with its
/// file id, its position in `sources`. A file that fails is logged and reported
/// in its outcome; the rest of the batch carries on. Outcomes are returned in
/// file order, and `progress` is told the completed share after each file.
/// Files are processed in parallel with the `parallelism` feature.
pub fn run_batch<S, T, F, P>(
    sources: &mut [S],
    policy: &RetryPolicy,
    progress: &P,
    process: F,
) -> Vec<FileOutcome<T>>
where
    S: RawFileSource + Send,
    T: Send,
    F: Fn(usize, SpectralStore) -> Result<T, LoadError> + Sync,
    P: ProgressSink + ?Sized,
{
    let total = sources.len();
    let done = AtomicUsize::new(0);
    let step = |file_id: usize, source: &mut S| {
        let outcome = process_one(file_id, source, policy, &process);
        let finished = done.fetch_add(1, Ordering::AcqRel) + 1;
        progress.report(percent_of(finished, total));
        outcome
    };

    #[cfg(feature = "parallelism")]
    let outcomes: Vec<FileOutcome<T>> = sources
        .par_iter_mut()
        .enumerate()
        .map(|(file_id, source)| step(file_id, source))
        .collect();

    #[cfg(not(feature = "parallelism"))]
    let outcomes: Vec<FileOutcome<T>> = sources
        .iter_mut()
        .enumerate()
        .map(|(file_id, source)| step(file_id, source))
        .collect();

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        log::warn!("{failed} of {total} files failed to process");
    }
    outcomes
}
