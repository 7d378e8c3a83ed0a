use std::io;
use std::thread;

use thiserror::Error;

use crate::params::RetryPolicy;
use crate::spectrum::{Scan, SpectralStore};

/// Errors that may occur when loading an acquisition from a raw file
#[derive(Debug, Error)]
pub enum LoadError {
    /// The raw file exists but cannot be read yet, e.g. while it is still being
    /// written or a vendor reader is warming up. Loading may be retried.
    #[error("The raw file {0} is not ready to be read")]
    NotReady(String),
    /// The acquisition could be read but makes no sense as a scan sequence
    #[error("The raw file {name} is malformed: {reason}")]
    Malformed { name: String, reason: String },
    /// An I/O error prevented reading the raw file
    #[error("I/O error occurred while reading: {0}")]
    Io(#[from] io::Error),
    /// The raw file stayed not-ready for every permitted attempt
    #[error("The raw file {name} was still not ready after {attempts} attempts")]
    RetriesExhausted { name: String, attempts: u32 },
}

impl LoadError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NotReady(_))
    }
}

/// A source of decoded scans for one analytical file.
///
/// Decoding the vendor format is left to implementors. Any handle opened by
/// [`load`](RawFileSource::load) must be released before it returns, on the
/// error path as well, so every attempt starts from a fresh handle.
pub trait RawFileSource {
    /// A name for the file, used in log messages and errors
    fn name(&self) -> &str;

    /// Read the whole acquisition into a spectral store
    fn load(&mut self) -> Result<SpectralStore, LoadError>;
}

impl<T: RawFileSource + ?Sized> RawFileSource for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn load(&mut self) -> Result<SpectralStore, LoadError> {
        (**self).load()
    }
}

/// Load `source`, retrying transient failures with a fixed pause.
///
/// Only [`LoadError::NotReady`] is retried. Once `policy.max_attempts` attempts
/// have failed this way the load fails with [`LoadError::RetriesExhausted`]
/// rather than returning an empty store.
pub fn load_with_retry<S: RawFileSource + ?Sized>(
    source: &mut S,
    policy: &RetryPolicy,
) -> Result<SpectralStore, LoadError> {
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        match source.load() {
            Ok(store) => {
                if attempt > 1 {
                    log::debug!("Loaded {} on attempt {attempt}", source.name());
                }
                return Ok(store);
            }
            Err(e) if e.is_transient() => {
                log::warn!(
                    "{} is not ready (attempt {attempt} of {attempts})",
                    source.name()
                );
                if attempt < attempts {
                    thread::sleep(policy.delay);
                }
            }
            Err(e) => return Err(e),
        }
    }
    log::error!("Giving up on {} after {attempts} attempts", source.name());
    Err(LoadError::RetriesExhausted {
        name: source.name().to_string(),
        attempts,
    })
}

/// An acquisition that is already decoded and held in memory.
///
/// It can be told to report itself as not ready for a number of loads first,
/// which mimics a file that is still being written.
#[derive(Debug, Clone, Default)]
pub struct MemoryRawFile {
    name: String,
    scans: Vec<Scan>,
    frames: Option<Vec<Scan>>,
    not_ready_for: u32,
    loads: u32,
}

impl MemoryRawFile {
    pub fn new(name: impl Into<String>, scans: Vec<Scan>) -> Self {
        Self {
            name: name.into(),
            scans,
            ..Default::default()
        }
    }

    pub fn with_frames(mut self, frames: Vec<Scan>) -> Self {
        self.frames = Some(frames);
        self
    }

    pub fn not_ready_for(mut self, loads: u32) -> Self {
        self.not_ready_for = loads;
        self
    }

    /// The number of times [`RawFileSource::load`] has been called
    pub fn loads(&self) -> u32 {
        self.loads
    }
}

impl RawFileSource for MemoryRawFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&mut self) -> Result<SpectralStore, LoadError> {
        self.loads += 1;
        if self.loads <= self.not_ready_for {
            return Err(LoadError::NotReady(self.name.clone()));
        }
        let store = SpectralStore::new(self.scans.clone());
        Ok(match &self.frames {
            Some(frames) => store.with_frames(frames.clone()),
            None => store,
        })
    }
}
