//! The ordered scan store and the per-scan operations built on top of it.
//!
//! A [`SpectralStore`] owns the scans of one acquisition in time order. Lookups
//! by time, drift time and m/z go through the bounded searches in [`search`],
//! which return hints that callers confirm linearly.
pub mod accumulate;
pub mod centroid;
pub mod cycle;
pub mod scan;
pub mod scan_properties;
pub mod search;
pub mod store;

pub use accumulate::{accumulate_spectrum, SpectrumAccumulator};
pub use centroid::{centroid, isotope_window, isotopic_peaks, IsotopicPeak};
pub use cycle::{AcquisitionCycle, LaneKind, UNMAPPED_LANE};
pub use scan::{drift_bin, Scan};
pub use scan_properties::{PrecursorWindow, ScanPolarity, SignalContinuity};
pub use search::{first_peak_at_or_above, index_at_or_before_mz};
pub use store::SpectralStore;
