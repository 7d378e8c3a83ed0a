use mzpeaks::CentroidPeak;

use super::scan_properties::{PrecursorWindow, ScanPolarity, SignalContinuity};

/// The multiplier applied to drift times before rounding them into integer bins
pub const DRIFT_BIN_FACTOR: f64 = 1000.0;

/// Map a drift time onto its integer bin, `round(drift_time * 1000)`
#[inline]
pub fn drift_bin(drift_time: f64) -> i64 {
    (drift_time * DRIFT_BIN_FACTOR).round() as i64
}

/// A single acquired scan.
///
/// A scan never changes after it is built. Its peaks are always sorted by m/z,
/// which the constructor guarantees regardless of the order they arrive in.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scan {
    index: usize,
    ms_level: u8,
    polarity: ScanPolarity,
    time: f64,
    drift_time: Option<f64>,
    precursor: Option<PrecursorWindow>,
    signal_continuity: SignalContinuity,
    peaks: Vec<CentroidPeak>,
}

impl Scan {
    pub fn new(
        index: usize,
        ms_level: u8,
        polarity: ScanPolarity,
        time: f64,
        mut peaks: Vec<CentroidPeak>,
    ) -> Self {
        peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));
        Self {
            index,
            ms_level,
            polarity,
            time,
            drift_time: None,
            precursor: None,
            signal_continuity: SignalContinuity::Centroid,
            peaks,
        }
    }

    /// Build a scan from parallel m/z and intensity arrays, as decoders emit them.
    pub fn from_arrays(
        index: usize,
        ms_level: u8,
        polarity: ScanPolarity,
        time: f64,
        mzs: &[f64],
        intensities: &[f32],
    ) -> Self {
        let peaks = mzs
            .iter()
            .zip(intensities.iter())
            .enumerate()
            .map(|(i, (mz, inten))| CentroidPeak::new(*mz, *inten, i as mzpeaks::IndexType))
            .collect();
        Self::new(index, ms_level, polarity, time, peaks)
    }

    pub fn with_drift_time(mut self, drift_time: f64) -> Self {
        self.drift_time = Some(drift_time);
        self
    }

    pub fn with_precursor(mut self, precursor: PrecursorWindow) -> Self {
        self.precursor = Some(precursor);
        self
    }

    pub fn with_signal_continuity(mut self, signal_continuity: SignalContinuity) -> Self {
        self.signal_continuity = signal_continuity;
        self
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// The position of this scan in its store
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn ms_level(&self) -> u8 {
        self.ms_level
    }

    #[inline]
    pub fn polarity(&self) -> ScanPolarity {
        self.polarity
    }

    /// The retention time of the scan in minutes
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    pub fn drift_time(&self) -> Option<f64> {
        self.drift_time
    }

    /// The integer drift bin of the scan, if it carries a drift time
    #[inline]
    pub fn drift_bin(&self) -> Option<i64> {
        self.drift_time.map(drift_bin)
    }

    #[inline]
    pub fn precursor(&self) -> Option<&PrecursorWindow> {
        self.precursor.as_ref()
    }

    #[inline]
    pub fn signal_continuity(&self) -> SignalContinuity {
        self.signal_continuity
    }

    /// The m/z-sorted peaks of the scan
    #[inline]
    pub fn peaks(&self) -> &[CentroidPeak] {
        &self.peaks
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn base_peak(&self) -> Option<&CentroidPeak> {
        self.peaks
            .iter()
            .max_by(|a, b| a.intensity.total_cmp(&b.intensity))
    }

    /// Total ion current
    pub fn tic(&self) -> f64 {
        self.peaks.iter().map(|p| p.intensity as f64).sum()
    }
}
