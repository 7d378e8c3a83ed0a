//! Tolerances and mode switches consumed by the extraction, annotation and loading
//! stages.
//!
//! These are plain values owned by the caller. Nothing here is read from disk; a
//! parameter model elsewhere is expected to populate them, and every type has a
//! [`Default`] matching common LC-MS settings.
use std::time::Duration;

use mzpeaks::Tolerance;

use crate::spectrum::ScanPolarity;

/// How profile spectra are reduced to centroids.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CentroidParameters {
    /// The m/z width within which neighboring MS1 centroids are merged
    pub ms1_mass_bin: f64,
    /// The m/z width within which neighboring MS2 centroids are merged
    pub ms2_mass_bin: f64,
    /// Pick profile peaks with `mzsignal` rather than simple max-per-bin reduction
    pub use_peak_detection: bool,
}

impl Default for CentroidParameters {
    fn default() -> Self {
        Self {
            ms1_mass_bin: 0.01,
            ms2_mass_bin: 0.025,
            use_peak_detection: true,
        }
    }
}

/// Settings for building chromatograms and spectra from a [`SpectralStore`](crate::spectrum::SpectralStore)
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtractionParameters {
    /// Extraction window half-width for MS1 chromatograms
    pub ms1_tolerance: Tolerance,
    /// Extraction window half-width for MS2 chromatograms and fragment matching
    pub ms2_tolerance: Tolerance,
    /// The polarity scans must carry to contribute to a chromatogram
    pub ion_mode: ScanPolarity,
    pub centroid: CentroidParameters,
    /// The number of isotopic peaks, counting the monoisotopic peak, to track
    pub max_isotopes: usize,
    /// The m/z span above the monoisotopic peak retained by isotope-window extraction
    pub isotope_span: f64,
    /// The retention time window, in minutes, summed into an ion mobility chromatogram
    pub mobility_rt_width: f64,
    /// The m/z bin width of drift-filtered accumulated MS2 spectra
    pub ms2_accumulation_bin: f64,
}

impl Default for ExtractionParameters {
    fn default() -> Self {
        Self {
            ms1_tolerance: Tolerance::Da(0.01),
            ms2_tolerance: Tolerance::Da(0.025),
            ion_mode: ScanPolarity::Positive,
            centroid: CentroidParameters::default(),
            max_isotopes: 2,
            isotope_span: 5.0,
            mobility_rt_width: 0.5,
            ms2_accumulation_bin: 1.0,
        }
    }
}

impl ExtractionParameters {
    pub fn with_ms1_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.ms1_tolerance = tolerance;
        self
    }

    pub fn with_ms2_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.ms2_tolerance = tolerance;
        self
    }

    pub fn with_ion_mode(mut self, ion_mode: ScanPolarity) -> Self {
        self.ion_mode = ion_mode;
        self
    }

    pub fn with_centroid(mut self, centroid: CentroidParameters) -> Self {
        self.centroid = centroid;
        self
    }

    pub fn with_max_isotopes(mut self, max_isotopes: usize) -> Self {
        self.max_isotopes = max_isotopes;
        self
    }

    pub fn with_isotope_span(mut self, isotope_span: f64) -> Self {
        self.isotope_span = isotope_span;
        self
    }

    pub fn with_mobility_rt_width(mut self, width: f64) -> Self {
        self.mobility_rt_width = width;
        self
    }

    pub fn with_ms2_accumulation_bin(mut self, bin_width: f64) -> Self {
        self.ms2_accumulation_bin = bin_width;
        self
    }
}

/// Whether retention time and collision cross section may corroborate an
/// identification, and how close they must be to do so.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorroborationParameters {
    pub use_retention_time: bool,
    /// Maximum absolute retention time difference, in minutes
    pub retention_time_tolerance: f64,
    pub use_ccs: bool,
    /// Maximum relative CCS difference, in percent
    pub ccs_tolerance: f64,
}

impl Default for CorroborationParameters {
    fn default() -> Self {
        Self {
            use_retention_time: false,
            retention_time_tolerance: 0.1,
            use_ccs: false,
            ccs_tolerance: 5.0,
        }
    }
}

impl CorroborationParameters {
    /// Test a retention time pair against the tolerance, if retention time
    /// corroboration is turned on.
    pub fn retention_time_matches(&self, observed: f64, reference: f64) -> bool {
        self.use_retention_time
            && reference >= 0.0
            && (observed - reference).abs() <= self.retention_time_tolerance
    }

    /// Test a CCS pair against the percent tolerance, if CCS corroboration is turned on.
    pub fn ccs_matches(&self, observed: f64, reference: f64) -> bool {
        if !self.use_ccs || reference <= 0.0 || observed <= 0.0 {
            return false;
        }
        (observed - reference).abs() / reference * 100.0 <= self.ccs_tolerance
    }
}

/// Settings for the local-maximum chromatographic peak detector.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeakDetectionParameters {
    /// Half-width of the linear weighted moving average applied before detection
    pub smoothing_level: usize,
    /// Minimum number of points between the edges of an accepted peak
    pub min_data_points: usize,
    /// Minimum apex height above the larger edge intensity
    pub min_amplitude: f64,
}

impl Default for PeakDetectionParameters {
    fn default() -> Self {
        Self {
            smoothing_level: 3,
            min_data_points: 5,
            min_amplitude: 1000.0,
        }
    }
}

/// A bounded retry schedule for loads that can report "not ready yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Fixed pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_corroboration() {
        let mut params = CorroborationParameters::default();
        assert!(!params.retention_time_matches(5.0, 5.0));
        params.use_retention_time = true;
        assert!(params.retention_time_matches(5.0, 5.05));
        assert!(!params.retention_time_matches(5.0, 5.5));
        assert!(!params.retention_time_matches(5.0, -1.0));

        params.use_ccs = true;
        assert!(params.ccs_matches(202.0, 200.0));
        assert!(!params.ccs_matches(220.0, 200.0));
        assert!(!params.ccs_matches(220.0, -1.0));
    }

    #[test]
    fn test_builders() {
        let params = ExtractionParameters::default()
            .with_ms1_tolerance(Tolerance::PPM(10.0))
            .with_max_isotopes(3)
            .with_ion_mode(ScanPolarity::Negative);
        assert_eq!(params.max_isotopes, 3);
        assert_eq!(params.ion_mode, ScanPolarity::Negative);
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
