//! Chromatographic peak features and the conversion from detection results.
//!
//! A feature found in an ion mobility acquisition carries a second, drift-time
//! peak. [`Feature`] makes that distinction a variant rather than a runtime type
//! test.
pub mod adapter;
pub mod detection;
pub mod peak;

pub use detection::{detect_peaks, PeakDetectionResult};
pub use peak::{
    AdductIon, ChromX, ChromXType, ChromatogramPeakFeature, DriftFeature, Identification,
    PeakEdge, PeakShape, UNSET_ID, UNSET_VALUE,
};

use crate::chromatogram::Chromatogram;
use crate::params::PeakDetectionParameters;
use crate::spectrum::ScanPolarity;

/// A detected feature, with or without an ion mobility dimension
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Feature {
    Plain(ChromatogramPeakFeature),
    WithDrift(ChromatogramPeakFeature, DriftFeature),
}

impl Feature {
    pub fn peak(&self) -> &ChromatogramPeakFeature {
        match self {
            Feature::Plain(peak) => peak,
            Feature::WithDrift(peak, _) => peak,
        }
    }

    pub(crate) fn peak_mut(&mut self) -> &mut ChromatogramPeakFeature {
        match self {
            Feature::Plain(peak) => peak,
            Feature::WithDrift(peak, _) => peak,
        }
    }

    pub fn drift(&self) -> Option<&DriftFeature> {
        match self {
            Feature::Plain(_) => None,
            Feature::WithDrift(_, drift) => Some(drift),
        }
    }

    pub fn into_peak(self) -> ChromatogramPeakFeature {
        match self {
            Feature::Plain(peak) => peak,
            Feature::WithDrift(peak, _) => peak,
        }
    }

    /// The collision cross section, when the feature has a calibrated drift peak
    pub fn ccs(&self) -> Option<f64> {
        self.drift().filter(|d| d.has_ccs()).map(|d| d.ccs)
    }

    /// Attach a drift peak, replacing any that was already there
    pub fn with_drift(self, drift: DriftFeature) -> Self {
        Feature::WithDrift(self.into_peak(), drift)
    }
}

impl From<ChromatogramPeakFeature> for Feature {
    fn from(value: ChromatogramPeakFeature) -> Self {
        Feature::Plain(value)
    }
}

/// Produce a new collection in which every feature carries `adduct`.
///
/// The input is consumed; nothing else is touched.
pub fn reset_adducts(features: Vec<Feature>, adduct: &AdductIon) -> Vec<Feature> {
    features
        .into_iter()
        .map(|feature| match feature {
            Feature::Plain(peak) => Feature::Plain(peak.with_adduct(adduct.clone())),
            Feature::WithDrift(peak, drift) => {
                Feature::WithDrift(peak.with_adduct(adduct.clone()), drift)
            }
        })
        .collect()
}

/// Detect peaks in `chromatogram` and convert each into a plain feature at `mass`
pub fn features_from_chromatogram(
    chromatogram: &Chromatogram,
    mass: f64,
    polarity: ScanPolarity,
    params: &PeakDetectionParameters,
) -> Vec<Feature> {
    detect_peaks(chromatogram, params)
        .iter()
        .filter_map(|r| ChromatogramPeakFeature::from_detection(Some(r), chromatogram, mass, polarity))
        .map(Feature::Plain)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::chromatogram::{ChromatogramKind, ChromatogramPoint};

    fn trace() -> Chromatogram {
        let points = (0..41)
            .map(|i| {
                let x = i as f64 * 0.05;
                let y = 5e4 * (-0.5 * ((x - 1.0) / 0.1).powi(2)).exp();
                ChromatogramPoint::new(i * 2, x, 410.2, y)
            })
            .collect();
        Chromatogram::new(ChromatogramKind::Eic, 410.2, points)
    }

    #[test_log::test]
    fn test_chromatogram_to_features() {
        let features = features_from_chromatogram(
            &trace(),
            410.2,
            ScanPolarity::Positive,
            &PeakDetectionParameters::default(),
        );
        assert_eq!(features.len(), 1);
        let peak = features[0].peak();
        assert_eq!(peak.top.scan_id, 40);
        assert!(features[0].drift().is_none());
        assert!(features[0].ccs().is_none());
    }

    #[test]
    fn test_reset_adducts() {
        let features = features_from_chromatogram(
            &trace(),
            410.2,
            ScanPolarity::Positive,
            &PeakDetectionParameters::default(),
        );
        let drift = DriftFeature {
            left: PeakEdge::default(),
            top: PeakEdge::new(0, ChromX::drift_time(0.72), 10.0),
            right: PeakEdge::default(),
            area_above_zero: 1.0,
            ccs: 210.0,
        };
        let mut features = features;
        let with_drift = features[0].clone().with_drift(drift);
        features.push(with_drift);

        let adduct = AdductIon::new("[M+Na]+", 22.989218, 1, 1);
        let reset = reset_adducts(features.clone(), &adduct);
        assert_eq!(reset.len(), 2);
        assert!(reset.iter().all(|f| f.peak().adduct == adduct));
        assert!(features.iter().all(|f| f.peak().adduct.is_unknown()));
        assert_eq!(reset[1].ccs(), Some(210.0));
        assert_eq!(reset[1].drift().map(|d| d.drift_bin()), Some(720));
    }
}
