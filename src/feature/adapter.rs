use super::detection::PeakDetectionResult;
use super::peak::{
    AdductIon, ChromX, ChromatogramPeakFeature, DriftFeature, Identification, PeakEdge,
    PeakShape, UNSET_ID, UNSET_VALUE,
};
use crate::chromatogram::Chromatogram;
use crate::spectrum::ScanPolarity;

/// Resolve the chromatogram point at `position` into a peak edge
fn edge_at(chromatogram: &Chromatogram, position: usize) -> Option<PeakEdge> {
    let point = chromatogram.get(position)?;
    let kind = ChromX::type_for(chromatogram.kind());
    Some(PeakEdge::new(
        point.index,
        ChromX::new(point.chrom_x, kind),
        point.intensity,
    ))
}

fn edges_of(
    result: &PeakDetectionResult,
    chromatogram: &Chromatogram,
) -> Option<(PeakEdge, PeakEdge, PeakEdge)> {
    let edges = (
        edge_at(chromatogram, result.left_index),
        edge_at(chromatogram, result.top_index),
        edge_at(chromatogram, result.right_index),
    );
    match edges {
        (Some(left), Some(top), Some(right)) => Some((left, top, right)),
        _ => {
            log::debug!(
                "Peak {} refers to points {}..={} outside of a {} point chromatogram",
                result.peak_id,
                result.left_index,
                result.right_index,
                chromatogram.len()
            );
            None
        }
    }
}

impl ChromatogramPeakFeature {
    /// Convert a peak detection result over `chromatogram` into a feature.
    ///
    /// A missing result yields no feature, as does a result whose edges do not
    /// fall within the chromatogram. Shape metrics are copied as detected and
    /// every identification field starts out unset.
    pub fn from_detection(
        result: Option<&PeakDetectionResult>,
        chromatogram: &Chromatogram,
        mass: f64,
        polarity: ScanPolarity,
    ) -> Option<Self> {
        let result = result?;
        let (left, top, right) = edges_of(result, chromatogram)?;
        Some(Self {
            peak_id: result.peak_id,
            left,
            top,
            right,
            area_above_zero: result.area_above_zero,
            area_above_baseline: result.area_above_baseline,
            mass,
            polarity,
            shape: PeakShape {
                estimated_noise: result.estimated_noise,
                signal_to_noise: result.signal_to_noise,
                symmetry: result.symmetry,
                ideal_slope: result.ideal_slope,
                sharpness: result.sharpness,
                gaussian_similarity: result.gaussian_similarity,
                peak_pure_value: result.peak_pure_value,
            },
            ms2_raw_spectrum_id: UNSET_ID,
            isotope_weight_number: 0,
            isotope_parent_peak_id: UNSET_ID,
            adduct: AdductIon::unknown(),
            identification: Identification::default(),
        })
    }
}

impl DriftFeature {
    /// Convert a peak detection result over a mobilogram into the drift
    /// dimension of a feature. The CCS starts out unset.
    pub fn from_detection(
        result: Option<&PeakDetectionResult>,
        mobilogram: &Chromatogram,
    ) -> Option<Self> {
        let result = result?;
        let (left, top, right) = edges_of(result, mobilogram)?;
        Some(Self {
            left,
            top,
            right,
            area_above_zero: result.area_above_zero,
            ccs: UNSET_VALUE,
        })
    }
}
