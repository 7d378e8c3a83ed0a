//! A local-maximum chromatographic peak detector.
//!
//! Detection runs on a smoothed copy of the chromatogram. Edges are found by
//! descending from each apex until the trace rises again, and every metric is
//! then measured on the raw intensities.
use crate::chromatogram::Chromatogram;
use crate::params::PeakDetectionParameters;

/// The outcome of detecting one peak in a chromatogram.
///
/// Edge and apex positions index into the chromatogram's points, not into the
/// scan store.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeakDetectionResult {
    pub peak_id: i32,
    pub left_index: usize,
    pub top_index: usize,
    pub right_index: usize,
    pub intensity_at_left: f64,
    pub intensity_at_top: f64,
    pub intensity_at_right: f64,
    pub area_above_zero: f64,
    pub area_above_baseline: f64,
    pub estimated_noise: f64,
    pub signal_to_noise: f64,
    pub symmetry: f64,
    pub ideal_slope: f64,
    pub sharpness: f64,
    pub gaussian_similarity: f64,
    pub peak_pure_value: f64,
}

/// The median absolute difference between neighboring intensities, or `1` for a flat trace
fn estimate_noise(intensities: &[f64]) -> f64 {
    let mut diffs: Vec<f64> = intensities
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .filter(|d| *d > 0.0)
        .collect();
    if diffs.is_empty() {
        return 1.0;
    }
    diffs.sort_by(|a, b| a.total_cmp(b));
    let mid = diffs.len() / 2;
    let median = if diffs.len() % 2 == 0 {
        (diffs[mid - 1] + diffs[mid]) / 2.0
    } else {
        diffs[mid]
    };
    if median > 0.0 {
        median
    } else {
        1.0
    }
}

fn find_edges(smoothed: &[f64], apex: usize) -> (usize, usize) {
    let mut left = apex;
    while left > 0 && smoothed[left - 1] < smoothed[left] {
        left -= 1;
    }
    let mut right = apex;
    while right + 1 < smoothed.len() && smoothed[right + 1] < smoothed[right] {
        right += 1;
    }
    (left, right)
}

fn ideal_slope(raw: &[f64], left: usize, top: usize, right: usize) -> f64 {
    let steps = right - left;
    if steps == 0 {
        return 0.0;
    }
    let rising = (left..top).filter(|&i| raw[i + 1] >= raw[i]).count();
    let falling = (top..right).filter(|&i| raw[i + 1] <= raw[i]).count();
    (rising + falling) as f64 / steps as f64
}

fn sharpness(xs: &[f64], raw: &[f64], left: usize, top: usize, right: usize) -> f64 {
    let height = raw[top];
    if height <= 0.0 {
        return 0.0;
    }
    let slope = |j: usize| {
        let dx = (xs[top] - xs[j]).abs();
        if dx > 0.0 {
            (height - raw[j]) / dx
        } else {
            0.0
        }
    };
    let left_slope = (left..top).map(slope).fold(0.0, f64::max);
    let right_slope = (top + 1..=right).map(slope).fold(0.0, f64::max);
    (left_slope + right_slope) / 2.0 / height
}

/// The full width at half maximum of the peak, interpolating linearly between
/// the points straddling half height on each side
fn half_height_width(xs: &[f64], raw: &[f64], left: usize, top: usize, right: usize) -> f64 {
    let half = raw[top] / 2.0;
    let crossing = |inside: usize, outside: usize| {
        let (a, b) = (raw[inside], raw[outside]);
        if a == b {
            return xs[inside];
        }
        xs[inside] + (xs[outside] - xs[inside]) * (a - half) / (a - b)
    };
    let mut l = top;
    while l > left && raw[l - 1] >= half {
        l -= 1;
    }
    let lower = if l > left { crossing(l, l - 1) } else { xs[left] };
    let mut r = top;
    while r < right && raw[r + 1] >= half {
        r += 1;
    }
    let upper = if r < right { crossing(r, r + 1) } else { xs[right] };
    upper - lower
}

/// Cosine similarity between the observed peak and a Gaussian centered on the
/// apex with the peak's own half-height width
fn gaussian_similarity(xs: &[f64], raw: &[f64], left: usize, top: usize, right: usize) -> f64 {
    let fwhm = half_height_width(xs, raw, left, top, right);
    if fwhm <= 0.0 {
        return 0.0;
    }
    let sigma = fwhm / 2.3548;
    let mut dot = 0.0;
    let mut obs_norm = 0.0;
    let mut model_norm = 0.0;
    for i in left..=right {
        let z = (xs[i] - xs[top]) / sigma;
        let model = (-0.5 * z * z).exp();
        dot += model * raw[i];
        obs_norm += raw[i] * raw[i];
        model_norm += model * model;
    }
    if obs_norm <= 0.0 || model_norm <= 0.0 {
        return 0.0;
    }
    dot / (obs_norm.sqrt() * model_norm.sqrt())
}

/// Detect peaks in `chromatogram`.
///
/// A peak is kept when it spans at least `min_data_points` points and its apex
/// rises at least `min_amplitude` above its higher edge. Peaks never overlap;
/// results are ordered by apex position and numbered from zero.
pub fn detect_peaks(
    chromatogram: &Chromatogram,
    params: &PeakDetectionParameters,
) -> Vec<PeakDetectionResult> {
    let n = chromatogram.len();
    if n < 3 {
        return Vec::new();
    }
    let raw = chromatogram.intensities();
    let xs: Vec<f64> = chromatogram.iter().map(|p| p.chrom_x).collect();
    let smoothed = chromatogram.smooth(params.smoothing_level).intensities();
    let noise = estimate_noise(&raw);

    let mut results = Vec::new();
    let mut last_right: Option<usize> = None;
    for i in 1..n - 1 {
        if last_right.is_some_and(|r| i <= r) {
            continue;
        }
        if !(smoothed[i] > smoothed[i - 1] && smoothed[i] >= smoothed[i + 1]) {
            continue;
        }
        let (left, right) = find_edges(&smoothed, i);
        if right - left + 1 < params.min_data_points {
            continue;
        }
        let mut top = left;
        for j in left..=right {
            if raw[j] > raw[top] {
                top = j;
            }
        }
        let height = raw[top];
        let edge_height = raw[left].max(raw[right]);
        if height - edge_height < params.min_amplitude {
            continue;
        }

        let area_above_zero = chromatogram.integrate(left, right);
        let baseline_area = (xs[right] - xs[left]) * (raw[left] + raw[right]) / 2.0;
        let area_above_baseline = (area_above_zero - baseline_area).max(0.0);

        let baseline_at_top = if xs[right] > xs[left] {
            raw[left] + (raw[right] - raw[left]) * (xs[top] - xs[left]) / (xs[right] - xs[left])
        } else {
            raw[left]
        };
        let signal_to_noise = (height - baseline_at_top).max(0.0) / noise;

        let left_width = xs[top] - xs[left];
        let right_width = xs[right] - xs[top];
        let symmetry = if left_width.max(right_width) > 0.0 {
            left_width.min(right_width) / left_width.max(right_width)
        } else {
            0.0
        };
        let ideal_slope = ideal_slope(&raw, left, top, right);
        let gaussian_similarity = gaussian_similarity(&xs, &raw, left, top, right);

        results.push(PeakDetectionResult {
            peak_id: results.len() as i32,
            left_index: left,
            top_index: top,
            right_index: right,
            intensity_at_left: raw[left],
            intensity_at_top: height,
            intensity_at_right: raw[right],
            area_above_zero,
            area_above_baseline,
            estimated_noise: noise,
            signal_to_noise,
            symmetry,
            ideal_slope,
            sharpness: sharpness(&xs, &raw, left, top, right),
            gaussian_similarity,
            peak_pure_value: (ideal_slope + gaussian_similarity) / 2.0,
        });
        last_right = Some(right);
    }
    log::trace!(
        "Detected {} peaks in {} of {}",
        results.len(),
        chromatogram.kind(),
        chromatogram.target_mz()
    );
    results
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::chromatogram::{ChromatogramKind, ChromatogramPoint};

    fn gaussian_trace(centers: &[(f64, f64)], n: usize) -> Chromatogram {
        let points = (0..n)
            .map(|i| {
                let x = i as f64 * 0.05;
                let y: f64 = centers
                    .iter()
                    .map(|(mu, h)| h * (-0.5 * ((x - mu) / 0.1).powi(2)).exp())
                    .sum();
                ChromatogramPoint::new(i, x, 300.0, y)
            })
            .collect();
        Chromatogram::new(ChromatogramKind::Eic, 300.0, points)
    }

    #[test_log::test]
    fn test_single_peak() {
        let chrom = gaussian_trace(&[(1.0, 1e5)], 41);
        let peaks = detect_peaks(&chrom, &PeakDetectionParameters::default());
        assert_eq!(peaks.len(), 1);
        let peak = &peaks[0];
        assert_eq!(peak.top_index, 20);
        assert_eq!(peak.peak_id, 0);
        assert!(peak.left_index < 20 && peak.right_index > 20);
        assert!(peak.area_above_zero > 0.0);
        assert!(peak.area_above_baseline <= peak.area_above_zero);
        assert!(peak.symmetry > 0.9);
        assert_eq!(peak.ideal_slope, 1.0);
        assert!(peak.gaussian_similarity > 0.9);
        assert!(peak.signal_to_noise > 1.0);
    }

    #[test_log::test]
    fn test_two_peaks_and_amplitude_filter() {
        let chrom = gaussian_trace(&[(0.5, 1e5), (1.5, 1e5), (1.0, 500.0)], 41);
        let params = PeakDetectionParameters::default();
        let peaks = detect_peaks(&chrom, &params);
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].top_index, 10);
        assert_eq!(peaks[1].top_index, 30);
        assert_eq!(peaks[1].peak_id, 1);
        assert!(peaks[0].right_index <= peaks[1].left_index);
    }

    #[test]
    fn test_degenerate_inputs() {
        let params = PeakDetectionParameters::default();
        assert!(detect_peaks(&Chromatogram::default(), &params).is_empty());
        let flat = Chromatogram::new(
            ChromatogramKind::Eic,
            300.0,
            (0..10).map(|i| ChromatogramPoint::new(i, i as f64, 300.0, 10.0)).collect(),
        );
        assert!(detect_peaks(&flat, &params).is_empty());
        assert_eq!(estimate_noise(&[5.0, 5.0, 5.0]), 1.0);
        assert_eq!(estimate_noise(&[0.0, 2.0, 6.0, 7.0]), 2.0);
    }
}
