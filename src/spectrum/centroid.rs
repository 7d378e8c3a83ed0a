//! Reduce profile spectra to centroids and pull isotope windows out of them.
use mzpeaks::{CentroidPeak, Tolerance};
use mzsignal::PeakPicker;

use super::scan_properties::SignalContinuity;
use super::search::{first_peak_at_or_above, peaks_in_window, sum_and_base_peak};
use crate::utils::C13_C12_DIFF;

/// The smallest m/z span above the monoisotopic peak an isotope window covers
pub const MIN_ISOTOPE_SPAN: f64 = 5.0;

/// How far below the monoisotopic peak an isotope window reaches
pub const ISOTOPE_WINDOW_LOWER_MARGIN: f64 = 0.5;

/// Profile points below this m/z are not handed to the peak picker
pub const MIN_PICKING_MZ: f64 = 1.0;

/// Reduce `peaks` to centroids.
///
/// Anything not flagged as [`SignalContinuity::Profile`] is already centroided
/// and comes back unchanged. Profile data is reduced by [`mzsignal`] peak picking
/// when `use_peak_detection` is set, otherwise by keeping the most intense point
/// of each `mass_bin` wide bin. If the reduction finds nothing the raw profile is
/// returned instead.
pub fn centroid(
    peaks: &[CentroidPeak],
    continuity: SignalContinuity,
    mass_bin: f64,
    use_peak_detection: bool,
) -> Vec<CentroidPeak> {
    if continuity != SignalContinuity::Profile {
        return peaks.to_vec();
    }
    let reduced = if use_peak_detection {
        pick_centroids(peaks, mass_bin)
    } else {
        bin_centroid(peaks, mass_bin)
    };
    if reduced.is_empty() {
        log::debug!(
            "Centroiding {} profile points produced no peaks, keeping the profile",
            peaks.len()
        );
        return peaks.to_vec();
    }
    reduced
}

/// Pick apexes with [`PeakPicker`], then merge picked peaks closer than `mass_bin`.
///
/// The picker needs at least three points and m/z values of at least
/// [`MIN_PICKING_MZ`]; anything outside of that is not picked.
fn pick_centroids(peaks: &[CentroidPeak], mass_bin: f64) -> Vec<CentroidPeak> {
    let start = first_peak_at_or_above(peaks, MIN_PICKING_MZ);
    let peaks = &peaks[start..];
    if peaks.len() < 3 {
        return Vec::new();
    }
    let mzs: Vec<f64> = peaks.iter().map(|p| p.mz).collect();
    let intensities: Vec<f32> = peaks.iter().map(|p| p.intensity).collect();

    let mut acc = Vec::new();
    if let Err(e) = PeakPicker::default().discover_peaks(&mzs, &intensities, &mut acc) {
        log::warn!("Failed to pick peaks from {} profile points: {e}", peaks.len());
        return Vec::new();
    }
    let apexes = acc.into_iter().map(CentroidPeak::from).collect();
    merge_within(apexes, mass_bin)
}

fn merge_within(peaks: Vec<CentroidPeak>, mass_bin: f64) -> Vec<CentroidPeak> {
    let mut merged: Vec<CentroidPeak> = Vec::with_capacity(peaks.len());
    for peak in peaks {
        match merged.last_mut() {
            Some(last) if peak.mz - last.mz < mass_bin => {
                let total = last.intensity as f64 + peak.intensity as f64;
                last.mz =
                    (last.mz * last.intensity as f64 + peak.mz * peak.intensity as f64) / total;
                last.intensity = last.intensity.max(peak.intensity);
            }
            _ => merged.push(peak),
        }
    }
    reindex(&mut merged);
    merged
}

fn bin_centroid(peaks: &[CentroidPeak], mass_bin: f64) -> Vec<CentroidPeak> {
    if mass_bin <= 0.0 {
        return Vec::new();
    }
    let mut binned: Vec<(i64, CentroidPeak)> = Vec::new();
    for peak in peaks.iter().filter(|p| p.intensity > 0.0) {
        let bin = (peak.mz / mass_bin).floor() as i64;
        match binned.last_mut() {
            Some((last_bin, best)) if *last_bin == bin => {
                if peak.intensity > best.intensity {
                    *best = peak.clone();
                }
            }
            _ => binned.push((bin, peak.clone())),
        }
    }
    let mut out: Vec<CentroidPeak> = binned.into_iter().map(|(_, p)| p).collect();
    reindex(&mut out);
    out
}

fn reindex(peaks: &mut [CentroidPeak]) {
    for (i, p) in peaks.iter_mut().enumerate() {
        p.index = i as mzpeaks::IndexType;
    }
}

/// The m/z-sorted sub-slice of `peaks` within `[mono_mass - 0.5, mono_mass + span]`.
///
/// A `span` below [`MIN_ISOTOPE_SPAN`] is raised to it.
pub fn isotope_window(peaks: &[CentroidPeak], mono_mass: f64, span: f64) -> &[CentroidPeak] {
    let span = span.max(MIN_ISOTOPE_SPAN);
    peaks_in_window(
        peaks,
        mono_mass - ISOTOPE_WINDOW_LOWER_MARGIN,
        mono_mass + span,
    )
}

/// One member of an isotopic envelope
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IsotopicPeak {
    /// The theoretical m/z, `target + k * 1.003355`
    pub mass: f64,
    /// The summed intensity observed within tolerance of `mass`
    pub abs_intensity: f64,
    /// `abs_intensity` relative to the monoisotopic peak, `0` when that is empty
    pub rel_intensity: f64,
}

/// Measure the first `max_isotopes` isotopic peaks of `target` in `peaks`.
///
/// The list always has `max_isotopes` entries; missing isotopes carry zero
/// intensity.
pub fn isotopic_peaks(
    peaks: &[CentroidPeak],
    target: f64,
    tolerance: Tolerance,
    max_isotopes: usize,
) -> Vec<IsotopicPeak> {
    let mut isotopes: Vec<IsotopicPeak> = (0..max_isotopes)
        .map(|k| {
            let mass = target + k as f64 * C13_C12_DIFF;
            let (lower, upper) = tolerance.bounds(mass);
            let (abs_intensity, _) = sum_and_base_peak(peaks_in_window(peaks, lower, upper));
            IsotopicPeak {
                mass,
                abs_intensity,
                rel_intensity: 0.0,
            }
        })
        .collect();

    let mono = isotopes.first().map(|p| p.abs_intensity).unwrap_or_default();
    if mono > 0.0 {
        for iso in isotopes.iter_mut() {
            iso.rel_intensity = iso.abs_intensity / mono;
        }
    }
    isotopes
}
