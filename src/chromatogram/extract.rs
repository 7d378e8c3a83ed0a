//! Single-window chromatograms over the MS1 scans of a store.
use mzpeaks::Tolerance;

use super::{Chromatogram, ChromatogramKind, ChromatogramPoint};
use crate::spectrum::scan::Scan;
use crate::spectrum::search::{peaks_in_window, sum_and_base_peak};
use crate::spectrum::store::first_at_or_after_time;
use crate::spectrum::{ScanPolarity, SpectralStore};

/// Walk the MS1 scans of `scans` with `polarity` acquired in `[start_time, end_time]`,
/// in order, stopping at the first scan past the range.
fn ms1_scans_in_range(
    scans: &[Scan],
    start_time: f64,
    end_time: f64,
    polarity: ScanPolarity,
) -> impl Iterator<Item = &Scan> {
    let start = if end_time < start_time {
        scans.len()
    } else {
        first_at_or_after_time(scans, start_time)
    };
    scans[start..]
        .iter()
        .take_while(move |s| s.time() <= end_time)
        .filter(move |s| {
            s.time() >= start_time && s.ms_level() == 1 && s.polarity() == polarity
        })
}

/// Build the extracted ion chromatogram of `target_mz` from the MS1 scans of `store`.
///
/// Scans of another MS level or polarity are skipped, never zero-filled. Every
/// remaining scan in the closed time range emits exactly one point carrying the
/// summed intensity of the peaks in the closed window around `target_mz`. The
/// point's m/z is the most intense of those peaks, or `target_mz` when the window
/// is empty.
///
/// When the store carries accumulated ion mobility frames, they are read
/// instead of the individual scans.
pub fn extract_ms1(
    store: &SpectralStore,
    target_mz: f64,
    tolerance: Tolerance,
    start_time: f64,
    end_time: f64,
    polarity: ScanPolarity,
) -> Chromatogram {
    let (lower, upper) = tolerance.bounds(target_mz);
    let mut chrom = Chromatogram::empty(ChromatogramKind::Eic, target_mz);
    for scan in ms1_scans_in_range(store.ms1_source(), start_time, end_time, polarity) {
        let (intensity, base) = sum_and_base_peak(peaks_in_window(scan.peaks(), lower, upper));
        let mz = base.map(|p| p.mz).unwrap_or(target_mz);
        chrom.push(ChromatogramPoint::new(scan.index(), scan.time(), mz, intensity));
    }
    chrom
}

/// The total ion current of every MS1 scan in the time range
pub fn total_ion_chromatogram(
    store: &SpectralStore,
    start_time: f64,
    end_time: f64,
    polarity: ScanPolarity,
) -> Chromatogram {
    let mut chrom = Chromatogram::empty(ChromatogramKind::Tic, 0.0);
    for scan in ms1_scans_in_range(store.ms1_source(), start_time, end_time, polarity) {
        let mz = scan.base_peak().map(|p| p.mz).unwrap_or_default();
        chrom.push(ChromatogramPoint::new(
            scan.index(),
            scan.time(),
            mz,
            scan.tic(),
        ));
    }
    chrom
}

/// The most intense peak of every MS1 scan in the time range
pub fn base_peak_chromatogram(
    store: &SpectralStore,
    start_time: f64,
    end_time: f64,
    polarity: ScanPolarity,
) -> Chromatogram {
    let mut chrom = Chromatogram::empty(ChromatogramKind::Bpc, 0.0);
    for scan in ms1_scans_in_range(store.ms1_source(), start_time, end_time, polarity) {
        let (mz, intensity) = scan
            .base_peak()
            .map(|p| (p.mz, p.intensity as f64))
            .unwrap_or_default();
        chrom.push(ChromatogramPoint::new(scan.index(), scan.time(), mz, intensity));
    }
    chrom
}
