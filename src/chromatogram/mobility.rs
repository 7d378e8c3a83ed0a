//! The drift-time dimension of ion mobility acquisitions.
//!
//! Mobility stores hold one scan per (retention time, drift bin) pair. Scans of
//! one frame are contiguous and frames follow each other in time, so a time
//! window around a seed scan is a contiguous range of the store.
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use mzpeaks::{CentroidPeak, Tolerance};

use super::{Chromatogram, ChromatogramKind, ChromatogramPoint};
use crate::spectrum::scan::DRIFT_BIN_FACTOR;
use crate::spectrum::search::{peaks_in_window, sum_and_base_peak};
use crate::spectrum::{Scan, ScanPolarity, SpectralStore, SpectrumAccumulator};

#[derive(Debug, Clone, Copy)]
struct DriftBin {
    intensity: f64,
    base_mz: f64,
    base_intensity: f32,
    first_index: usize,
}

/// Totals of in-window intensity per integer drift bin.
///
/// Every statistic kept is insensitive to the order scans are added in: the
/// intensity is summed, the base peak is the most intense contribution (lower
/// m/z on ties) and the anchoring scan index is the smallest one seen.
#[derive(Debug, Clone, Default)]
pub struct DriftBinAccumulator {
    bins: BTreeMap<i64, DriftBin>,
}

impl DriftBinAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Add the peaks of `peaks` to `bin`, as read from the scan at `scan_index`
    pub fn add(&mut self, scan_index: usize, bin: i64, peaks: &[CentroidPeak]) {
        let (total, base) = sum_and_base_peak(peaks);
        let entry = self.bins.entry(bin).or_insert(DriftBin {
            intensity: 0.0,
            base_mz: 0.0,
            base_intensity: f32::NEG_INFINITY,
            first_index: scan_index,
        });
        entry.intensity += total;
        entry.first_index = entry.first_index.min(scan_index);
        if let Some(base) = base {
            if base.intensity > entry.base_intensity
                || (base.intensity == entry.base_intensity && base.mz < entry.base_mz)
            {
                entry.base_intensity = base.intensity;
                entry.base_mz = base.mz;
            }
        }
    }

    /// The summed intensity of `bin`, if anything was added to it
    pub fn intensity_of(&self, bin: i64) -> Option<f64> {
        self.bins.get(&bin).map(|b| b.intensity)
    }

    /// Iterate over `(bin, summed intensity)` pairs in bin order
    pub fn totals(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.bins.iter().map(|(k, v)| (*k, v.intensity))
    }

    /// Convert the bins into a mobilogram ordered by drift time
    pub fn into_chromatogram(self, target_mz: f64) -> Chromatogram {
        let points = self
            .bins
            .into_iter()
            .map(|(bin, b)| {
                let mz = if b.base_intensity > 0.0 {
                    b.base_mz
                } else {
                    target_mz
                };
                ChromatogramPoint::new(
                    b.first_index,
                    bin as f64 / DRIFT_BIN_FACTOR,
                    mz,
                    b.intensity,
                )
            })
            .collect();
        Chromatogram::new(ChromatogramKind::Mobilogram, target_mz, points)
    }
}

/// The inclusive range of scans around `seed` whose times lie within
/// `[time - half_width, time + half_width]` of the seed's own, found by walking
/// outward from `seed` in both directions.
pub fn time_window_around(
    scans: &[Scan],
    seed: usize,
    half_width: f64,
) -> Option<RangeInclusive<usize>> {
    let seed_time = scans.get(seed)?.time();
    let lower = seed_time - half_width.abs();
    let upper = seed_time + half_width.abs();
    let mut start = seed;
    while start > 0 && scans[start - 1].time() >= lower {
        start -= 1;
    }
    let mut end = seed;
    while end + 1 < scans.len() && scans[end + 1].time() <= upper {
        end += 1;
    }
    Some(start..=end)
}

/// Visit `range` starting at `seed`, then every index to the left of it moving
/// away, then every index to the right moving away
fn outward_order(range: RangeInclusive<usize>, seed: usize) -> impl Iterator<Item = usize> {
    let (start, end) = (*range.start(), *range.end());
    std::iter::once(seed)
        .chain((start..seed).rev())
        .chain(seed + 1..=end)
}

/// Build the mobilogram of `target_mz` over the MS1 scans within `rt_width`
/// minutes centered on the retention time of `seed_index`.
///
/// Drift times are binned by `round(drift_time * 1000)`. Scans without a drift
/// time, of another MS level or of another polarity do not contribute.
pub fn drift_chromatogram(
    store: &SpectralStore,
    seed_index: usize,
    target_mz: f64,
    tolerance: Tolerance,
    rt_width: f64,
    polarity: ScanPolarity,
) -> Chromatogram {
    let scans = store.scans();
    let Some(range) = time_window_around(scans, seed_index, rt_width / 2.0) else {
        log::debug!("Seed scan {seed_index} is outside of the store");
        return Chromatogram::empty(ChromatogramKind::Mobilogram, target_mz);
    };
    let (lower, upper) = tolerance.bounds(target_mz);
    let mut acc = DriftBinAccumulator::new();
    for i in outward_order(range, seed_index) {
        let scan = &scans[i];
        if scan.ms_level() != 1 || scan.polarity() != polarity {
            continue;
        }
        let Some(bin) = scan.drift_bin() else {
            continue;
        };
        acc.add(i, bin, peaks_in_window(scan.peaks(), lower, upper));
    }
    acc.into_chromatogram(target_mz)
}

/// Accumulate the MS2 scans of one feature's drift bin into a single spectrum.
///
/// Starting from `seed_index`, usually the feature's apex scan, the walk moves
/// outward in both directions while scans stay within `[start_time, end_time]`.
/// MS2 scans whose drift bin equals `drift_bin` and whose isolation window
/// contains `precursor_mz` are summed into `bin_width` wide m/z bins.
pub fn accumulate_drift_ms2(
    store: &SpectralStore,
    seed_index: usize,
    start_time: f64,
    end_time: f64,
    drift_bin: i64,
    precursor_mz: f64,
    bin_width: f64,
) -> Vec<CentroidPeak> {
    let scans = store.scans();
    if seed_index >= scans.len() || end_time < start_time {
        return Vec::new();
    }
    let accepts = |scan: &Scan| {
        scan.ms_level() == 2
            && scan.drift_bin() == Some(drift_bin)
            && scan
                .precursor()
                .map(|p| p.contains(precursor_mz))
                .unwrap_or(false)
    };
    let mut acc = SpectrumAccumulator::new(bin_width);

    let mut i = seed_index;
    loop {
        let scan = &scans[i];
        if scan.time() < start_time {
            break;
        }
        if scan.time() <= end_time && accepts(scan) {
            acc.add_scan(scan);
        }
        if i == 0 {
            break;
        }
        i -= 1;
    }
    for scan in scans[seed_index + 1..].iter() {
        if scan.time() > end_time {
            break;
        }
        if scan.time() >= start_time && accepts(scan) {
            acc.add_scan(scan);
        }
    }
    log::trace!(
        "Accumulated {} MS2 scans in drift bin {drift_bin} for {precursor_mz}",
        acc.scans_added()
    );
    acc.into_peaks()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::spectrum::PrecursorWindow;

    /// Five frames, each with MS1 scans at drift times 0.5..0.9 and one MS2 scan
    /// per drift time isolating 400 +/- 1
    fn mobility_store() -> SpectralStore {
        let mut scans = Vec::new();
        for frame in 0..5 {
            let t = frame as f64 * 0.1;
            for d in 5..10 {
                let drift = d as f64 / 10.0;
                let height = (10 - (d as i32 - 7).abs() * 3) as f32 * (frame + 1) as f32;
                scans.push(
                    Scan::from_arrays(0, 1, ScanPolarity::Positive, t, &[400.0, 400.004], &[height, 1.0])
                        .with_drift_time(drift),
                );
            }
            for d in 5..10 {
                let drift = d as f64 / 10.0;
                scans.push(
                    Scan::from_arrays(0, 2, ScanPolarity::Positive, t, &[150.2, 150.4, 210.0], &[1.0, 2.0, 4.0])
                        .with_drift_time(drift)
                        .with_precursor(PrecursorWindow::centered(400.0, 2.0, 30.0)),
                );
            }
        }
        SpectralStore::new(scans)
    }

    #[test_log::test]
    fn test_drift_chromatogram() {
        let store = mobility_store();
        // Seed in frame 2 (t = 0.2), window of 0.25 min spans frames 1..=3
        let seed = 2 * 10 + 2;
        let chrom = drift_chromatogram(&store, seed, 400.0, Tolerance::Da(0.01), 0.25, ScanPolarity::Positive);
        assert_eq!(chrom.kind(), ChromatogramKind::Mobilogram);
        assert_eq!(chrom.len(), 5);
        let xs: Vec<f64> = chrom.iter().map(|p| p.chrom_x).collect();
        assert_eq!(xs, vec![0.5, 0.6, 0.7, 0.8, 0.9]);
        // drift 0.7: heights 10 * (2 + 3 + 4) plus the shoulder peak in each frame
        assert_eq!(chrom.points()[2].intensity, 93.0);
        assert_eq!(chrom.points()[2].mz, 400.0);
        assert_eq!(chrom.points()[0].index, 10);
    }

    #[test_log::test]
    fn test_outward_walk_matches_forward_pass() {
        let store = mobility_store();
        let scans = store.scans();
        let seed = 2 * 10 + 3;
        let range = time_window_around(scans, seed, 0.15).unwrap();

        let mut outward = DriftBinAccumulator::new();
        for i in outward_order(range.clone(), seed) {
            let scan = &scans[i];
            if let (1, Some(bin)) = (scan.ms_level(), scan.drift_bin()) {
                outward.add(i, bin, peaks_in_window(scan.peaks(), 399.99, 400.01));
            }
        }
        let mut forward = DriftBinAccumulator::new();
        for i in range {
            let scan = &scans[i];
            if let (1, Some(bin)) = (scan.ms_level(), scan.drift_bin()) {
                forward.add(i, bin, peaks_in_window(scan.peaks(), 399.99, 400.01));
            }
        }
        let a: Vec<(i64, f64)> = outward.totals().collect();
        let b: Vec<(i64, f64)> = forward.totals().collect();
        assert_eq!(a, b);
        assert_eq!(
            outward.into_chromatogram(400.0),
            forward.into_chromatogram(400.0)
        );
    }

    #[test]
    fn test_outward_order() {
        let order: Vec<usize> = outward_order(2..=6, 4).collect();
        assert_eq!(order, vec![4, 3, 2, 5, 6]);
    }

    #[test_log::test]
    fn test_accumulate_drift_ms2() {
        let store = mobility_store();
        // MS2 scan of frame 2 at drift 0.7
        let seed = 2 * 10 + 5 + 2;
        let peaks = accumulate_drift_ms2(&store, seed, 0.1, 0.35, 700, 400.0, 1.0);
        assert_eq!(peaks.len(), 2);
        // bins 150 and 210, three frames each
        assert_eq!(peaks[0].intensity, 9.0);
        assert_eq!(peaks[0].mz, 150.4);
        assert_eq!(peaks[1].intensity, 12.0);

        assert!(accumulate_drift_ms2(&store, seed, 0.1, 0.35, 700, 600.0, 1.0).is_empty());
        assert!(accumulate_drift_ms2(&store, seed, 0.1, 0.35, 650, 400.0, 1.0).is_empty());
        assert!(accumulate_drift_ms2(&store, 10_000, 0.1, 0.35, 700, 400.0, 1.0).is_empty());
    }

    #[test]
    fn test_out_of_store_seed() {
        let store = mobility_store();
        let chrom = drift_chromatogram(&store, 999, 400.0, Tolerance::Da(0.01), 0.2, ScanPolarity::Positive);
        assert!(chrom.is_empty());
    }
}
