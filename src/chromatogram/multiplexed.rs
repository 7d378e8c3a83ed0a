//! Chromatograms from data-independent acquisitions, where MS1 and MS2 scans are
//! interleaved in a fixed cycle.
//!
//! Extraction steps through the store one cycle at a time. Scan `i` belongs to
//! lane `i mod N`, so every point of a lane's chromatogram comes from an index
//! congruent to that lane. Cycles before the time range are stepped over rather
//! than ending the walk, which keeps the stride aligned with the lanes.
use mzpeaks::Tolerance;

use super::{Chromatogram, ChromatogramKind, ChromatogramPoint};
use crate::spectrum::search::{peaks_in_window, sum_and_base_peak};
use crate::spectrum::store::first_at_or_after_time;
use crate::spectrum::{AcquisitionCycle, ScanPolarity, SpectralStore};

/// Build a chromatogram of `target_mz` from the scans of one or more `lanes`.
///
/// Each cycle yields one point, anchored at the scan of the first lane. When
/// several lanes are given, the in-window intensity of all of them within the
/// same cycle is summed into that point. Lanes outside the cycle are dropped.
#[allow(clippy::too_many_arguments)]
pub fn extract_lane(
    store: &SpectralStore,
    cycle: &AcquisitionCycle,
    lanes: &[usize],
    target_mz: f64,
    tolerance: Tolerance,
    start_time: f64,
    end_time: f64,
    polarity: ScanPolarity,
) -> Chromatogram {
    let n = cycle.lane_count();
    let lanes: Vec<usize> = lanes
        .iter()
        .copied()
        .filter(|lane| {
            let known = *lane < n;
            if !known {
                log::warn!("Lane {lane} is outside of the {n} lane acquisition cycle, skipping it");
            }
            known
        })
        .collect();

    let mut chrom = Chromatogram::empty(ChromatogramKind::Eic, target_mz);
    let Some(anchor_lane) = lanes.first().copied() else {
        return chrom;
    };
    let scans = store.scans();
    if scans.is_empty() || end_time < start_time {
        return chrom;
    }

    let (lower, upper) = tolerance.bounds(target_mz);
    let first = first_at_or_after_time(scans, start_time);
    let mut cycle_start = (first / n) * n;

    while cycle_start + anchor_lane < scans.len() {
        let anchor = &scans[cycle_start + anchor_lane];
        let time = anchor.time();
        if time > end_time {
            break;
        }
        if time < start_time || anchor.polarity() != polarity {
            cycle_start += n;
            continue;
        }

        let mut intensity = 0.0;
        let mut best: Option<(f64, f32)> = None;
        for lane in lanes.iter() {
            let Some(scan) = scans.get(cycle_start + lane) else {
                continue;
            };
            let (total, base) = sum_and_base_peak(peaks_in_window(scan.peaks(), lower, upper));
            intensity += total;
            if let Some(base) = base {
                match best {
                    Some((_, b)) if b >= base.intensity => {}
                    _ => best = Some((base.mz, base.intensity)),
                }
            }
        }
        let mz = best.map(|(mz, _)| mz).unwrap_or(target_mz);
        chrom.push(ChromatogramPoint::new(anchor.index(), time, mz, intensity));
        cycle_start += n;
    }
    chrom
}

/// Build the MS1 chromatogram of `target_mz` from the survey lane of a
/// multiplexed acquisition. A cycle without an MS1 lane yields an empty chromatogram.
pub fn extract_ms1_multiplexed(
    store: &SpectralStore,
    cycle: &AcquisitionCycle,
    target_mz: f64,
    tolerance: Tolerance,
    start_time: f64,
    end_time: f64,
    polarity: ScanPolarity,
) -> Chromatogram {
    match cycle.ms1_lane() {
        Some(lane) => extract_lane(
            store,
            cycle,
            &[lane],
            target_mz,
            tolerance,
            start_time,
            end_time,
            polarity,
        ),
        None => {
            log::debug!("No MS1 lane in acquisition cycle, nothing to extract for {target_mz}");
            Chromatogram::empty(ChromatogramKind::Eic, target_mz)
        }
    }
}

/// Build the chromatogram of fragment `product_mz` of `precursor_mz`.
///
/// The MS2 lanes are those whose SWATH window contains `precursor_mz`, or every
/// AIF lane when no SWATH window does. An unmapped precursor yields an empty
/// chromatogram.
#[allow(clippy::too_many_arguments)]
pub fn extract_ms2_multiplexed(
    store: &SpectralStore,
    cycle: &AcquisitionCycle,
    precursor_mz: f64,
    product_mz: f64,
    tolerance: Tolerance,
    start_time: f64,
    end_time: f64,
    polarity: ScanPolarity,
) -> Chromatogram {
    let lanes = cycle.ms2_lanes_for(precursor_mz);
    if lanes.is_empty() {
        log::debug!("Precursor {precursor_mz} is not isolated by any MS2 lane");
        return Chromatogram::empty(ChromatogramKind::Eic, product_mz);
    }
    extract_lane(
        store,
        cycle,
        &lanes,
        product_mz,
        tolerance,
        start_time,
        end_time,
        polarity,
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::spectrum::{PrecursorWindow, Scan};

    const WINDOWS: [(f64, f64); 3] = [(300.0, 350.0), (349.0, 400.0), (400.0, 450.0)];

    fn swath_store(cycles: usize) -> (SpectralStore, AcquisitionCycle) {
        let cycle = AcquisitionCycle::swath(&WINDOWS);
        let mut scans = Vec::new();
        for c in 0..cycles {
            let t = c as f64;
            scans.push(Scan::from_arrays(
                0,
                1,
                ScanPolarity::Positive,
                t,
                &[349.5, 420.0],
                &[10.0 * (c + 1) as f32, 5.0],
            ));
            for (lower, upper) in WINDOWS.iter() {
                let center = (lower + upper) / 2.0;
                scans.push(
                    Scan::from_arrays(
                        0,
                        2,
                        ScanPolarity::Positive,
                        t,
                        &[120.0, 180.0],
                        &[1.0, 3.0],
                    )
                    .with_precursor(PrecursorWindow::centered(center, upper - lower, 35.0)),
                );
            }
        }
        (SpectralStore::new(scans), cycle)
    }

    #[test_log::test]
    fn test_ms1_lane_stride() {
        let (store, cycle) = swath_store(10);
        let chrom = extract_ms1_multiplexed(
            &store,
            &cycle,
            349.5,
            Tolerance::Da(0.01),
            2.0,
            6.0,
            ScanPolarity::Positive,
        );
        assert_eq!(chrom.len(), 5);
        assert!(chrom.iter().all(|p| p.index % 4 == 0));
        assert_eq!(chrom.points()[0].intensity, 30.0);
        assert_eq!(chrom.points()[0].index, 8);
    }

    #[test_log::test]
    fn test_ms2_lane_stride() {
        let (store, cycle) = swath_store(10);
        let chrom = extract_ms2_multiplexed(
            &store,
            &cycle,
            420.0,
            180.0,
            Tolerance::Da(0.01),
            0.0,
            100.0,
            ScanPolarity::Positive,
        );
        assert_eq!(chrom.len(), 10);
        assert!(chrom.iter().all(|p| p.index % 4 == 3));
        assert!(chrom.iter().all(|p| p.intensity == 3.0));
    }

    #[test_log::test]
    fn test_early_cycle_advances_stride() {
        // Every scan has its own time, so a range can open in the middle of a cycle
        let cycle = AcquisitionCycle::swath(&[(400.0, 450.0), (450.0, 500.0)]);
        let scans: Vec<Scan> = (0..15)
            .map(|i| {
                let t = i as f64 * 0.4;
                let lane = i % 3;
                if lane == 0 {
                    Scan::from_arrays(0, 1, ScanPolarity::Positive, t, &[420.0], &[i as f32])
                } else {
                    let center = 375.0 + 50.0 * lane as f64;
                    Scan::from_arrays(0, 2, ScanPolarity::Positive, t, &[150.0], &[i as f32])
                        .with_precursor(PrecursorWindow::centered(center, 50.0, 35.0))
                }
            })
            .collect();
        let store = SpectralStore::new(scans);

        // The first scan at or after 1.9 is #5, in the cycle opened by the MS1 scan #3 at 1.2
        let ms1 = extract_ms1_multiplexed(
            &store,
            &cycle,
            420.0,
            Tolerance::Da(0.01),
            1.9,
            4.5,
            ScanPolarity::Positive,
        );
        let found: Vec<(usize, f64)> = ms1.iter().map(|p| (p.index, p.intensity)).collect();
        assert_eq!(found, vec![(6, 6.0), (9, 9.0)]);
        assert!((ms1.points()[0].chrom_x - 2.4).abs() < 1e-9);

        let ms2 = extract_ms2_multiplexed(
            &store,
            &cycle,
            470.0,
            150.0,
            Tolerance::Da(0.01),
            1.9,
            4.5,
            ScanPolarity::Positive,
        );
        let found: Vec<(usize, f64)> = ms2.iter().map(|p| (p.index, p.intensity)).collect();
        assert_eq!(found, vec![(5, 5.0), (8, 8.0), (11, 11.0)]);
    }

    #[test_log::test]
    fn test_overlapping_windows_sum_lanes() {
        let (store, cycle) = swath_store(4);
        // 349.5 falls in the first two windows
        let chrom = extract_ms2_multiplexed(
            &store,
            &cycle,
            349.5,
            180.0,
            Tolerance::Da(0.01),
            0.0,
            100.0,
            ScanPolarity::Positive,
        );
        assert_eq!(chrom.len(), 4);
        assert!(chrom.iter().all(|p| p.index % 4 == 1));
        assert!(chrom.iter().all(|p| p.intensity == 6.0 && p.mz == 180.0));
    }

    #[test_log::test]
    fn test_unmapped_precursor() {
        let (store, cycle) = swath_store(4);
        let chrom = extract_ms2_multiplexed(
            &store,
            &cycle,
            900.0,
            180.0,
            Tolerance::Da(0.01),
            0.0,
            100.0,
            ScanPolarity::Positive,
        );
        assert!(chrom.is_empty());
        let chrom = extract_lane(
            &store,
            &cycle,
            &[7],
            180.0,
            Tolerance::Da(0.01),
            0.0,
            100.0,
            ScanPolarity::Positive,
        );
        assert!(chrom.is_empty());
    }

    #[test_log::test]
    fn test_aif_lanes() {
        let cycle = AcquisitionCycle::aif(&[10.0, 40.0]);
        let mut scans = Vec::new();
        for c in 0..6 {
            let t = c as f64 * 0.5;
            scans.push(Scan::from_arrays(0, 1, ScanPolarity::Positive, t, &[500.0], &[100.0]));
            scans.push(Scan::from_arrays(0, 2, ScanPolarity::Positive, t, &[150.0], &[2.0]));
            scans.push(Scan::from_arrays(0, 2, ScanPolarity::Positive, t, &[150.0], &[8.0]));
        }
        let store = SpectralStore::new(scans);
        let chrom = extract_ms2_multiplexed(
            &store,
            &cycle,
            500.0,
            150.0,
            Tolerance::Da(0.01),
            1.0,
            2.0,
            ScanPolarity::Positive,
        );
        assert_eq!(chrom.len(), 3);
        assert!(chrom.iter().all(|p| p.index % 3 == 1 && p.intensity == 10.0));
    }
}
