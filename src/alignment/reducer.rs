#[cfg(feature = "parallelism")]
use rayon::prelude::*;

use super::spot::{AlignedPeak, AlignedSpot, SpotStatistics};
use super::{AlignmentContext, AlignmentError};

/// Choose the representative slot among `slots`.
///
/// Slots with MS2 evidence are preferred when any detected slot has it. Within
/// the candidates the highest total score wins, then the tallest peak, then the
/// lowest file id. A detected isotope tracking reference file overrides all of
/// this. Returns `None` when no slot is detected.
pub fn select_representative(slots: &[AlignedPeak], context: &AlignmentContext) -> Option<usize> {
    if let Some(reference) = context.isotope_tracking_reference {
        if slots.get(reference).is_some_and(|s| s.is_detected()) {
            return Some(reference);
        }
    }
    let prefer_ms2 = slots.iter().any(|s| s.is_detected() && s.has_ms2());
    let mut best: Option<&AlignedPeak> = None;
    for slot in slots
        .iter()
        .filter(|s| s.is_detected() && (!prefer_ms2 || s.has_ms2()))
    {
        let better = match best {
            None => true,
            Some(b) => {
                slot.total_score() > b.total_score()
                    || (slot.total_score() == b.total_score() && slot.peak_height > b.peak_height)
            }
        };
        if better {
            best = Some(slot);
        }
    }
    best.map(|s| s.file_id)
}

#[derive(Debug, Clone, Copy)]
struct Summary {
    sum: f64,
    min: f64,
    max: f64,
    count: usize,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            count: 0,
        }
    }
}

impl Summary {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Compute the aggregates of a spot over its detected slots.
///
/// A spot with no detected slot has no meaningful statistics and is an error.
pub fn spot_statistics(spot_id: usize, slots: &[AlignedPeak]) -> Result<SpotStatistics, AlignmentError> {
    let mut height = Summary::default();
    let mut signal_to_noise = Summary::default();
    let mut noise = Summary::default();
    let mut width = Summary::default();
    let mut chrom_x = Summary::default();
    let mut mono = 0usize;
    let mut tallest: Option<&AlignedPeak> = None;

    for slot in slots.iter().filter(|s| s.is_detected()) {
        height.add(slot.peak_height);
        signal_to_noise.add(slot.signal_to_noise);
        noise.add(slot.estimated_noise);
        width.add(slot.peak_width());
        chrom_x.add(slot.chrom_x.value);
        if slot.isotope_weight_number == 0 {
            mono += 1;
        }
        if tallest.map_or(true, |t| slot.peak_height > t.peak_height) {
            tallest = Some(slot);
        }
    }

    let Some(tallest) = tallest else {
        return Err(AlignmentError::NoDetectedPeaks {
            spot_id,
            file_count: slots.len(),
        });
    };
    let detected = height.count;
    Ok(SpotStatistics {
        detected_count: detected,
        height_mean: height.mean(),
        height_min: height.min,
        height_max: height.max,
        signal_to_noise_mean: signal_to_noise.mean(),
        signal_to_noise_min: signal_to_noise.min,
        signal_to_noise_max: signal_to_noise.max,
        estimated_noise_mean: noise.mean(),
        estimated_noise_min: noise.min,
        estimated_noise_max: noise.max,
        peak_width_mean: width.mean(),
        chrom_x_earliest: chrom_x.min,
        chrom_x_latest: chrom_x.max,
        mass_center: tallest.mass,
        fill_percentage: detected as f64 / slots.len() as f64,
        mono_isotopic_percentage: mono as f64 / detected as f64,
    })
}

/// Pick the representative of `spot`, copy its identity onto the spot and
/// recompute the spot's statistics.
///
/// The spot is only modified when the reduction succeeds.
pub fn reduce_spot(spot: &mut AlignedSpot, context: &AlignmentContext) -> Result<(), AlignmentError> {
    if context.file_count != spot.file_count() {
        return Err(AlignmentError::SlotCountMismatch {
            spot_id: spot.spot_id,
            expected: context.file_count,
            found: spot.file_count(),
        });
    }
    let statistics = spot_statistics(spot.spot_id, spot.slots())?;
    let representative = select_representative(spot.slots(), context);
    // Statistics succeeding guarantees a detected slot, and with it a representative
    let Some(slot) = representative.and_then(|i| spot.slot(i)) else {
        return Err(AlignmentError::NoDetectedPeaks {
            spot_id: spot.spot_id,
            file_count: spot.file_count(),
        });
    };
    let identification = slot.identification.clone();
    let adduct = slot.adduct.clone();
    let chrom_x = slot.chrom_x;

    spot.representative_file_id = representative;
    spot.identification = identification;
    spot.adduct = adduct;
    spot.chrom_x = chrom_x;
    spot.statistics = statistics;
    Ok(())
}

/// Reduce every spot in `spots`, stopping at the first spot that fails
#[cfg(not(feature = "parallelism"))]
pub fn reduce_spots(spots: &mut [AlignedSpot], context: &AlignmentContext) -> Result<(), AlignmentError> {
    spots.iter_mut().try_for_each(|spot| {
        reduce_spot(spot, context).inspect_err(|e| log::error!("Failed to reduce spot: {e}"))
    })
}

/// Reduce every spot in `spots`, stopping at the first spot that fails
#[cfg(feature = "parallelism")]
pub fn reduce_spots(spots: &mut [AlignedSpot], context: &AlignmentContext) -> Result<(), AlignmentError> {
    spots.par_iter_mut().try_for_each(|spot| {
        reduce_spot(spot, context).inspect_err(|e| log::error!("Failed to reduce spot: {e}"))
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::annotation::AnnotationCode;
    use crate::feature::ChromX;

    fn detected(file_id: usize, height: f64, score: f64) -> AlignedPeak {
        let mut peak = AlignedPeak::absent(file_id);
        peak.peak_id = 10 + file_id as i32;
        peak.mass = 500.0 + file_id as f64 / 100.0;
        peak.peak_height = height;
        peak.signal_to_noise = height / 10.0;
        peak.estimated_noise = 10.0;
        peak.chrom_x = ChromX::retention_time(2.0 + file_id as f64);
        peak.chrom_x_left = ChromX::retention_time(1.0);
        peak.chrom_x_right = ChromX::retention_time(1.5);
        peak.identification.total_score = score;
        peak
    }

    #[test]
    fn test_prefers_ms2_evidence() {
        let context = AlignmentContext::new(4);
        let mut file_2 = detected(2, 50.0, 85.0);
        file_2.ms2_raw_spectrum_id = 12;
        file_2.identification.name = "PC 34:1".to_string();
        file_2.identification.code = AnnotationCode::Spectrum;
        let slots = vec![
            AlignedPeak::absent(0),
            detected(1, 900.0, 0.0),
            file_2,
            detected(3, 20.0, 60.0),
        ];
        assert_eq!(select_representative(&slots, &context), Some(2));

        let spot = AlignedSpot::from_slots(7, slots, &context).unwrap();
        assert_eq!(spot.representative_file_id(), Some(2));
        assert_eq!(spot.identification().name, "PC 34:1");
        assert_eq!(spot.identification().code.code(), 430);
        assert_eq!(spot.chrom_x().value, 4.0);
    }

    #[test]
    fn test_ms2_file_among_three() {
        let context = AlignmentContext::new(3);
        let mut with_ms2 = detected(1, 100.0, 85.0);
        with_ms2.ms2_raw_spectrum_id = 4;
        let slots = vec![detected(0, 100.0, 0.0), with_ms2, detected(2, 100.0, 60.0)];
        assert_eq!(select_representative(&slots, &context), Some(1));

        let spot = AlignedSpot::from_slots(0, slots, &context).unwrap();
        assert_eq!(spot.representative_file_id(), Some(1));
        assert_eq!(spot.representative().map(|p| p.total_score()), Some(85.0));
    }

    #[test]
    fn test_score_then_height_then_file() {
        let context = AlignmentContext::new(3);
        let slots = vec![detected(0, 10.0, 60.0), detected(1, 20.0, 60.0), detected(2, 5.0, 10.0)];
        assert_eq!(select_representative(&slots, &context), Some(1));
        let slots = vec![detected(0, 20.0, 60.0), detected(1, 20.0, 60.0), detected(2, 5.0, 10.0)];
        assert_eq!(select_representative(&slots, &context), Some(0));
        let slots = vec![AlignedPeak::absent(0), AlignedPeak::absent(1)];
        assert_eq!(select_representative(&slots, &AlignmentContext::new(2)), None);
    }

    #[test]
    fn test_isotope_tracking_reference() {
        let slots = vec![detected(0, 10.0, 90.0), detected(1, 5.0, 1.0), AlignedPeak::absent(2)];
        let context = AlignmentContext::new(3).with_isotope_tracking_reference(1);
        assert_eq!(select_representative(&slots, &context), Some(1));
        let context = AlignmentContext::new(3).with_isotope_tracking_reference(2);
        assert_eq!(select_representative(&slots, &context), Some(0));
    }

    #[test]
    fn test_statistics() {
        let mut slots: Vec<AlignedPeak> = (0..10).map(AlignedPeak::absent).collect();
        for (i, h) in [(0, 100.0), (2, 400.0), (3, 200.0), (5, 300.0), (6, 100.0), (8, 500.0), (9, 200.0)] {
            slots[i] = detected(i, h, 0.0);
        }
        slots[9].isotope_weight_number = 1;
        let stats = spot_statistics(0, &slots).unwrap();
        assert_eq!(stats.detected_count, 7);
        assert_eq!(stats.fill_percentage, 0.7);
        assert_eq!(stats.height_mean, 1800.0 / 7.0);
        assert_eq!(stats.height_min, 100.0);
        assert_eq!(stats.height_max, 500.0);
        assert_eq!(stats.signal_to_noise_max, 50.0);
        assert_eq!(stats.estimated_noise_mean, 10.0);
        assert_eq!(stats.peak_width_mean, 0.5);
        assert_eq!(stats.chrom_x_earliest, 2.0);
        assert_eq!(stats.chrom_x_latest, 11.0);
        // the tallest slot's mass, not an average
        assert_eq!(stats.mass_center, slots[8].mass);
        assert_eq!(stats.mono_isotopic_percentage, 6.0 / 7.0);
    }

    #[test_log::test]
    fn test_fail_fast() {
        let slots: Vec<AlignedPeak> = (0..3).map(AlignedPeak::absent).collect();
        assert_eq!(
            spot_statistics(4, &slots),
            Err(AlignmentError::NoDetectedPeaks {
                spot_id: 4,
                file_count: 3
            })
        );
        let context = AlignmentContext::new(3);
        let mut spots = vec![
            AlignedSpot::from_slots(0, vec![detected(0, 1.0, 1.0), AlignedPeak::absent(1), AlignedPeak::absent(2)], &context)
                .unwrap(),
            AlignedSpot::new(1, 3),
        ];
        assert!(reduce_spots(&mut spots, &context).is_err());
        let mut spots = vec![AlignedSpot::new(0, 2)];
        assert!(matches!(
            reduce_spots(&mut spots, &context),
            Err(AlignmentError::SlotCountMismatch { expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn test_reduce_many() {
        let context = AlignmentContext::new(2);
        let mut spots: Vec<AlignedSpot> = (0..16)
            .map(|i| {
                let mut spot = AlignedSpot::new(i, 2);
                spot.replace_slot(detected(i % 2, 10.0 + i as f64, 1.0), &context).unwrap();
                spot
            })
            .collect();
        reduce_spots(&mut spots, &context).unwrap();
        for (i, spot) in spots.iter().enumerate() {
            assert_eq!(spot.representative_file_id(), Some(i % 2));
            assert_eq!(spot.statistics().fill_percentage, 0.5);
        }
    }
}
