use std::mem;

use super::reducer::reduce_spot;
use super::{AlignmentContext, AlignmentError};
use crate::feature::{AdductIon, ChromX, Feature, Identification, UNSET_ID};

/// One file's contribution to an aligned spot
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlignedPeak {
    pub file_id: usize,
    /// The per-file peak id, negative when the compound was not detected in this file
    pub peak_id: i32,
    pub mass: f64,
    pub chrom_x: ChromX,
    pub chrom_x_left: ChromX,
    pub chrom_x_right: ChromX,
    pub peak_height: f64,
    pub peak_area: f64,
    pub signal_to_noise: f64,
    pub estimated_noise: f64,
    pub isotope_weight_number: i32,
    pub ms2_raw_spectrum_id: i32,
    pub adduct: AdductIon,
    pub identification: Identification,
}

impl AlignedPeak {
    /// The slot of a file in which the compound was not detected
    pub fn absent(file_id: usize) -> Self {
        Self {
            file_id,
            peak_id: UNSET_ID,
            mass: 0.0,
            chrom_x: ChromX::default(),
            chrom_x_left: ChromX::default(),
            chrom_x_right: ChromX::default(),
            peak_height: 0.0,
            peak_area: 0.0,
            signal_to_noise: 0.0,
            estimated_noise: 0.0,
            isotope_weight_number: 0,
            ms2_raw_spectrum_id: UNSET_ID,
            adduct: AdductIon::unknown(),
            identification: Identification::default(),
        }
    }

    pub fn from_feature(file_id: usize, feature: &Feature) -> Self {
        let peak = feature.peak();
        Self {
            file_id,
            peak_id: peak.peak_id,
            mass: peak.mass,
            chrom_x: peak.top.chrom_x,
            chrom_x_left: peak.left.chrom_x,
            chrom_x_right: peak.right.chrom_x,
            peak_height: peak.peak_height(),
            peak_area: peak.area_above_zero,
            signal_to_noise: peak.shape.signal_to_noise,
            estimated_noise: peak.shape.estimated_noise,
            isotope_weight_number: peak.isotope_weight_number,
            ms2_raw_spectrum_id: peak.ms2_raw_spectrum_id,
            adduct: peak.adduct.clone(),
            identification: peak.identification().clone(),
        }
    }

    #[inline]
    pub fn is_detected(&self) -> bool {
        self.peak_id >= 0
    }

    #[inline]
    pub fn has_ms2(&self) -> bool {
        self.ms2_raw_spectrum_id >= 0
    }

    #[inline]
    pub fn total_score(&self) -> f64 {
        self.identification.total_score
    }

    pub fn peak_width(&self) -> f64 {
        self.chrom_x_right.value - self.chrom_x_left.value
    }
}

/// Aggregates over the detected slots of a spot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpotStatistics {
    pub detected_count: usize,
    pub height_mean: f64,
    pub height_min: f64,
    pub height_max: f64,
    pub signal_to_noise_mean: f64,
    pub signal_to_noise_min: f64,
    pub signal_to_noise_max: f64,
    pub estimated_noise_mean: f64,
    pub estimated_noise_min: f64,
    pub estimated_noise_max: f64,
    pub peak_width_mean: f64,
    pub chrom_x_earliest: f64,
    pub chrom_x_latest: f64,
    /// The mass of the tallest detected slot
    pub mass_center: f64,
    /// Detected slots over all slots, from 0 to 1
    pub fill_percentage: f64,
    /// The share of detected slots that are monoisotopic, from 0 to 1
    pub mono_isotopic_percentage: f64,
}

/// A compound consolidated across every file of an alignment
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlignedSpot {
    pub spot_id: usize,
    slots: Vec<AlignedPeak>,
    pub(crate) representative_file_id: Option<usize>,
    pub(crate) chrom_x: ChromX,
    pub(crate) adduct: AdductIon,
    pub(crate) identification: Identification,
    pub(crate) statistics: SpotStatistics,
}

impl AlignedSpot {
    /// A spot with an absent slot for each of `file_count` files
    pub fn new(spot_id: usize, file_count: usize) -> Self {
        Self {
            spot_id,
            slots: (0..file_count).map(AlignedPeak::absent).collect(),
            representative_file_id: None,
            chrom_x: ChromX::default(),
            adduct: AdductIon::unknown(),
            identification: Identification::default(),
            statistics: SpotStatistics::default(),
        }
    }

    /// Build a spot from one slot per file and reduce it.
    ///
    /// The slots must be ordered by file, the `i`-th slot belonging to file `i`.
    pub fn from_slots(
        spot_id: usize,
        slots: Vec<AlignedPeak>,
        context: &AlignmentContext,
    ) -> Result<Self, AlignmentError> {
        if let Some(slot) = slots.iter().enumerate().find(|(i, s)| s.file_id != *i).map(|(_, s)| s) {
            return Err(AlignmentError::FileOutOfRange {
                spot_id,
                file_id: slot.file_id,
                file_count: slots.len(),
            });
        }
        let mut spot = Self::new(spot_id, 0);
        spot.slots = slots;
        reduce_spot(&mut spot, context)?;
        Ok(spot)
    }

    pub fn slots(&self) -> &[AlignedPeak] {
        &self.slots
    }

    pub fn slot(&self, file_id: usize) -> Option<&AlignedPeak> {
        self.slots.get(file_id)
    }

    pub fn file_count(&self) -> usize {
        self.slots.len()
    }

    pub fn detected(&self) -> impl Iterator<Item = &AlignedPeak> {
        self.slots.iter().filter(|s| s.is_detected())
    }

    pub fn representative_file_id(&self) -> Option<usize> {
        self.representative_file_id
    }

    pub fn representative(&self) -> Option<&AlignedPeak> {
        self.representative_file_id.and_then(|i| self.slots.get(i))
    }

    /// The chromatographic position of the representative slot
    pub fn chrom_x(&self) -> ChromX {
        self.chrom_x
    }

    pub fn adduct(&self) -> &AdductIon {
        &self.adduct
    }

    pub fn identification(&self) -> &Identification {
        &self.identification
    }

    pub fn statistics(&self) -> &SpotStatistics {
        &self.statistics
    }

    /// Put `peak` into the slot of its file and reduce the spot again.
    ///
    /// When the spot cannot be reduced with the new slot, for instance because it
    /// would leave no detected peak, the previous slot is restored and the spot is
    /// left as it was.
    pub fn replace_slot(
        &mut self,
        peak: AlignedPeak,
        context: &AlignmentContext,
    ) -> Result<AlignedPeak, AlignmentError> {
        let file_id = peak.file_id;
        let file_count = self.slots.len();
        let slot = self
            .slots
            .get_mut(file_id)
            .ok_or(AlignmentError::FileOutOfRange {
                spot_id: self.spot_id,
                file_id,
                file_count,
            })?;
        let previous = mem::replace(slot, peak);
        match reduce_spot(self, context) {
            Ok(()) => Ok(previous),
            Err(e) => {
                log::warn!("Rolling back slot {file_id} of spot {}: {e}", self.spot_id);
                self.slots[file_id] = previous;
                Err(e)
            }
        }
    }
}
