//! Consolidation of per-file features into cross-file aligned spots.
//!
//! An [`AlignedSpot`] holds one [`AlignedPeak`] slot per registered file. A slot
//! whose `peak_id` is negative marks a file in which the compound was not
//! detected. Reducing a spot picks its representative slot and recomputes the
//! [`SpotStatistics`] over the detected slots.
use thiserror::Error;

pub mod reducer;
pub mod spot;

pub use reducer::{reduce_spot, reduce_spots, select_representative, spot_statistics};
pub use spot::{AlignedPeak, AlignedSpot, SpotStatistics};

/// The files taking part in an alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlignmentContext {
    pub file_count: usize,
    /// When set, this file is taken as the representative of every spot it was
    /// detected in, so isotope tracking stays anchored to one file
    pub isotope_tracking_reference: Option<usize>,
}

impl AlignmentContext {
    pub fn new(file_count: usize) -> Self {
        Self {
            file_count,
            isotope_tracking_reference: None,
        }
    }

    pub fn with_isotope_tracking_reference(mut self, file_id: usize) -> Self {
        self.isotope_tracking_reference = Some(file_id);
        self
    }
}

/// Errors that may occur while reducing aligned spots
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignmentError {
    /// Every slot of the spot is absent, so there is nothing to summarize
    #[error("Spot {spot_id} has no detected peak in any of its {file_count} files")]
    NoDetectedPeaks { spot_id: usize, file_count: usize },
    /// The spot does not hold exactly one slot per file
    #[error("Spot {spot_id} has {found} slots but {expected} files are registered")]
    SlotCountMismatch {
        spot_id: usize,
        expected: usize,
        found: usize,
    },
    /// A slot names a file that is not registered, or sits in another file's position
    #[error("Spot {spot_id} cannot place a peak from file {file_id} among {file_count} files")]
    FileOutOfRange {
        spot_id: usize,
        file_id: usize,
        file_count: usize,
    },
}
