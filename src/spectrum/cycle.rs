//! The repeating acquisition cycle of a data-independent experiment.
//!
//! A SWATH or AIF run interleaves one MS1 scan with a fixed set of MS2 scans, so
//! scan `i` always belongs to lane `i mod N`. [`AcquisitionCycle`] records what
//! each lane acquires.
use std::fmt::{self, Display};

/// The sentinel lane id for "no lane", matching the downstream convention that
/// a negative MS2 id means no MS2 evidence
pub const UNMAPPED_LANE: i32 = -1;

/// What a single lane of the acquisition cycle records
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LaneKind {
    /// A full MS1 survey scan
    Ms1,
    /// A fixed precursor isolation window
    Swath { lower: f64, upper: f64 },
    /// An all-ion fragmentation scan without precursor isolation
    Aif { collision_energy: f32 },
}

impl LaneKind {
    pub fn is_ms1(&self) -> bool {
        matches!(self, Self::Ms1)
    }

    /// Whether a precursor at `mz` is fragmented in this lane
    pub fn admits_precursor(&self, mz: f64) -> bool {
        match self {
            Self::Ms1 => false,
            Self::Swath { lower, upper } => crate::utils::in_closed(mz, *lower, *upper),
            Self::Aif { .. } => true,
        }
    }
}

impl Display for LaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneKind::Ms1 => write!(f, "SCAN"),
            LaneKind::Swath { lower, upper } => write!(f, "SWATH {lower}-{upper}"),
            LaneKind::Aif { collision_energy } => write!(f, "AIF {collision_energy}"),
        }
    }
}

/// The lane layout of a multiplexed acquisition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AcquisitionCycle {
    lanes: Vec<LaneKind>,
}

impl Default for AcquisitionCycle {
    fn default() -> Self {
        Self::ms1_only()
    }
}

impl AcquisitionCycle {
    /// Create a new cycle. An empty lane list is treated as a single MS1 lane.
    pub fn new(lanes: Vec<LaneKind>) -> Self {
        if lanes.is_empty() {
            log::warn!("Acquisition cycle declared without lanes, assuming a single MS1 lane");
            return Self::ms1_only();
        }
        Self { lanes }
    }

    /// A plain data-dependent or MS1-only run
    pub fn ms1_only() -> Self {
        Self {
            lanes: vec![LaneKind::Ms1],
        }
    }

    /// One MS1 lane followed by one SWATH lane per `(lower, upper)` window
    pub fn swath(windows: &[(f64, f64)]) -> Self {
        let mut lanes = vec![LaneKind::Ms1];
        lanes.extend(
            windows
                .iter()
                .map(|(lower, upper)| LaneKind::Swath {
                    lower: *lower,
                    upper: *upper,
                }),
        );
        Self { lanes }
    }

    /// One MS1 lane followed by one AIF lane per collision energy
    pub fn aif(collision_energies: &[f32]) -> Self {
        let mut lanes = vec![LaneKind::Ms1];
        lanes.extend(collision_energies.iter().map(|ce| LaneKind::Aif {
            collision_energy: *ce,
        }));
        Self { lanes }
    }

    /// The number of lanes, `N`
    #[inline]
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn lanes(&self) -> &[LaneKind] {
        &self.lanes
    }

    /// The lane scan `scan_index` belongs to
    #[inline]
    pub fn lane_of(&self, scan_index: usize) -> usize {
        scan_index % self.lane_count()
    }

    pub fn lane_kind(&self, lane: usize) -> Option<&LaneKind> {
        self.lanes.get(lane)
    }

    pub fn is_multiplexed(&self) -> bool {
        self.lane_count() > 1
    }

    pub fn has_aif(&self) -> bool {
        self.lanes
            .iter()
            .any(|l| matches!(l, LaneKind::Aif { .. }))
    }

    /// The first MS1 lane, if any
    pub fn ms1_lane(&self) -> Option<usize> {
        self.lanes.iter().position(|l| l.is_ms1())
    }

    /// The MS2 lanes that fragment a precursor at `precursor_mz`: every SWATH lane
    /// whose window contains it, or, if none does, every AIF lane.
    pub fn ms2_lanes_for(&self, precursor_mz: f64) -> Vec<usize> {
        let swath: Vec<usize> = self
            .lanes
            .iter()
            .enumerate()
            .filter(|(_, l)| matches!(l, LaneKind::Swath { .. }) && l.admits_precursor(precursor_mz))
            .map(|(i, _)| i)
            .collect();
        if !swath.is_empty() {
            return swath;
        }
        self.lanes
            .iter()
            .enumerate()
            .filter(|(_, l)| matches!(l, LaneKind::Aif { .. }))
            .map(|(i, _)| i)
            .collect()
    }

    /// The first MS2 lane for `precursor_mz` as a sentinel-style id
    pub fn ms2_lane_id_for(&self, precursor_mz: f64) -> i32 {
        self.ms2_lanes_for(precursor_mz)
            .first()
            .map(|l| *l as i32)
            .unwrap_or(UNMAPPED_LANE)
    }

    /// The smallest scan index `>= from` that belongs to `lane`
    pub fn first_index_in_lane(&self, lane: usize, from: usize) -> usize {
        let n = self.lane_count();
        let offset = (lane + n - from % n) % n;
        from + offset
    }
}
