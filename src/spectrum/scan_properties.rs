use std::fmt::{self, Display};

/**
Describes the polarity of a mass spectrum. A spectrum is either `Positive` (1+), `Negative` (-1)
or `Unknown` (0). The `Unknown` state is the default.
*/
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScanPolarity {
    #[default]
    Unknown = 0,
    Positive = 1,
    Negative = -1,
}

impl ScanPolarity {
    /// The sign of the charge an ion of this polarity carries
    pub fn sign(&self) -> i32 {
        *self as i8 as i32
    }
}

impl Display for ScanPolarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanPolarity::Unknown => write!(f, "Unknown"),
            ScanPolarity::Positive => write!(f, "Positive"),
            ScanPolarity::Negative => write!(f, "Negative"),
        }
    }
}

/**
Describes the initial representation of the signal of a spectrum.

Though most formats explicitly have a method of either conveying a processing level
or an assumed level, the `Unknown` option is retained for partial initialization.
*/
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalContinuity {
    #[default]
    Unknown = 0,
    Centroid = 3,
    Profile = 5,
}

#[derive(Default, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// The interval around the precursor ion that was isolated before fragmentation.
///
/// Unlike a fully resolved isolation window, the bounds are stored as offsets from
/// the target the way acquisition methods report them.
pub struct PrecursorWindow {
    pub target: f64,
    /// Distance below `target` included in the window
    pub lower_offset: f64,
    /// Distance above `target` included in the window
    pub upper_offset: f64,
    pub collision_energy: f32,
}

impl PrecursorWindow {
    pub fn new(target: f64, lower_offset: f64, upper_offset: f64, collision_energy: f32) -> Self {
        Self {
            target,
            lower_offset,
            upper_offset,
            collision_energy,
        }
    }

    /// A window centered on `target` with half-width `width / 2`
    pub fn centered(target: f64, width: f64, collision_energy: f32) -> Self {
        Self::new(target, width / 2.0, width / 2.0, collision_energy)
    }

    #[inline]
    pub fn lower_bound(&self) -> f64 {
        self.target - self.lower_offset
    }

    #[inline]
    pub fn upper_bound(&self) -> f64 {
        self.target + self.upper_offset
    }

    /// Test whether `mz` falls in the closed isolation interval
    #[inline]
    pub fn contains(&self, mz: f64) -> bool {
        crate::utils::in_closed(mz, self.lower_bound(), self.upper_bound())
    }
}
