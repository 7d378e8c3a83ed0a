//! Extracted chromatograms and the builders that produce them.
//!
//! A [`Chromatogram`] is an ordered sequence of [`ChromatogramPoint`]s. For
//! retention time traces (extracted ion, total ion and base peak chromatograms)
//! the X coordinate is the scan time in minutes; for mobilograms it is the drift
//! time.
use std::fmt::{self, Display};
use std::slice;

use mzpeaks::coordinate::Time;
use mzpeaks::feature::TimeInterval;

pub mod extract;
pub mod extractor;
pub mod mobility;
pub mod multiplexed;

pub use extract::{base_peak_chromatogram, extract_ms1, total_ion_chromatogram};
pub use extractor::ChromatogramExtractor;
pub use mobility::{accumulate_drift_ms2, drift_chromatogram, DriftBinAccumulator};
pub use multiplexed::{extract_lane, extract_ms1_multiplexed, extract_ms2_multiplexed};

/// What a chromatogram's points measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChromatogramKind {
    /// Summed intensity within an m/z window over time
    #[default]
    Eic,
    /// Total ion current over time
    Tic,
    /// Most intense peak over time
    Bpc,
    /// Summed intensity within an m/z window over drift time
    Mobilogram,
}

impl Display for ChromatogramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChromatogramKind::Eic => "extracted ion chromatogram",
            ChromatogramKind::Tic => "total ion current chromatogram",
            ChromatogramKind::Bpc => "base peak chromatogram",
            ChromatogramKind::Mobilogram => "mobilogram",
        };
        f.write_str(s)
    }
}

/// A single point of a chromatogram
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChromatogramPoint {
    /// The index of the scan the point was read from
    pub index: usize,
    /// Retention time or drift time
    pub chrom_x: f64,
    /// The m/z of the most intense contributing peak, or the target m/z when none contributed
    pub mz: f64,
    pub intensity: f64,
}

impl ChromatogramPoint {
    pub fn new(index: usize, chrom_x: f64, mz: f64, intensity: f64) -> Self {
        Self {
            index,
            chrom_x,
            mz,
            intensity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chromatogram {
    kind: ChromatogramKind,
    target_mz: f64,
    points: Vec<ChromatogramPoint>,
}

impl Chromatogram {
    pub fn new(kind: ChromatogramKind, target_mz: f64, points: Vec<ChromatogramPoint>) -> Self {
        Self {
            kind,
            target_mz,
            points,
        }
    }

    pub fn empty(kind: ChromatogramKind, target_mz: f64) -> Self {
        Self::new(kind, target_mz, Vec::new())
    }

    pub(crate) fn push(&mut self, point: ChromatogramPoint) {
        self.points.push(point);
    }

    #[inline]
    pub fn kind(&self) -> ChromatogramKind {
        self.kind
    }

    #[inline]
    pub fn target_mz(&self) -> f64 {
        self.target_mz
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[ChromatogramPoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&ChromatogramPoint> {
        self.points.get(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, ChromatogramPoint> {
        self.points.iter()
    }

    pub fn intensities(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.intensity).collect()
    }

    /// The position of the most intense point, the earliest winning ties
    pub fn apex_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, p) in self.points.iter().enumerate() {
            match best {
                Some(b) if self.points[b].intensity >= p.intensity => {}
                _ => best = Some(i),
            }
        }
        best
    }

    pub fn apex(&self) -> Option<&ChromatogramPoint> {
        self.apex_index().and_then(|i| self.points.get(i))
    }

    /// Trapezoid integration over the points at positions `start..=end`.
    ///
    /// `end` is clamped to the last point; a span with no interval in it is `0.0`.
    pub fn integrate(&self, start: usize, end: usize) -> f64 {
        let Some(last) = self.points.len().checked_sub(1) else {
            return 0.0;
        };
        let end = end.min(last);
        if start >= end {
            return 0.0;
        }
        self.points[start..=end]
            .windows(2)
            .map(|w| (w[1].chrom_x - w[0].chrom_x) * (w[0].intensity + w[1].intensity) / 2.0)
            .sum()
    }

    /// Apply a linear weighted moving average of half-width `level`.
    ///
    /// A neighbor at distance `d` is weighted `level + 1 - d`. Near the ends only
    /// the neighbors that exist are used. A `level` of zero returns a copy.
    pub fn smooth(&self, level: usize) -> Chromatogram {
        if level == 0 || self.points.len() < 2 {
            return self.clone();
        }
        let n = self.points.len();
        let points = (0..n)
            .map(|i| {
                let lo = i.saturating_sub(level);
                let hi = (i + level).min(n - 1);
                let mut total = 0.0;
                let mut weights = 0.0;
                for j in lo..=hi {
                    let w = (level + 1 - i.abs_diff(j)) as f64;
                    total += w * self.points[j].intensity;
                    weights += w;
                }
                let mut p = self.points[i];
                p.intensity = total / weights;
                p
            })
            .collect();
        Chromatogram::new(self.kind, self.target_mz, points)
    }
}

impl<'a> IntoIterator for &'a Chromatogram {
    type Item = &'a ChromatogramPoint;
    type IntoIter = slice::Iter<'a, ChromatogramPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl TimeInterval<Time> for Chromatogram {
    fn start_time(&self) -> Option<f64> {
        self.points.first().map(|p| p.chrom_x)
    }

    fn end_time(&self) -> Option<f64> {
        self.points.last().map(|p| p.chrom_x)
    }

    fn apex_time(&self) -> Option<f64> {
        self.apex().map(|p| p.chrom_x)
    }

    fn area(&self) -> f32 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.integrate(0, self.points.len() - 1) as f32
    }

    fn iter_time(&self) -> impl Iterator<Item = f64> {
        self.points.iter().map(|p| p.chrom_x)
    }
}
