use std::ops::Range;
use std::slice;

use log::warn;

use super::scan::Scan;
use super::search::{bounded_lower_bound, confirm_at_or_before, confirm_lower_bound};

/// Find a lower-bound hint for `time` in a time-ordered scan list.
///
/// This is not searched to convergence; pair it with [`confirm_time`].
#[inline]
pub fn time_hint(scans: &[Scan], time: f64) -> usize {
    bounded_lower_bound(scans.len(), |i| scans[i].time(), time)
}

/// Correct a [`time_hint`] to the greatest index whose time is `<= time`, or `0`.
#[inline]
pub fn confirm_time(scans: &[Scan], hint: usize, time: f64) -> usize {
    confirm_at_or_before(scans.len(), |i| scans[i].time(), hint, time)
}

/// The first index whose time is `>= time`, or `scans.len()` when every scan
/// precedes it. Ties at `time` resolve to the earliest of them.
pub fn first_at_or_after_time(scans: &[Scan], time: f64) -> usize {
    let hint = time_hint(scans, time);
    confirm_lower_bound(scans.len(), |i| scans[i].time(), hint, time)
}

/// A random-access, time-ordered collection of scans from a single acquisition.
///
/// Ion mobility acquisitions also carry a list of pre-accumulated MS1 *frames*,
/// one per retention time, which is what MS1 chromatograms are built from when
/// present.
#[derive(Debug, Default, Clone)]
pub struct SpectralStore {
    scans: Vec<Scan>,
    frames: Option<Vec<Scan>>,
}

fn reindex(scans: &mut [Scan], label: &str) {
    let mut out_of_order = 0usize;
    let mut last_time = f64::NEG_INFINITY;
    for (i, scan) in scans.iter_mut().enumerate() {
        if scan.index() != i {
            scan.set_index(i);
        }
        if scan.time() < last_time {
            out_of_order += 1;
        }
        last_time = scan.time();
    }
    if out_of_order > 0 {
        warn!(
            "{out_of_order} {label} were acquired before their predecessor, time lookups will rely on linear confirmation"
        );
    }
}

impl SpectralStore {
    /// Build a store from scans in acquisition order. Each scan's index is
    /// reassigned to its position.
    pub fn new(mut scans: Vec<Scan>) -> Self {
        reindex(&mut scans, "scans");
        Self {
            scans,
            frames: None,
        }
    }

    /// Attach the pre-accumulated MS1 frames of an ion mobility acquisition
    pub fn with_frames(mut self, mut frames: Vec<Scan>) -> Self {
        reindex(&mut frames, "frames");
        self.frames = Some(frames);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.scans.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Scan> {
        self.scans.get(index)
    }

    pub fn scans(&self) -> &[Scan] {
        &self.scans
    }

    pub fn iter(&self) -> slice::Iter<'_, Scan> {
        self.scans.iter()
    }

    pub fn frames(&self) -> Option<&[Scan]> {
        self.frames.as_deref()
    }

    pub fn has_frames(&self) -> bool {
        self.frames.is_some()
    }

    /// The scans MS1 chromatograms are drawn from: the accumulated frames
    /// when present, otherwise every scan.
    pub fn ms1_source(&self) -> &[Scan] {
        self.frames.as_deref().unwrap_or(&self.scans)
    }

    /// The first and last retention time of the store
    pub fn time_range(&self) -> Option<(f64, f64)> {
        let first = self.scans.first()?;
        let last = self.scans.last()?;
        Some((first.time(), last.time()))
    }

    /// A lower-bound hint for `time`. Below the first scan this is `0`, above the
    /// last scan it is the last index, and an empty store yields `0` too.
    pub fn index_at_or_before_time(&self, time: f64) -> usize {
        time_hint(&self.scans, time)
    }

    /// Walk outward from `hint` to the greatest index whose time is `<= time`.
    pub fn confirm_at_or_before_time(&self, hint: usize, time: f64) -> usize {
        confirm_time(&self.scans, hint, time)
    }

    /// The scan with the greatest time `<= time`, or the first scan when `time`
    /// precedes the whole store
    pub fn scan_at_or_before_time(&self, time: f64) -> Option<&Scan> {
        let hint = self.index_at_or_before_time(time);
        self.get(self.confirm_at_or_before_time(hint, time))
    }

    /// A lower-bound hint for `drift_time` within `range`, a block of scans sharing one
    /// retention time and ordered by drift time. The returned index is absolute.
    ///
    /// Scans without a drift time sort as `0`.
    pub fn index_at_or_before_drift(&self, range: Range<usize>, drift_time: f64) -> usize {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        let block = &self.scans[start..end];
        start
            + bounded_lower_bound(
                block.len(),
                |i| block[i].drift_time().unwrap_or_default(),
                drift_time,
            )
    }

    /// Walk outward from `hint` within `range` to the greatest index whose drift
    /// time is `<= drift_time`, or the start of `range` when none is.
    pub fn confirm_at_or_before_drift(
        &self,
        range: Range<usize>,
        hint: usize,
        drift_time: f64,
    ) -> usize {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        let block = &self.scans[start..end];
        start
            + confirm_at_or_before(
                block.len(),
                |i| block[i].drift_time().unwrap_or_default(),
                hint.saturating_sub(start),
                drift_time,
            )
    }

    /// Within the frame holding `index`, the scan with the greatest drift time
    /// `<= drift_time`, or the frame's first scan when `drift_time` precedes it
    pub fn scan_at_or_before_drift(&self, index: usize, drift_time: f64) -> Option<&Scan> {
        let block = self.frame_block(index);
        if block.is_empty() {
            return None;
        }
        let hint = self.index_at_or_before_drift(block.clone(), drift_time);
        self.get(self.confirm_at_or_before_drift(block, hint, drift_time))
    }

    /// The contiguous block of scans sharing the retention time of `index`, found by
    /// walking outward while the time is unchanged.
    pub fn frame_block(&self, index: usize) -> Range<usize> {
        let Some(scan) = self.get(index) else {
            return index..index;
        };
        let time = scan.time();
        let mut start = index;
        while start > 0 && self.scans[start - 1].time() == time {
            start -= 1;
        }
        let mut end = index + 1;
        while end < self.len() && self.scans[end].time() == time {
            end += 1;
        }
        start..end
    }
}

impl From<Vec<Scan>> for SpectralStore {
    fn from(value: Vec<Scan>) -> Self {
        Self::new(value)
    }
}

impl<'a> IntoIterator for &'a SpectralStore {
    type Item = &'a Scan;
    type IntoIter = slice::Iter<'a, Scan>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::spectrum::ScanPolarity;

    fn store_of(times: &[f64]) -> SpectralStore {
        times
            .iter()
            .enumerate()
            .map(|(i, t)| Scan::new(i + 100, 1, ScanPolarity::Positive, *t, vec![]))
            .collect::<Vec<_>>()
            .into()
    }

    #[test_log::test]
    fn test_reindex() {
        let store = store_of(&[0.1, 0.2, 0.3]);
        let indices: Vec<usize> = store.iter().map(|s| s.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(store.time_range(), Some((0.1, 0.3)));
    }

    #[test_log::test]
    fn test_time_lookup() {
        let store = store_of(&[1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0]);
        assert_eq!(store.index_at_or_before_time(0.5), 0);
        assert_eq!(store.index_at_or_before_time(10.0), 8);

        let hint = store.index_at_or_before_time(2.5);
        assert_eq!(store.confirm_at_or_before_time(hint, 2.5), 5);
        let hint = store.index_at_or_before_time(2.0);
        assert_eq!(store.confirm_at_or_before_time(hint, 2.0), 5);
        assert_eq!(store.scan_at_or_before_time(0.5).map(|s| s.index()), Some(0));

        assert_eq!(first_at_or_after_time(store.scans(), 2.0), 3);
        assert_eq!(first_at_or_after_time(store.scans(), 2.5), 6);
        assert_eq!(first_at_or_after_time(store.scans(), 9.0), 9);

        let empty = SpectralStore::default();
        assert_eq!(empty.index_at_or_before_time(1.0), 0);
        assert!(empty.scan_at_or_before_time(1.0).is_none());
    }

    #[test_log::test]
    fn test_out_of_order_still_confirms() {
        let store = store_of(&[1.0, 2.0, 1.9, 3.0, 4.0]);
        let hint = store.index_at_or_before_time(3.5);
        assert_eq!(store.confirm_at_or_before_time(hint, 3.5), 3);
    }

    #[test_log::test]
    fn test_drift_block() {
        let mut scans = Vec::new();
        for frame in 0..3 {
            for bin in 0..5 {
                scans.push(
                    Scan::new(0, 1, ScanPolarity::Positive, frame as f64, vec![])
                        .with_drift_time(bin as f64 * 0.1),
                );
            }
        }
        let store = SpectralStore::new(scans);
        assert_eq!(store.frame_block(7), 5..10);
        let hint = store.index_at_or_before_drift(5..10, 0.25);
        assert_eq!(hint, 7);
        assert_eq!(store.index_at_or_before_drift(5..10, 10.0), 9);
        assert_eq!(store.index_at_or_before_drift(5..10, -1.0), 5);
        assert_eq!(store.frame_block(99), 99..99);

        assert_eq!(store.scan_at_or_before_drift(8, 0.25).map(|s| s.index()), Some(7));
        assert_eq!(store.scan_at_or_before_drift(5, 0.4).map(|s| s.index()), Some(9));
        assert_eq!(store.scan_at_or_before_drift(6, 10.0).map(|s| s.index()), Some(9));
        assert_eq!(store.scan_at_or_before_drift(6, -1.0).map(|s| s.index()), Some(5));
        assert!(store.scan_at_or_before_drift(99, 0.2).is_none());
    }

    #[test]
    fn test_ms1_source() {
        let store = store_of(&[1.0, 2.0]);
        assert_eq!(store.ms1_source().len(), 2);
        let store = store.with_frames(vec![Scan::new(
            5,
            1,
            ScanPolarity::Positive,
            1.0,
            vec![],
        )]);
        assert_eq!(store.ms1_source().len(), 1);
        assert_eq!(store.ms1_source()[0].index(), 0);
    }
}
