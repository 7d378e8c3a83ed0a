//! Bounded binary searches over almost-sorted sequences.
//!
//! Scans from multiplexed acquisitions share or nearly share time stamps, and
//! vendors occasionally emit a lane slightly out of order. The searches here
//! therefore run a fixed number of halving steps and return a *hint*: an index
//! at or before the target under the sorted assumption. Callers confirm the
//! hint with a short linear walk ([`confirm_at_or_before`], [`confirm_lower_bound`]).
use mzpeaks::CentroidPeak;

const MIN_HALVING_STEPS: u32 = 8;
const MAX_HALVING_STEPS: u32 = 20;

/// The number of halving steps used for a sequence of `len` items,
/// its bit length clamped to `[8, 20]`
#[inline]
pub fn halving_steps(len: usize) -> u32 {
    let bits = usize::BITS - len.leading_zeros();
    bits.clamp(MIN_HALVING_STEPS, MAX_HALVING_STEPS)
}

/// Find a lower-bound hint for `target` among `len` keys given by `key_at`.
///
/// - An empty sequence yields `0`; callers must not dereference it.
/// - A target below the first key yields `0`.
/// - A target at or above the last key yields the last index.
///
/// Otherwise the returned index `i` satisfies `key_at(i) <= target` whenever
/// the keys visited were sorted. Ties are not resolved; the hint may land on any
/// member of a run of equal keys.
pub fn bounded_lower_bound<F>(len: usize, key_at: F, target: f64) -> usize
where
    F: Fn(usize) -> f64,
{
    if len == 0 {
        return 0;
    }
    let last = len - 1;
    if target < key_at(0) {
        return 0;
    }
    if target >= key_at(last) {
        return last;
    }

    let mut start = 0usize;
    let mut end = last;
    for _ in 0..halving_steps(len) {
        let mid = (start + end) / 2;
        let start_key = key_at(start);
        let mid_key = key_at(mid);
        if start_key <= target && target < mid_key {
            end = mid;
        } else if mid_key <= target && target < key_at(end) {
            start = mid;
        } else {
            // No bracket contains the target, either because the span collapsed
            // or because the keys are locally out of order.
            break;
        }
    }
    start
}

/// Walk outward from `hint` to the greatest index whose key is `<= target`,
/// or `0` when no key qualifies.
pub fn confirm_at_or_before<F>(len: usize, key_at: F, hint: usize, target: f64) -> usize
where
    F: Fn(usize) -> f64,
{
    if len == 0 {
        return 0;
    }
    let mut i = hint.min(len - 1);
    while i > 0 && key_at(i) > target {
        i -= 1;
    }
    while i + 1 < len && key_at(i + 1) <= target {
        i += 1;
    }
    i
}

/// Walk outward from `hint` to the first index whose key is `>= target`.
/// Returns `len` when every key is smaller.
pub fn confirm_lower_bound<F>(len: usize, key_at: F, hint: usize, target: f64) -> usize
where
    F: Fn(usize) -> f64,
{
    let mut i = hint.min(len);
    while i > 0 && key_at(i - 1) >= target {
        i -= 1;
    }
    while i < len && key_at(i) < target {
        i += 1;
    }
    i
}

/// A lower-bound hint for `mz` within an m/z-sorted peak list
#[inline]
pub fn index_at_or_before_mz(peaks: &[CentroidPeak], mz: f64) -> usize {
    bounded_lower_bound(peaks.len(), |i| peaks[i].mz, mz)
}

/// The index of the first peak with m/z `>= mz`, found by a bounded search
/// followed by linear confirmation
#[inline]
pub fn first_peak_at_or_above(peaks: &[CentroidPeak], mz: f64) -> usize {
    let hint = index_at_or_before_mz(peaks, mz);
    confirm_lower_bound(peaks.len(), |i| peaks[i].mz, hint, mz)
}

/// The contiguous run of peaks whose m/z lies in the closed interval `[lower, upper]`.
///
/// The scan stops at the first peak beyond `upper`.
pub fn peaks_in_window(peaks: &[CentroidPeak], lower: f64, upper: f64) -> &[CentroidPeak] {
    let start = first_peak_at_or_above(peaks, lower);
    let mut end = start;
    while end < peaks.len() && peaks[end].mz <= upper {
        end += 1;
    }
    &peaks[start..end]
}

/// The summed intensity of `peaks` and the most intense of them, the first one
/// winning ties
pub fn sum_and_base_peak(peaks: &[CentroidPeak]) -> (f64, Option<&CentroidPeak>) {
    let mut total = 0.0;
    let mut best: Option<&CentroidPeak> = None;
    for peak in peaks {
        total += peak.intensity as f64;
        match best {
            Some(b) if b.intensity >= peak.intensity => {}
            _ => best = Some(peak),
        }
    }
    (total, best)
}
