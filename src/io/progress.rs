use std::sync::atomic::{AtomicU32, Ordering};

/// Receives progress reports, as a percentage from 0 to 100.
///
/// Reports may arrive from several threads at once. A sink that renders them
/// is responsible for its own serialization.
pub trait ProgressSink: Sync {
    fn report(&self, percent: u32);
}

/// Discards every report
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _percent: u32) {}
}

/// A progress value that only ever moves forward.
///
/// A late report from a slow thread never lowers the value another thread
/// already set.
#[derive(Debug, Default)]
pub struct AtomicProgress {
    value: AtomicU32,
}

impl AtomicProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u32 {
        self.value.load(Ordering::Acquire)
    }
}

impl ProgressSink for AtomicProgress {
    fn report(&self, percent: u32) {
        self.value.fetch_max(percent.min(100), Ordering::AcqRel);
    }
}

impl<T: ProgressSink + ?Sized> ProgressSink for &T {
    fn report(&self, percent: u32) {
        (**self).report(percent)
    }
}

/// The percentage of `total` that `done` represents, rounded down
pub(crate) fn percent_of(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u32
}

#[cfg(test)]
mod test {
    use std::thread;

    use super::*;

    #[test]
    fn test_monotonic() {
        let progress = AtomicProgress::new();
        progress.report(40);
        progress.report(10);
        assert_eq!(progress.get(), 40);
        progress.report(250);
        assert_eq!(progress.get(), 100);
    }

    #[test]
    fn test_concurrent_reports() {
        let progress = AtomicProgress::new();
        thread::scope(|scope| {
            for t in 0..4u32 {
                let progress = &progress;
                scope.spawn(move || {
                    for p in (0..=100).rev().skip(t as usize) {
                        progress.report(p);
                    }
                });
            }
        });
        assert_eq!(progress.get(), 100);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(1, 3), 33);
        assert_eq!(percent_of(3, 3), 100);
        assert_eq!(percent_of(0, 0), 100);
    }
}
