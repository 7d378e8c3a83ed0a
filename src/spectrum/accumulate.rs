use std::collections::BTreeMap;

use mzpeaks::CentroidPeak;

use super::scan::Scan;
use super::scan_properties::ScanPolarity;
use super::store::first_at_or_after_time;

#[derive(Debug, Default, Clone, Copy)]
struct BinTotal {
    intensity: f64,
    base_mz: f64,
    base_intensity: f32,
}

/// Sums peaks from many scans into fixed-width m/z bins.
///
/// Each output peak carries the total intensity of its bin at the m/z of the most
/// intense contribution. Ties on intensity keep the lower m/z, so the result does
/// not depend on the order scans are added in.
#[derive(Debug, Clone)]
pub struct SpectrumAccumulator {
    bin_width: f64,
    bins: BTreeMap<i64, BinTotal>,
    scans_added: usize,
}

impl SpectrumAccumulator {
    pub fn new(bin_width: f64) -> Self {
        let bin_width = if bin_width > 0.0 && bin_width.is_finite() {
            bin_width
        } else {
            log::warn!("Invalid accumulation bin width {bin_width}, using 1 Da");
            1.0
        };
        Self {
            bin_width,
            bins: BTreeMap::new(),
            scans_added: 0,
        }
    }

    #[inline]
    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    /// The bin `mz` falls into, `round(mz / bin_width)`
    #[inline]
    pub fn bin_of(&self, mz: f64) -> i64 {
        (mz / self.bin_width).round() as i64
    }

    pub fn add_peaks(&mut self, peaks: &[CentroidPeak]) {
        for peak in peaks {
            let key = self.bin_of(peak.mz);
            let total = self.bins.entry(key).or_default();
            total.intensity += peak.intensity as f64;
            let replaces = total.base_intensity < peak.intensity
                || (total.base_intensity == peak.intensity && peak.mz < total.base_mz)
                || total.base_mz == 0.0;
            if replaces {
                total.base_intensity = peak.intensity;
                total.base_mz = peak.mz;
            }
        }
        self.scans_added += 1;
    }

    pub fn add_scan(&mut self, scan: &Scan) {
        self.add_peaks(scan.peaks())
    }

    /// The number of peak lists added so far
    pub fn scans_added(&self) -> usize {
        self.scans_added
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Drain the bins into an m/z-sorted peak list
    pub fn into_peaks(self) -> Vec<CentroidPeak> {
        let mut peaks: Vec<CentroidPeak> = self
            .bins
            .into_values()
            .map(|b| CentroidPeak::new(b.base_mz, b.intensity as f32, 0))
            .collect();
        peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));
        for (i, p) in peaks.iter_mut().enumerate() {
            p.index = i as mzpeaks::IndexType;
        }
        peaks
    }
}

/// Sum every scan of `ms_level` and `polarity` acquired within the closed time
/// range `[start_time, end_time]` into one spectrum binned at `mass_bin`.
pub fn accumulate_spectrum(
    scans: &[Scan],
    start_time: f64,
    end_time: f64,
    ms_level: u8,
    polarity: ScanPolarity,
    mass_bin: f64,
) -> Vec<CentroidPeak> {
    if scans.is_empty() || end_time < start_time {
        return Vec::new();
    }
    let mut acc = SpectrumAccumulator::new(mass_bin);
    let i = first_at_or_after_time(scans, start_time);
    for scan in &scans[i..] {
        if scan.time() > end_time {
            break;
        }
        if scan.time() < start_time || scan.ms_level() != ms_level || scan.polarity() != polarity {
            continue;
        }
        acc.add_scan(scan);
    }
    log::trace!(
        "Accumulated {} scans between {start_time} and {end_time}",
        acc.scans_added()
    );
    acc.into_peaks()
}
