use mzpeaks::CentroidPeak;

use super::extract::extract_ms1;
use super::mobility::{accumulate_drift_ms2, drift_chromatogram};
use super::multiplexed::{extract_ms1_multiplexed, extract_ms2_multiplexed};
use super::Chromatogram;
use crate::feature::{ChromatogramPeakFeature, Feature, UNSET_ID};
use crate::params::ExtractionParameters;
use crate::spectrum::{
    centroid, isotope_window, isotopic_peaks, AcquisitionCycle, IsotopicPeak, SpectralStore,
    UNMAPPED_LANE,
};

/// Chromatogram and spectrum extraction bound to one acquisition and one set of
/// [`ExtractionParameters`].
///
/// MS1 requests go to the accumulated frames when the store has them, to the
/// survey lane when the cycle is multiplexed and to every MS1 scan otherwise.
#[derive(Debug, Clone, Copy)]
pub struct ChromatogramExtractor<'a> {
    store: &'a SpectralStore,
    cycle: &'a AcquisitionCycle,
    params: &'a ExtractionParameters,
}

impl<'a> ChromatogramExtractor<'a> {
    pub fn new(
        store: &'a SpectralStore,
        cycle: &'a AcquisitionCycle,
        params: &'a ExtractionParameters,
    ) -> Self {
        Self {
            store,
            cycle,
            params,
        }
    }

    pub fn store(&self) -> &'a SpectralStore {
        self.store
    }

    pub fn params(&self) -> &'a ExtractionParameters {
        self.params
    }

    /// The MS1 chromatogram of `target_mz` over `[start_time, end_time]`
    pub fn ms1(&self, target_mz: f64, start_time: f64, end_time: f64) -> Chromatogram {
        if self.cycle.is_multiplexed() && !self.store.has_frames() {
            extract_ms1_multiplexed(
                self.store,
                self.cycle,
                target_mz,
                self.params.ms1_tolerance,
                start_time,
                end_time,
                self.params.ion_mode,
            )
        } else {
            extract_ms1(
                self.store,
                target_mz,
                self.params.ms1_tolerance,
                start_time,
                end_time,
                self.params.ion_mode,
            )
        }
    }

    /// The chromatogram of fragment `product_mz` of `precursor_mz` from the
    /// MS2 lanes of a multiplexed acquisition
    pub fn ms2(
        &self,
        precursor_mz: f64,
        product_mz: f64,
        start_time: f64,
        end_time: f64,
    ) -> Chromatogram {
        extract_ms2_multiplexed(
            self.store,
            self.cycle,
            precursor_mz,
            product_mz,
            self.params.ms2_tolerance,
            start_time,
            end_time,
            self.params.ion_mode,
        )
    }

    /// The mobilogram of `target_mz` around the scan at `seed_index`
    pub fn mobilogram(&self, seed_index: usize, target_mz: f64) -> Chromatogram {
        drift_chromatogram(
            self.store,
            seed_index,
            target_mz,
            self.params.ms1_tolerance,
            self.params.mobility_rt_width,
            self.params.ion_mode,
        )
    }

    /// The MS2 spectrum of a feature's own drift bin, accumulated between its
    /// retention time edges. Features without a drift peak have none.
    pub fn drift_ms2_spectrum(&self, feature: &Feature) -> Option<Vec<CentroidPeak>> {
        let drift = feature.drift()?;
        let peak = feature.peak();
        // Edges may index accumulated frames, so the seed is found by time
        let top_time = peak.top.chrom_x.value;
        let hint = self.store.index_at_or_before_time(top_time);
        let frame_index = self.store.confirm_at_or_before_time(hint, top_time);
        let seed = self
            .store
            .scan_at_or_before_drift(frame_index, drift.top.chrom_x.value)
            .map(|scan| scan.index())
            .unwrap_or(frame_index);
        Some(accumulate_drift_ms2(
            self.store,
            seed,
            peak.left.chrom_x.value,
            peak.right.chrom_x.value,
            drift.drift_bin(),
            peak.mass,
            self.params.ms2_accumulation_bin,
        ))
    }

    /// The store index of the MS2 scan fragmenting `peak` in the cycle of its
    /// apex, or [`UNSET_ID`] when no lane isolates its precursor.
    ///
    /// Only meaningful for multiplexed acquisitions without accumulated frames,
    /// where a chromatogram point's index is a raw scan index.
    pub fn ms2_scan_id(&self, peak: &ChromatogramPeakFeature) -> i32 {
        if !self.cycle.is_multiplexed() || self.store.has_frames() {
            return UNSET_ID;
        }
        let lane = self.cycle.ms2_lane_id_for(peak.mass);
        if lane == UNMAPPED_LANE {
            return UNSET_ID;
        }
        let apex = peak.top.scan_id;
        let index = apex - self.cycle.lane_of(apex) + lane as usize;
        match self.store.get(index) {
            Some(scan) if scan.ms_level() > 1 => index as i32,
            _ => UNSET_ID,
        }
    }

    /// Link `peak` to the MS2 scan of its apex cycle, see [`Self::ms2_scan_id`]
    pub fn link_ms2(&self, peak: ChromatogramPeakFeature) -> ChromatogramPeakFeature {
        let id = self.ms2_scan_id(&peak);
        peak.with_ms2_raw_spectrum_id(id)
    }

    /// The centroided peaks of the scan at `index`, using the MS1 or MS2 merge
    /// width according to its level
    pub fn centroided(&self, index: usize) -> Vec<CentroidPeak> {
        let Some(scan) = self.store.get(index) else {
            return Vec::new();
        };
        let settings = &self.params.centroid;
        let mass_bin = if scan.ms_level() > 1 {
            settings.ms2_mass_bin
        } else {
            settings.ms1_mass_bin
        };
        centroid(
            scan.peaks(),
            scan.signal_continuity(),
            mass_bin,
            settings.use_peak_detection,
        )
    }

    /// The centroided isotope window of `mono_mass` in the scan at `index`
    pub fn isotope_window(&self, index: usize, mono_mass: f64) -> Vec<CentroidPeak> {
        let peaks = self.centroided(index);
        isotope_window(&peaks, mono_mass, self.params.isotope_span).to_vec()
    }

    /// The isotopic envelope of `mono_mass` in the scan at `index`
    pub fn isotopes(&self, index: usize, mono_mass: f64) -> Vec<IsotopicPeak> {
        let peaks = self.centroided(index);
        isotopic_peaks(
            &peaks,
            mono_mass,
            self.params.ms1_tolerance,
            self.params.max_isotopes,
        )
    }
}
