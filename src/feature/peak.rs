use std::fmt::{self, Display};

use crate::annotation::AnnotationCode;
use crate::chromatogram::ChromatogramKind;
use crate::spectrum::scan::drift_bin;
use crate::spectrum::ScanPolarity;

/// The sentinel for integer identification fields that have not been set
pub const UNSET_ID: i32 = -1;

/// The sentinel for scores and physical values that have not been measured. Zero
/// is a legitimate similarity score, so it can never mean "missing".
pub const UNSET_VALUE: f64 = -1.0;

/// The dimension a [`ChromX`] is measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChromXType {
    #[default]
    RetentionTime,
    DriftTime,
}

/// A chromatographic coordinate tagged with its dimension
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChromX {
    pub value: f64,
    pub kind: ChromXType,
}

impl ChromX {
    pub fn new(value: f64, kind: ChromXType) -> Self {
        Self { value, kind }
    }

    pub fn retention_time(value: f64) -> Self {
        Self::new(value, ChromXType::RetentionTime)
    }

    pub fn drift_time(value: f64) -> Self {
        Self::new(value, ChromXType::DriftTime)
    }

    /// The coordinate type a chromatogram of `kind` is measured in
    pub fn type_for(kind: ChromatogramKind) -> ChromXType {
        match kind {
            ChromatogramKind::Mobilogram => ChromXType::DriftTime,
            _ => ChromXType::RetentionTime,
        }
    }
}

impl Display for ChromX {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ChromXType::RetentionTime => write!(f, "RT {:.3} min", self.value),
            ChromXType::DriftTime => write!(f, "DT {:.3} ms", self.value),
        }
    }
}

/// One edge or the apex of a chromatographic peak
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeakEdge {
    /// The index of the scan in the store
    pub scan_id: usize,
    pub chrom_x: ChromX,
    pub intensity: f64,
}

impl PeakEdge {
    pub fn new(scan_id: usize, chrom_x: ChromX, intensity: f64) -> Self {
        Self {
            scan_id,
            chrom_x,
            intensity,
        }
    }
}

/// Peak shape descriptors, carried over from detection unchanged
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeakShape {
    pub estimated_noise: f64,
    pub signal_to_noise: f64,
    pub symmetry: f64,
    pub ideal_slope: f64,
    pub sharpness: f64,
    pub gaussian_similarity: f64,
    pub peak_pure_value: f64,
}

/// An adduct ion form, such as `[M+H]+`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdductIon {
    pub name: String,
    /// Mass added to the neutral molecule per molecule
    pub mass_shift: f64,
    pub charge: i32,
    /// The number of molecules in the ion
    pub multimer: u32,
}

impl AdductIon {
    pub fn new(name: impl Into<String>, mass_shift: f64, charge: i32, multimer: u32) -> Self {
        Self {
            name: name.into(),
            mass_shift,
            charge,
            multimer: multimer.max(1),
        }
    }

    /// The default adduct for `polarity`, `[M+H]+` or `[M-H]-`
    pub fn default_for(polarity: ScanPolarity) -> Self {
        match polarity {
            ScanPolarity::Negative => Self::new("[M-H]-", -crate::utils::PROTON, -1, 1),
            _ => Self::new("[M+H]+", crate::utils::PROTON, 1, 1),
        }
    }

    /// An adduct that has not been assigned
    pub fn unknown() -> Self {
        Self {
            name: String::new(),
            mass_shift: 0.0,
            charge: 0,
            multimer: 1,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.name.is_empty()
    }
}

impl Default for AdductIon {
    fn default() -> Self {
        Self::unknown()
    }
}

impl Display for AdductIon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The identification assigned to a feature by library matching.
///
/// Text fields are empty and numeric fields are `-1` until a match is recorded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identification {
    pub name: String,
    pub formula: String,
    pub ontology: String,
    pub smiles: String,
    pub inchikey: String,
    /// The library record id of the best match, or `-1`
    pub matched_reference_id: i32,
    pub total_score: f64,
    pub spectrum_similarity: f64,
    pub rt_similarity: f64,
    pub ccs_similarity: f64,
    pub code: AnnotationCode,
}

impl Default for Identification {
    fn default() -> Self {
        Self {
            name: String::new(),
            formula: String::new(),
            ontology: String::new(),
            smiles: String::new(),
            inchikey: String::new(),
            matched_reference_id: UNSET_ID,
            total_score: UNSET_VALUE,
            spectrum_similarity: UNSET_VALUE,
            rt_similarity: UNSET_VALUE,
            ccs_similarity: UNSET_VALUE,
            code: AnnotationCode::Unannotated,
        }
    }
}

impl Identification {
    pub fn is_identified(&self) -> bool {
        self.matched_reference_id >= 0
    }
}

/// A chromatographic peak detected in one analytical file
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChromatogramPeakFeature {
    /// The id of the peak within its file, `-1` when unassigned
    pub peak_id: i32,
    pub left: PeakEdge,
    pub top: PeakEdge,
    pub right: PeakEdge,
    pub area_above_zero: f64,
    pub area_above_baseline: f64,
    /// The precursor m/z of the feature
    pub mass: f64,
    pub polarity: ScanPolarity,
    pub shape: PeakShape,
    /// The index of a representative MS2 scan, `-1` without MS2 evidence
    pub ms2_raw_spectrum_id: i32,
    /// `0` for the monoisotopic peak, `k` for the `k`-th isotope
    pub isotope_weight_number: i32,
    /// The peak id of the monoisotopic peak this is an isotope of, `-1` when unset
    pub isotope_parent_peak_id: i32,
    pub adduct: AdductIon,
    pub(crate) identification: Identification,
}

impl ChromatogramPeakFeature {
    #[inline]
    pub fn peak_height(&self) -> f64 {
        self.top.intensity
    }

    /// The width of the peak in its chromatographic dimension
    #[inline]
    pub fn peak_width(&self) -> f64 {
        self.right.chrom_x.value - self.left.chrom_x.value
    }

    pub fn has_ms2(&self) -> bool {
        self.ms2_raw_spectrum_id >= 0
    }

    /// Read-only access to the library identification. It is written only by
    /// [`annotate`](crate::annotation::annotate).
    pub fn identification(&self) -> &Identification {
        &self.identification
    }

    pub fn with_ms2_raw_spectrum_id(mut self, id: i32) -> Self {
        self.ms2_raw_spectrum_id = id;
        self
    }

    pub fn with_isotope(mut self, weight_number: i32, parent_peak_id: i32) -> Self {
        self.isotope_weight_number = weight_number;
        self.isotope_parent_peak_id = parent_peak_id;
        self
    }

    pub fn with_adduct(mut self, adduct: AdductIon) -> Self {
        self.adduct = adduct;
        self
    }
}

/// The drift-time peak of a feature observed in an ion mobility acquisition
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriftFeature {
    pub left: PeakEdge,
    pub top: PeakEdge,
    pub right: PeakEdge,
    pub area_above_zero: f64,
    /// Collision cross section, `-1` until calibrated
    pub ccs: f64,
}

impl DriftFeature {
    /// The integer drift bin of the apex, matching [`Scan::drift_bin`](crate::spectrum::Scan::drift_bin)
    pub fn drift_bin(&self) -> i64 {
        drift_bin(self.top.chrom_x.value)
    }

    pub fn with_ccs(mut self, ccs: f64) -> Self {
        self.ccs = ccs;
        self
    }

    pub fn has_ccs(&self) -> bool {
        self.ccs > 0.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_identification_sentinels() {
        let ident = Identification::default();
        assert_eq!(ident.matched_reference_id, -1);
        assert_eq!(ident.total_score, -1.0);
        assert_eq!(ident.spectrum_similarity, -1.0);
        assert!(ident.name.is_empty());
        assert!(!ident.is_identified());
        assert_eq!(ident.code, AnnotationCode::Unannotated);
    }

    #[test]
    fn test_adducts() {
        let a = AdductIon::default_for(ScanPolarity::Negative);
        assert_eq!(a.to_string(), "[M-H]-");
        assert_eq!(a.charge, -1);
        assert!(AdductIon::default().is_unknown());
        assert_eq!(AdductIon::new("[2M+H]+", 1.007, 1, 0).multimer, 1);
    }

    #[test]
    fn test_chrom_x() {
        assert_eq!(ChromX::type_for(ChromatogramKind::Mobilogram), ChromXType::DriftTime);
        assert_eq!(ChromX::type_for(ChromatogramKind::Eic), ChromXType::RetentionTime);
        assert_eq!(ChromX::retention_time(1.23456).to_string(), "RT 1.235 min");
    }
}
