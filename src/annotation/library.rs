use mzpeaks::Tolerance;

use super::confidence::{classify, AnnotationCode, MatchFlags};
use crate::feature::{AdductIon, Feature};
use crate::params::CorroborationParameters;
use crate::spectrum::search::{bounded_lower_bound, confirm_lower_bound};

/// A reference compound from a spectral library.
///
/// Retention time and CCS are `-1` when the library does not record them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReferenceRecord {
    pub id: i32,
    pub name: String,
    pub formula: String,
    pub ontology: String,
    pub smiles: String,
    pub inchikey: String,
    pub retention_time: f64,
    pub ccs: f64,
    pub precursor_mz: f64,
    pub adduct: AdductIon,
}

impl ReferenceRecord {
    pub fn new(id: i32, name: impl Into<String>, precursor_mz: f64) -> Self {
        Self {
            id,
            name: name.into(),
            formula: String::new(),
            ontology: String::new(),
            smiles: String::new(),
            inchikey: String::new(),
            retention_time: -1.0,
            ccs: -1.0,
            precursor_mz,
            adduct: AdductIon::unknown(),
        }
    }

    pub fn with_retention_time(mut self, retention_time: f64) -> Self {
        self.retention_time = retention_time;
        self
    }

    pub fn with_ccs(mut self, ccs: f64) -> Self {
        self.ccs = ccs;
        self
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = formula.into();
        self
    }

    pub fn with_ontology(mut self, ontology: impl Into<String>) -> Self {
        self.ontology = ontology.into();
        self
    }

    pub fn with_structure(mut self, smiles: impl Into<String>, inchikey: impl Into<String>) -> Self {
        self.smiles = smiles.into();
        self.inchikey = inchikey.into();
        self
    }

    pub fn with_adduct(mut self, adduct: AdductIon) -> Self {
        self.adduct = adduct;
        self
    }
}

/// A read-only set of reference records ordered by precursor m/z
#[derive(Debug, Clone, Default)]
pub struct ReferenceLibrary {
    records: Vec<ReferenceRecord>,
}

impl ReferenceLibrary {
    pub fn new(mut records: Vec<ReferenceRecord>) -> Self {
        records.sort_by(|a, b| a.precursor_mz.total_cmp(&b.precursor_mz));
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ReferenceRecord] {
        &self.records
    }

    /// The records whose precursor m/z falls within `tolerance` of `mz`
    pub fn candidates(&self, mz: f64, tolerance: Tolerance) -> &[ReferenceRecord] {
        let (lower, upper) = tolerance.bounds(mz);
        let key_at = |i: usize| self.records[i].precursor_mz;
        let n = self.records.len();
        let start = confirm_lower_bound(n, key_at, bounded_lower_bound(n, key_at, lower), lower);
        let mut end = start;
        while end < n && self.records[end].precursor_mz <= upper {
            end += 1;
        }
        &self.records[start..end]
    }
}

/// The outcome of scoring one feature against one reference record
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchResult {
    pub reference_id: i32,
    pub total_score: f64,
    pub spectrum_similarity: f64,
    pub rt_similarity: f64,
    pub ccs_similarity: f64,
    pub is_precursor_match: bool,
    pub is_spectrum_match: bool,
    pub is_lipid_class_match: bool,
    pub is_lipid_chains_match: bool,
    pub is_lipid_position_match: bool,
}

impl MatchResult {
    /// The structural evidence of this match. Corroboration is added separately
    /// because it depends on the observed feature and the enabled settings.
    pub fn flags(&self) -> MatchFlags {
        let mut flags = MatchFlags::empty();
        flags.set(MatchFlags::PRECURSOR, self.is_precursor_match);
        flags.set(MatchFlags::SPECTRUM, self.is_spectrum_match);
        flags.set(MatchFlags::LIPID_CLASS, self.is_lipid_class_match);
        flags.set(MatchFlags::LIPID_CHAINS, self.is_lipid_chains_match);
        flags.set(MatchFlags::LIPID_POSITION, self.is_lipid_position_match);
        flags
    }

    pub fn is_match(&self) -> bool {
        self.is_precursor_match || self.is_spectrum_match
    }
}

/// The corroboration flags for a feature observed at `retention_time` with an
/// optional `ccs`, compared with `record` under `settings`
pub fn corroboration_flags(
    retention_time: f64,
    ccs: Option<f64>,
    record: &ReferenceRecord,
    settings: &CorroborationParameters,
) -> MatchFlags {
    let mut flags = MatchFlags::empty();
    flags.set(
        MatchFlags::RETENTION_TIME,
        settings.retention_time_matches(retention_time, record.retention_time),
    );
    if let Some(ccs) = ccs {
        flags.set(MatchFlags::CCS, settings.ccs_matches(ccs, record.ccs));
    }
    flags
}

/// Record the identification of `feature` as `record`, scored by `result`.
///
/// This is the only operation that writes a feature's identification. The
/// confidence code is derived from the match flags and the retention time and
/// CCS corroboration under `settings`. When the result is not a match at all,
/// only the code is written and every other field keeps its unset value.
pub fn annotate(
    feature: &mut Feature,
    record: &ReferenceRecord,
    result: &MatchResult,
    settings: &CorroborationParameters,
) -> AnnotationCode {
    let observed_rt = feature.peak().top.chrom_x.value;
    let flags = result.flags() | corroboration_flags(observed_rt, feature.ccs(), record, settings);
    let code = classify(flags);

    let ident = &mut feature.peak_mut().identification;
    ident.code = code;
    if !code.is_annotated() {
        log::trace!("Reference {} did not match, leaving the feature unannotated", record.id);
        return code;
    }
    ident.name.clone_from(&record.name);
    ident.formula.clone_from(&record.formula);
    ident.ontology.clone_from(&record.ontology);
    ident.smiles.clone_from(&record.smiles);
    ident.inchikey.clone_from(&record.inchikey);
    ident.matched_reference_id = record.id;
    ident.total_score = result.total_score;
    ident.spectrum_similarity = result.spectrum_similarity;
    ident.rt_similarity = result.rt_similarity;
    ident.ccs_similarity = result.ccs_similarity;
    if !record.adduct.is_unknown() {
        feature.peak_mut().adduct = record.adduct.clone();
    }
    code
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::chromatogram::{Chromatogram, ChromatogramKind, ChromatogramPoint};
    use crate::feature::{
        ChromX, ChromatogramPeakFeature, DriftFeature, PeakDetectionResult, PeakEdge,
    };
    use crate::spectrum::ScanPolarity;

    fn feature_at(rt: f64) -> Feature {
        let chrom = Chromatogram::new(
            ChromatogramKind::Eic,
            760.585,
            (0..5)
                .map(|i| ChromatogramPoint::new(i, rt - 0.2 + i as f64 * 0.1, 760.585, 10.0))
                .collect(),
        );
        let result = PeakDetectionResult {
            left_index: 0,
            top_index: 2,
            right_index: 4,
            ..Default::default()
        };
        ChromatogramPeakFeature::from_detection(Some(&result), &chrom, 760.585, ScanPolarity::Positive)
            .map(Feature::Plain)
            .unwrap()
    }

    fn pc_record() -> ReferenceRecord {
        ReferenceRecord::new(17, "PC 16:0_18:1", 760.5851)
            .with_retention_time(12.0)
            .with_ccs(285.0)
            .with_formula("C42H82NO8P")
            .with_ontology("PC")
            .with_structure("CCCC", "WTJKGGKOPKCXLL-VYOBOKEXSA-N")
            .with_adduct(AdductIon::new("[M+H]+", crate::utils::PROTON, 1, 1))
    }

    #[test_log::test]
    fn test_annotate_with_rt() {
        let mut feature = feature_at(12.02);
        let result = MatchResult {
            reference_id: 17,
            total_score: 0.85,
            spectrum_similarity: 0.0,
            is_precursor_match: true,
            is_spectrum_match: true,
            is_lipid_class_match: true,
            ..Default::default()
        };
        let settings = CorroborationParameters {
            use_retention_time: true,
            ..Default::default()
        };
        let code = annotate(&mut feature, &pc_record(), &result, &settings);
        assert_eq!(code.code(), 320);
        let ident = feature.peak().identification();
        assert_eq!(ident.code, AnnotationCode::ClassRt);
        assert_eq!(ident.matched_reference_id, 17);
        assert_eq!(ident.ontology, "PC");
        assert_eq!(ident.total_score, 0.85);
        assert_eq!(ident.spectrum_similarity, 0.0);
        assert_eq!(feature.peak().adduct.name, "[M+H]+");
    }

    #[test_log::test]
    fn test_annotate_ccs_needs_drift() {
        let result = MatchResult {
            reference_id: 17,
            is_precursor_match: true,
            ..Default::default()
        };
        let settings = CorroborationParameters {
            use_ccs: true,
            ..Default::default()
        };
        let mut plain = feature_at(3.0);
        assert_eq!(annotate(&mut plain, &pc_record(), &result, &settings).code(), 530);

        let drift = DriftFeature {
            left: PeakEdge::default(),
            top: PeakEdge::new(0, ChromX::drift_time(0.9), 1.0),
            right: PeakEdge::default(),
            area_above_zero: 1.0,
            ccs: 287.0,
        };
        let mut mobile = feature_at(3.0).with_drift(drift);
        assert_eq!(annotate(&mut mobile, &pc_record(), &result, &settings).code(), 510);
    }

    #[test]
    fn test_no_match_keeps_sentinels() {
        let mut feature = feature_at(12.0);
        let code = annotate(
            &mut feature,
            &pc_record(),
            &MatchResult::default(),
            &CorroborationParameters::default(),
        );
        assert_eq!(code.code(), 999);
        let ident = feature.peak().identification();
        assert_eq!(ident.matched_reference_id, -1);
        assert!(ident.name.is_empty());
        assert!(feature.peak().adduct.is_unknown());
    }

    #[test]
    fn test_library_candidates() {
        let library = ReferenceLibrary::new(vec![
            ReferenceRecord::new(2, "b", 300.01),
            ReferenceRecord::new(1, "a", 299.99),
            ReferenceRecord::new(3, "c", 300.5),
            ReferenceRecord::new(4, "d", 300.0),
            ReferenceRecord::new(5, "e", 299.989),
            ReferenceRecord::new(6, "f", 300.011),
        ]);
        let ids: Vec<i32> = library
            .candidates(300.0, Tolerance::Da(0.01))
            .iter()
            .map(|r| r.id)
            .collect();
        // Both bounds are inclusive
        assert_eq!(ids, vec![1, 4, 2]);
        assert!(library.candidates(100.0, Tolerance::Da(0.01)).is_empty());
        assert!(ReferenceLibrary::default().candidates(300.0, Tolerance::Da(0.01)).is_empty());
    }
}
