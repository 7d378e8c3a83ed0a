//! The annotation confidence ladder.
//!
//! A code is a three digit number where lower means more confident. The hundreds
//! digit records the corroborating evidence and the tens digit records how much
//! of the structure was resolved. The numbers are a reporting convention shared
//! with export formats and must not change.
use std::fmt::{self, Display};

use thiserror::Error;

bitflags::bitflags! {
    /// The evidence a library match provides for an identification
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MatchFlags: u8 {
        /// The precursor m/z matched within tolerance
        const PRECURSOR = 1;
        /// The MS2 spectrum matched
        const SPECTRUM = 1 << 1;
        /// The lipid class was resolved from the spectrum
        const LIPID_CLASS = 1 << 2;
        /// The fatty acyl chains were resolved
        const LIPID_CHAINS = 1 << 3;
        /// The chain positions were resolved
        const LIPID_POSITION = 1 << 4;
        /// The retention time was within tolerance, with retention time corroboration enabled
        const RETENTION_TIME = 1 << 5;
        /// The CCS was within tolerance, with CCS corroboration enabled
        const CCS = 1 << 6;
    }
}

/// The confidence tier of an annotation
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnnotationCode {
    PositionRtCcs = 100,
    ChainsRtCcs = 110,
    ClassRtCcs = 120,
    SpectrumRtCcs = 130,
    PositionCcs = 200,
    ChainsCcs = 210,
    ClassCcs = 220,
    SpectrumCcs = 230,
    PositionRt = 300,
    ChainsRt = 310,
    ClassRt = 320,
    SpectrumRt = 330,
    Position = 400,
    Chains = 410,
    Class = 420,
    Spectrum = 430,
    PrecursorRtCcs = 500,
    PrecursorCcs = 510,
    PrecursorRt = 520,
    Precursor = 530,
    #[default]
    Unannotated = 999,
}

const ALL_CODES: [AnnotationCode; 21] = [
    AnnotationCode::PositionRtCcs,
    AnnotationCode::ChainsRtCcs,
    AnnotationCode::ClassRtCcs,
    AnnotationCode::SpectrumRtCcs,
    AnnotationCode::PositionCcs,
    AnnotationCode::ChainsCcs,
    AnnotationCode::ClassCcs,
    AnnotationCode::SpectrumCcs,
    AnnotationCode::PositionRt,
    AnnotationCode::ChainsRt,
    AnnotationCode::ClassRt,
    AnnotationCode::SpectrumRt,
    AnnotationCode::Position,
    AnnotationCode::Chains,
    AnnotationCode::Class,
    AnnotationCode::Spectrum,
    AnnotationCode::PrecursorRtCcs,
    AnnotationCode::PrecursorCcs,
    AnnotationCode::PrecursorRt,
    AnnotationCode::Precursor,
    AnnotationCode::Unannotated,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodeConversionError {
    #[error("{0} is not an annotation confidence code")]
    UnknownCode(u16),
}

impl AnnotationCode {
    /// Every code on the ladder, most confident first
    pub fn all() -> &'static [AnnotationCode] {
        &ALL_CODES
    }

    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    pub fn is_annotated(&self) -> bool {
        !matches!(self, Self::Unannotated)
    }

    /// Whether the code rests on an MS2 spectrum match
    pub fn has_spectrum_match(&self) -> bool {
        self.code() < 500
    }

    /// Apply retention time and CCS corroboration to an uncorroborated code.
    /// Codes that are already corroborated, and the unannotated code, are returned as is.
    pub fn corroborate(self, retention_time: bool, ccs: bool) -> Self {
        use AnnotationCode::*;
        match (self, retention_time, ccs) {
            (_, false, false) => self,
            (Position, true, true) => PositionRtCcs,
            (Chains, true, true) => ChainsRtCcs,
            (Class, true, true) => ClassRtCcs,
            (Spectrum, true, true) => SpectrumRtCcs,
            (Precursor, true, true) => PrecursorRtCcs,
            (Position, true, false) => PositionRt,
            (Chains, true, false) => ChainsRt,
            (Class, true, false) => ClassRt,
            (Spectrum, true, false) => SpectrumRt,
            (Precursor, true, false) => PrecursorRt,
            (Position, false, true) => PositionCcs,
            (Chains, false, true) => ChainsCcs,
            (Class, false, true) => ClassCcs,
            (Spectrum, false, true) => SpectrumCcs,
            (Precursor, false, true) => PrecursorCcs,
            _ => self,
        }
    }
}

impl Display for AnnotationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<AnnotationCode> for u16 {
    fn from(value: AnnotationCode) -> Self {
        value.code()
    }
}

impl TryFrom<u16> for AnnotationCode {
    type Error = CodeConversionError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        ALL_CODES
            .iter()
            .find(|c| c.code() == value)
            .copied()
            .ok_or(CodeConversionError::UnknownCode(value))
    }
}

/// Map a set of match flags onto the confidence ladder.
///
/// A spectrum match sets the base tier at 430 and overrides a precursor match
/// (530); with a spectrum match the most specific structural flag lowers it to
/// 420, 410 or 400. Retention time and CCS corroboration then remap the tier.
/// Without a precursor or spectrum match the code is 999, whatever else is set.
pub fn classify(flags: MatchFlags) -> AnnotationCode {
    let base = if flags.contains(MatchFlags::SPECTRUM) {
        if flags.contains(MatchFlags::LIPID_POSITION) {
            AnnotationCode::Position
        } else if flags.contains(MatchFlags::LIPID_CHAINS) {
            AnnotationCode::Chains
        } else if flags.contains(MatchFlags::LIPID_CLASS) {
            AnnotationCode::Class
        } else {
            AnnotationCode::Spectrum
        }
    } else if flags.contains(MatchFlags::PRECURSOR) {
        AnnotationCode::Precursor
    } else {
        return AnnotationCode::Unannotated;
    };
    base.corroborate(
        flags.contains(MatchFlags::RETENTION_TIME),
        flags.contains(MatchFlags::CCS),
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_reference_cases() {
        let flags = MatchFlags::SPECTRUM | MatchFlags::LIPID_CLASS | MatchFlags::RETENTION_TIME;
        assert_eq!(classify(flags).code(), 320);
        assert_eq!(classify(MatchFlags::PRECURSOR).code(), 530);
        assert_eq!(classify(MatchFlags::empty()).code(), 999);
    }

    #[test]
    fn test_structural_precedence() {
        let spectrum = MatchFlags::SPECTRUM | MatchFlags::PRECURSOR;
        assert_eq!(classify(spectrum).code(), 430);
        assert_eq!(classify(spectrum | MatchFlags::LIPID_CLASS).code(), 420);
        assert_eq!(
            classify(spectrum | MatchFlags::LIPID_CLASS | MatchFlags::LIPID_CHAINS).code(),
            410
        );
        assert_eq!(
            classify(spectrum | MatchFlags::LIPID_CHAINS | MatchFlags::LIPID_POSITION).code(),
            400
        );
        // Structural flags mean nothing without a spectrum match
        assert_eq!(
            classify(MatchFlags::PRECURSOR | MatchFlags::LIPID_POSITION).code(),
            530
        );
    }

    #[test]
    fn test_corroboration_table() {
        let bases = [
            (MatchFlags::SPECTRUM | MatchFlags::LIPID_POSITION, [100, 300, 200]),
            (MatchFlags::SPECTRUM | MatchFlags::LIPID_CHAINS, [110, 310, 210]),
            (MatchFlags::SPECTRUM | MatchFlags::LIPID_CLASS, [120, 320, 220]),
            (MatchFlags::SPECTRUM, [130, 330, 230]),
            (MatchFlags::PRECURSOR, [500, 520, 510]),
        ];
        for (flags, [both, rt, ccs]) in bases {
            assert_eq!(
                classify(flags | MatchFlags::RETENTION_TIME | MatchFlags::CCS).code(),
                both
            );
            assert_eq!(classify(flags | MatchFlags::RETENTION_TIME).code(), rt);
            assert_eq!(classify(flags | MatchFlags::CCS).code(), ccs);
        }
        assert_eq!(
            classify(MatchFlags::RETENTION_TIME | MatchFlags::CCS).code(),
            999
        );
    }

    #[test]
    fn test_code_conversion() {
        for code in AnnotationCode::all() {
            assert_eq!(AnnotationCode::try_from(code.code()), Ok(*code));
        }
        assert_eq!(
            AnnotationCode::try_from(540),
            Err(CodeConversionError::UnknownCode(540))
        );
        assert_eq!(AnnotationCode::default().to_string(), "999");
        assert_eq!(u16::from(AnnotationCode::ClassRt), 320);
        assert!(AnnotationCode::SpectrumCcs.has_spectrum_match());
        assert!(!AnnotationCode::PrecursorRt.has_spectrum_match());
        assert_eq!(AnnotationCode::PositionRt.corroborate(true, true), AnnotationCode::PositionRt);
    }
}
