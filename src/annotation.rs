//! Library annotation of features and the confidence ladder it reports on.
pub mod confidence;
pub mod library;

pub use confidence::{classify, AnnotationCode, CodeConversionError, MatchFlags};
pub use library::{
    annotate, corroboration_flags, MatchResult, ReferenceLibrary, ReferenceRecord,
};
