pub mod alignment;
pub mod annotation;
pub mod chromatogram;
pub mod feature;
pub mod io;
pub mod params;
pub mod spectrum;
pub mod utils;

pub use mzpeaks::{CentroidPeak, Tolerance};

pub use crate::params::{
    CentroidParameters, CorroborationParameters, ExtractionParameters, PeakDetectionParameters,
    RetryPolicy,
};

pub use crate::spectrum::{
    AcquisitionCycle, LaneKind, PrecursorWindow, Scan, ScanPolarity, SignalContinuity,
    SpectralStore,
};

pub use crate::chromatogram::{
    Chromatogram, ChromatogramExtractor, ChromatogramKind, ChromatogramPoint,
};
pub use crate::feature::{ChromatogramPeakFeature, DriftFeature, Feature};

pub use crate::alignment::{AlignedPeak, AlignedSpot, AlignmentContext, AlignmentError};
pub use crate::annotation::{annotate, classify, AnnotationCode, MatchFlags};

pub use crate::io::{LoadError, RawFileSource};
