//! Scoring of a [`crate::spectrum::ProcessedSpectrum`] against a theoretical vector: the cheap
//! preliminary filter (spec.md C7) and the FFT-based cross-correlation (spec.md C8).
//!
//! Grounded in the teacher's `AnnotatedSpectrum::scores` (`mzannotate/src/annotation/scores.rs`):
//! a scorer that collapses into a pure function over two aligned arrays and a handful of
//! parameters, with no internal state (spec.md §9 design note: "object-oriented scorer classes
//! with internal state collapse into pure functions").

pub mod sp;
pub mod xcorr;
