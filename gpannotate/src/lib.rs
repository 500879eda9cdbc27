#![doc = include_str!("../README.md")]

pub mod score;
pub mod spectrum;
pub mod theoretical;

pub mod prelude {
    pub use crate::score::sp::{SpResult, score_sp, top_k_by_sp};
    pub use crate::score::xcorr::{LAG_WINDOW, NumericalErrorKind, XCorrResult, score_xcorr};
    pub use crate::spectrum::{BinningParams, ProcessedSpectrum, Spectrum, preprocess, reprocess};
    pub use crate::theoretical::{IonLabel, TheoreticalPeak, build_theoretical, vectorize};
}
