#![doc = include_str!("../README.md")]

pub mod build;
pub mod config;
pub mod decoy;
pub mod fdr;
pub mod orchestrator;
pub mod psm;

pub mod prelude {
    pub use crate::build::build_indices;
    pub use crate::config::SearchConfig;
    pub use crate::decoy::{DecoyOutcome, generate_decoy, generate_decoys};
    pub use crate::fdr::{FdrAnnotated, ScoredPsm, compute_fdr, filter_by_qvalue};
    pub use crate::orchestrator::{
        CancellationToken, RunSummary, SearchErrorKind, SearchOutcome, SkipReason, assign_q_values,
        filter_psms_by_qvalue, search,
    };
    pub use crate::psm::{CandidateSummary, Psm};
}
