//! Proteins, peptides, enzymatic digestion, and N-sequon detection.
//!
//! Corresponds to spec.md components C2 (peptide producer).

mod peptide;
mod protease;
mod protein;

pub use peptide::{Peptide, digest, sequon_positions};
pub use protease::CleavageRule;
pub use protein::{InvalidSequenceErrorKind, Protein};
