#![doc = include_str!("../README.md")]

/// Monoisotopic mass constants and the small numeric conversions (ppm, neutral mass from m/z)
/// shared by every other crate in this workspace.
pub mod mass;

/// Proteins, their digestion into peptides, and the glycosylation sequon search over the
/// resulting peptides.
pub mod sequence;

/// Glycan composition parsing and the structural-class catalog.
pub mod glycan;

mod helper_functions;

/// A subset of the types most commonly needed together, the recommended starting point for
/// consumers of this crate.
pub mod prelude {
    pub use crate::glycan::{Glycan, GlycanClass, GlycanCatalog};
    pub use crate::mass::{PROTON_MASS, WATER_MASS, neutral_mass_from_mz, ppm_error};
    pub use crate::sequence::{CleavageRule, Peptide, Protein, digest};
}
