//! Decoy peptide generation (spec.md C9 / §4.9).
//!
//! No direct teacher precedent for target-decoy search exists in the corpus; this module
//! follows the `Peptide` construction conventions `gpcore::sequence::peptide` already
//! established (an accessor-only struct built through a purpose-built constructor, here
//! [`gpcore::sequence::Peptide::with_sequence`]) rather than introducing a new shape.

use gpcore::sequence::Peptide;

/// The outcome of generating a decoy for one target peptide.
#[derive(Clone, Debug)]
pub enum DecoyOutcome {
    /// A decoy distinct from its target.
    Decoy(Peptide),
    /// The generated decoy has the same sequence as its target (e.g. a palindromic interior, or
    /// a peptide short enough that no interior exists to reverse). Spec.md §4.9: "flagged and
    /// may be dropped."
    CollapsedToTarget(Peptide),
}

impl DecoyOutcome {
    /// The generated peptide, regardless of whether it collapsed to the target.
    #[must_use]
    pub const fn peptide(&self) -> &Peptide {
        match self {
            Self::Decoy(p) | Self::CollapsedToTarget(p) => p,
        }
    }

    /// Whether this decoy is usable, i.e. distinct from its target.
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        matches!(self, Self::Decoy(_))
    }
}

/// Generate the decoy of `target`: keep the first and last residues in place, reverse the
/// interior, recompute sequons and mass from the resulting sequence (spec.md §4.9). The decoy's
/// parent protein id is `target`'s, prefixed with `DECOY_`.
///
/// Returns `None` only if `target`'s sequence is empty, which cannot happen for a peptide
/// produced by [`gpcore::sequence::digest`] (spec.md §4.2 enforces `min_length >= 1`).
#[must_use]
pub fn generate_decoy(target: &Peptide) -> Option<DecoyOutcome> {
    let sequence = target.sequence();
    if sequence.is_empty() {
        return None;
    }

    let mut decoy_sequence = sequence.to_vec();
    if sequence.len() > 2 {
        decoy_sequence[1..sequence.len() - 1].reverse();
    }

    let parent_id = format!("DECOY_{}", target.parent_protein_id());
    let decoy = target.with_sequence(parent_id, decoy_sequence)?;

    Some(if decoy.sequence() == target.sequence() {
        DecoyOutcome::CollapsedToTarget(decoy)
    } else {
        DecoyOutcome::Decoy(decoy)
    })
}

/// Generate a decoy for every peptide in `targets`, keeping only those that did not collapse to
/// their target (spec.md §4.9: collapsed decoys "may be dropped"; this search drops them, since
/// an indistinguishable-from-target decoy would corrupt the FDR estimate).
#[must_use]
pub fn generate_decoys(targets: &[Peptide]) -> Vec<Peptide> {
    targets
        .iter()
        .filter_map(generate_decoy)
        .filter_map(|outcome| match outcome {
            DecoyOutcome::Decoy(p) => Some(p),
            DecoyOutcome::CollapsedToTarget(_) => None,
        })
        .collect()
}
