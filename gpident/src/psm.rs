//! The peptide-spectrum match record itself (spec.md §3 PSM entity).
//!
//! Grounded in the same "accessor-only struct built by a purpose-built constructor" shape as
//! `gpcore::sequence::Peptide`, since a PSM is exactly the kind of tagged record spec.md §9 asks
//! for in place of a dynamically typed dataclass: every field is known up front, and there is no
//! behavior attached beyond the data.

use gpcore::glycan::GlycanClass;
use gpindex::CandidateHit;
use serde::{Deserialize, Serialize};

/// An owned snapshot of the (peptide, glycan) candidate a [`Psm`] was assigned to.
///
/// [`CandidateHit`] borrows from the [`gpindex::CandidateIndex`] it was queried from; a `Psm`
/// must be able to outlive that borrow (it is collected across every spectrum in a run and
/// handed to the FDR engine afterwards), so this copies out exactly the fields spec.md §3
/// documents for the `Candidate`/`Peptide`/`Glycan` entities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    /// The peptide's amino-acid sequence.
    pub peptide_sequence: String,
    /// The identifier of the protein the peptide was cut from (`DECOY_`-prefixed for decoys).
    pub parent_protein_id: String,
    /// 1-based, inclusive start position in the parent protein.
    pub peptide_start: usize,
    /// 1-based, inclusive end position in the parent protein.
    pub peptide_end: usize,
    /// Number of missed cleavage sites interior to the peptide.
    pub missed_cleavages: usize,
    /// 1-based N-sequon positions within the peptide.
    pub sequon_positions: Vec<usize>,
    /// The glycan's composition string, e.g. `H5N4F1A2`.
    pub glycan_composition: String,
    /// The glycan's structural class.
    pub glycan_class: GlycanClass,
    /// `peptide.mass() + glycan.mass()`.
    pub neutral_mass: f64,
}

impl CandidateSummary {
    /// Snapshot a [`CandidateHit`] into an owned, 'static summary.
    #[must_use]
    pub fn from_hit(hit: &CandidateHit<'_>) -> Self {
        Self {
            peptide_sequence: String::from_utf8_lossy(hit.peptide.sequence()).into_owned(),
            parent_protein_id: hit.peptide.parent_protein_id().to_string(),
            peptide_start: hit.peptide.start(),
            peptide_end: hit.peptide.end(),
            missed_cleavages: hit.peptide.missed_cleavages(),
            sequon_positions: hit.peptide.sequons().to_vec(),
            glycan_composition: hit.glycan.composition().to_string(),
            glycan_class: hit.glycan.class(),
            neutral_mass: hit.neutral_mass,
        }
    }
}

/// One peptide-spectrum match (spec.md §3 PSM): a scored (peptide, glycan) candidate assigned to
/// one observed spectrum. `q_value` is `None` until [`crate::orchestrator::assign_q_values`] has
/// run the whole-batch FDR reduction (spec.md §4.10/§4.11: "filled late").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Psm {
    /// The scan identifier of the spectrum this PSM was assigned to.
    pub scan_id: String,
    /// The (peptide, glycan) candidate matched.
    pub candidate: CandidateSummary,
    /// The preliminary intensity-weighted matched-peak score (spec.md C7).
    pub sp: f64,
    /// The FFT-based cross-correlation score (spec.md C8).
    pub xcorr: f64,
    /// Signed ppm mass error of the precursor against this candidate's neutral mass.
    pub ppm_error: f64,
    /// Whether this PSM came from the decoy search (spec.md C9).
    pub is_decoy: bool,
    /// The q-value assigned by the target-decoy FDR engine (spec.md C10), `None` before it runs.
    pub q_value: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpcore::glycan::Glycan;
    use gpcore::mass::{mz_from_neutral_mass, peptide_mass};
    use gpcore::sequence::{CleavageRule, Protein, digest};
    use gpindex::CandidateIndex;

    #[test]
    fn candidate_summary_copies_every_documented_field() {
        let protein = Protein::new("P1", "desc", "MKNGTDEK").unwrap();
        let peptides = digest(&protein, CleavageRule::Trypsin, 0, 3, 30);
        let glycan = Glycan::parse("H5N4F1A2").unwrap();
        let expected_mass = peptide_mass(b"NGTDEK").unwrap() + glycan.mass();
        let index = CandidateIndex::build(peptides, vec![glycan]);
        assert_eq!(index.len(), 1);

        let mz = mz_from_neutral_mass(expected_mass, 2);
        let hits = index.query(mz, 2, 50.0);
        let hit = &hits[0];

        let summary = CandidateSummary::from_hit(hit);
        assert_eq!(summary.peptide_sequence, "NGTDEK");
        assert_eq!(summary.parent_protein_id, "P1");
        assert_eq!(summary.glycan_composition, "H5N4F1A2");
        assert!((summary.neutral_mass - hit.neutral_mass).abs() < 1e-9);
    }
}
