//! Peptide production by digestion (spec.md C2 / §4.2).

use serde::{Deserialize, Serialize};
use thin_vec::ThinVec;

use crate::mass::peptide_mass;
use crate::sequence::{CleavageRule, Protein};

/// A peptide produced by digesting a [`Protein`]. Immutable once produced; carries its parent's
/// id rather than a reference to it (spec.md §3 Ownership: "peptides carry the parent id only,
/// not a pointer").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Peptide {
    sequence: Vec<u8>,
    parent_protein_id: String,
    /// 1-based, inclusive start position in the parent protein.
    start: usize,
    /// 1-based, inclusive end position in the parent protein.
    end: usize,
    missed_cleavages: usize,
    mass: f64,
    /// 1-based positions of the sequon `N` within this peptide.
    sequons: ThinVec<usize>,
}

impl Peptide {
    /// The peptide's amino-acid sequence.
    #[must_use]
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// The identifier of the protein this peptide was cut from.
    #[must_use]
    pub fn parent_protein_id(&self) -> &str {
        &self.parent_protein_id
    }

    /// 1-based, inclusive start position in the parent protein.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// 1-based, inclusive end position in the parent protein.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// The number of missed cleavage sites interior to this peptide.
    #[must_use]
    pub const fn missed_cleavages(&self) -> usize {
        self.missed_cleavages
    }

    /// Monoisotopic neutral mass of this peptide.
    #[must_use]
    pub const fn mass(&self) -> f64 {
        self.mass
    }

    /// 1-based positions of N-sequons (`N-X-S/T`, `X != P`) within this peptide.
    #[must_use]
    pub fn sequons(&self) -> &[usize] {
        &self.sequons
    }

    /// Whether this peptide carries at least one N-sequon. Invariant 1 of spec.md §3 requires
    /// this to hold for every peptide kept by the candidate index (C4); the producer itself
    /// still emits sequon-less peptides (spec.md §4.2).
    #[must_use]
    pub fn has_sequon(&self) -> bool {
        !self.sequons.is_empty()
    }

    /// Build a variant of this peptide with a different `sequence` and `parent_protein_id`, but
    /// the same start/end/missed-cleavage provenance. Mass and sequon positions are recomputed
    /// from `sequence`, never copied (spec.md §9 open-question resolution for C9: "recompute, do
    /// not copy"). Used by the decoy generator to turn a target peptide into its reversed-interior
    /// decoy.
    ///
    /// Returns `None` if `sequence` contains a residue with no known mass.
    #[must_use]
    pub fn with_sequence(&self, parent_protein_id: impl Into<String>, sequence: Vec<u8>) -> Option<Self> {
        let mass = peptide_mass(&sequence)?;
        let sequons = sequon_positions(&sequence);
        Some(Self {
            sequons,
            mass,
            sequence,
            parent_protein_id: parent_protein_id.into(),
            start: self.start,
            end: self.end,
            missed_cleavages: self.missed_cleavages,
        })
    }
}

/// Find the 1-based positions of the `N` in every N-X-S/T sequon (`X != P`) in `sequence`.
///
/// Grounded in spec.md §4.2: "for each index i in the peptide, include i+1 (1-based) if residue
/// i is N, residue i+2 exists, residue i+1 != P, and residue i+2 in {S, T}".
#[must_use]
pub fn sequon_positions(sequence: &[u8]) -> ThinVec<usize> {
    sequence
        .windows(3)
        .enumerate()
        .filter_map(|(i, window)| {
            let [n, x, s_or_t] = *window else {
                unreachable!("windows(3) always yields 3-element slices")
            };
            (n == b'N' && x != b'P' && matches!(s_or_t, b'S' | b'T')).then_some(i + 1)
        })
        .collect()
}

/// Digest `protein` with `rule`, keeping spans of `[min_length, max_length]` residues
/// (inclusive) after up to `max_missed_cleavages` interior cleavage sites.
///
/// Mirrors the sites-vector-plus-sliding-window shape of the teacher's
/// `Peptidoform::digest` (`mzcore/src/sequence/peptidoform/peptidoform.rs`): cleavage sites
/// (plus the sequence boundaries) are scanned once, then every contiguous span spanning `0` to
/// `max_missed_cleavages` interior sites is emitted and mass-filtered by length.
///
/// Peptides with no sequon are still emitted here (spec.md §4.2); `gpindex` is responsible for
/// dropping them (spec.md invariant 1).
#[must_use]
pub fn digest(
    protein: &Protein,
    rule: CleavageRule,
    max_missed_cleavages: usize,
    min_length: usize,
    max_length: usize,
) -> Vec<Peptide> {
    let sequence = protein.sequence();
    let mut sites = Vec::with_capacity(rule.cleavage_sites(sequence).len() + 2);
    sites.push(0);
    sites.extend(rule.cleavage_sites(sequence));
    sites.push(sequence.len());

    let mut peptides = Vec::new();
    for (index, &start) in sites.iter().enumerate() {
        for (missed, &end) in sites
            .iter()
            .skip(index + 1)
            .take(max_missed_cleavages + 1)
            .enumerate()
        {
            let length = end - start;
            if length < min_length || length > max_length {
                continue;
            }
            let span = &sequence[start..end];
            let Some(mass) = peptide_mass(span) else {
                continue;
            };
            peptides.push(Peptide {
                sequence: span.to_vec(),
                parent_protein_id: protein.id().to_string(),
                start: start + 1,
                end,
                missed_cleavages: missed,
                mass,
                sequons: sequon_positions(span),
            });
        }
    }
    peptides
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::CleavageRule;

    fn protein(sequence: &str) -> Protein {
        Protein::new("P1", "desc", sequence).unwrap()
    }

    #[test]
    fn scenario_s1_trypsin_zero_missed_cleavages() {
        let protein = protein("MKNGTDEK");
        // spec.md scenario S1 states "min_len 3" but its own expected output includes "MK"
        // (length 2); min_length 2 is used here to match the documented result.
        let peptides = digest(&protein, CleavageRule::Trypsin, 0, 2, 30);
        let sequences: Vec<String> = peptides
            .iter()
            .map(|p| String::from_utf8(p.sequence().to_vec()).unwrap())
            .collect();
        assert!(sequences.contains(&"MK".to_string()));
        assert!(sequences.contains(&"NGTDEK".to_string()));

        let ngtdek = peptides
            .iter()
            .find(|p| p.sequence() == b"NGTDEK")
            .unwrap();
        assert_eq!(ngtdek.sequons(), &[1]);
        assert!(ngtdek.has_sequon());

        let mk = peptides.iter().find(|p| p.sequence() == b"MK").unwrap();
        assert!(!mk.has_sequon());
    }

    #[test]
    fn missed_cleavages_respect_the_budget() {
        // AKAKAK: trypsin cleaves after each K; 1 missed cleavage allows spans of 2 sites.
        let protein = protein("AKAKAK");
        let peptides = digest(&protein, CleavageRule::Trypsin, 1, 1, 30);
        for p in &peptides {
            assert!(p.missed_cleavages() <= 1);
        }
        assert!(peptides.iter().any(|p| p.missed_cleavages() == 1));
    }

    #[test]
    fn length_bounds_are_enforced() {
        let protein = protein("MKNGTDEK");
        let peptides = digest(&protein, CleavageRule::Trypsin, 0, 3, 30);
        assert!(peptides.iter().all(|p| p.sequence().len() >= 3));
    }

    #[test]
    fn sequon_requires_non_proline_x_and_s_or_t() {
        assert_eq!(sequon_positions(b"NGT").as_slice(), &[1]);
        assert_eq!(sequon_positions(b"NPT").as_slice(), &[] as &[usize]);
        assert_eq!(sequon_positions(b"NGA").as_slice(), &[] as &[usize]);
        assert_eq!(sequon_positions(b"NG").as_slice(), &[] as &[usize]);
    }
}
