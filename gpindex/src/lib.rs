#![doc = include_str!("../README.md")]

//! The candidate (peptide, glycan) index (spec.md C4 / §4.4).
//!
//! Grounded in the teacher's `mzalign::index::AlignIndex` (`mzalign/src/index.rs`): a struct
//! holding a precomputed `Vec` built once from an iterator of sources, with read-only query
//! methods and a `rayon`-parallel build path. The teacher's index precomputes alignment masses
//! per sequence and scans linearly; this index precomputes one neutral mass per
//! (peptide, glycan) pair and keeps the array *sorted* by that mass so a query is a pair of
//! binary searches rather than a scan (spec.md §4.4 performance contract: `O(log n + k)`).

use context_error::{BoxedError, Context, ErrorKind};
use gpcore::glycan::Glycan;
use gpcore::mass::{neutral_mass_from_mz, ppm_error};
use gpcore::sequence::Peptide;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// The `EmptyIndexError` of spec.md §7: the candidate index has no records at search start.
/// Fatal, per spec.md invariant 2 ("non-empty iff there is at least one sequon-bearing peptide
/// AND one glycan").
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EmptyIndexErrorKind;

impl ErrorKind for EmptyIndexErrorKind {
    type Settings = ();
    fn descriptor(&self) -> &'static str {
        "error"
    }
    fn ignored(&self, (): Self::Settings) -> bool {
        false
    }
    fn is_error(&self, (): Self::Settings) -> bool {
        true
    }
}

/// The `CacheError` of spec.md §7: a `bincode`-encoded candidate index failed to decode, most
/// often because it was built with a different `gpcore` version. Non-fatal: the caller falls
/// back to rebuilding the index from the FASTA and glycan catalog.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheErrorKind;

impl ErrorKind for CacheErrorKind {
    type Settings = ();
    fn descriptor(&self) -> &'static str {
        "warning"
    }
    fn ignored(&self, (): Self::Settings) -> bool {
        false
    }
    fn is_error(&self, (): Self::Settings) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct CandidateRecord {
    neutral_mass: f64,
    peptide_index: u32,
    glycan_index: u32,
}

/// An immutable, mass-sorted array of every (sequon-bearing peptide, glycan) pair, supporting
/// `O(log n + k)` mass-window queries. Safe to query concurrently from multiple threads once
/// built (spec.md §4.4/§5): nothing here is mutated after [`CandidateIndex::build`] returns.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CandidateIndex {
    peptides: Vec<Peptide>,
    glycans: Vec<Glycan>,
    records: Vec<CandidateRecord>,
}

/// One (peptide, glycan) hit returned by [`CandidateIndex::query`], annotated with its signed
/// ppm mass error against the query.
#[derive(Clone, Copy, Debug)]
pub struct CandidateHit<'index> {
    /// The matched peptide.
    pub peptide: &'index Peptide,
    /// The matched glycan.
    pub glycan: &'index Glycan,
    /// `peptide.mass() + glycan.mass()`.
    pub neutral_mass: f64,
    /// Signed ppm error of the query's neutral mass against this candidate's neutral mass.
    pub ppm_error: f64,
}

impl CandidateIndex {
    /// Build the index from every sequon-bearing peptide crossed with every glycan in the
    /// catalog (spec.md §4.4 Build). Peptides without a sequon are dropped here, satisfying
    /// invariant 1 of spec.md §3. No deduplication is performed across pairs that collide in
    /// mass (spec.md §4.4): each pair can lead to a different PSM.
    #[must_use]
    pub fn build(peptides: impl IntoIterator<Item = Peptide>, glycans: Vec<Glycan>) -> Self {
        let peptides: Vec<Peptide> = peptides.into_iter().filter(Peptide::has_sequon).collect();

        let mut records = Vec::with_capacity(peptides.len() * glycans.len());
        for (p_idx, peptide) in peptides.iter().enumerate() {
            for (g_idx, glycan) in glycans.iter().enumerate() {
                records.push(CandidateRecord {
                    neutral_mass: peptide.mass() + glycan.mass(),
                    peptide_index: p_idx as u32,
                    glycan_index: g_idx as u32,
                });
            }
        }
        // Stable sort: equal masses retain insertion order (spec.md invariant 3).
        records.sort_by(|a, b| {
            a.neutral_mass
                .partial_cmp(&b.neutral_mass)
                .expect("candidate masses are always finite")
        });

        Self {
            peptides,
            glycans,
            records,
        }
    }

    /// Same as [`Self::build`], but the Cartesian product is computed across a `rayon` thread
    /// pool before the single stable sort. Useful when `peptides.len() * glycans.len()` is
    /// large (spec.md §5: the index build is the dominant memory/time cost).
    #[must_use]
    pub fn build_parallel(
        peptides: impl IntoIterator<Item = Peptide>,
        glycans: Vec<Glycan>,
    ) -> Self {
        let peptides: Vec<Peptide> = peptides.into_iter().filter(Peptide::has_sequon).collect();

        let mut records: Vec<CandidateRecord> = peptides
            .par_iter()
            .enumerate()
            .flat_map_iter(|(p_idx, peptide)| {
                glycans.iter().enumerate().map(move |(g_idx, glycan)| {
                    CandidateRecord {
                        neutral_mass: peptide.mass() + glycan.mass(),
                        peptide_index: p_idx as u32,
                        glycan_index: g_idx as u32,
                    }
                })
            })
            .collect();
        records.sort_by(|a, b| {
            a.neutral_mass
                .partial_cmp(&b.neutral_mass)
                .expect("candidate masses are always finite")
        });

        Self {
            peptides,
            glycans,
            records,
        }
    }

    /// Number of (peptide, glycan) records held by this index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether this index holds no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validate that the index is non-empty, as required before a search starts (spec.md §7
    /// `EmptyIndexError`, fatal).
    ///
    /// # Errors
    /// Returns `EmptyIndexError` if [`Self::is_empty`].
    pub fn require_non_empty(&self) -> Result<(), BoxedError<'static, EmptyIndexErrorKind>> {
        if self.is_empty() {
            Err(BoxedError::new(
                EmptyIndexErrorKind,
                "Empty candidate index",
                "The candidate index has no (peptide, glycan) records; check that at least one \
                 sequon-bearing peptide and one glycan were provided",
                Context::none(),
            ))
        } else {
            Ok(())
        }
    }

    /// Query all candidates whose neutral mass falls within `tolerance_ppm` of the neutral mass
    /// implied by `precursor_mz` at the given `charge` (spec.md §4.4 Query).
    ///
    /// Runs in `O(log n + k)`: two binary searches via `partition_point` locate the window,
    /// then every record inside it is materialized.
    #[must_use]
    pub fn query(&self, precursor_mz: f64, charge: i32, tolerance_ppm: f64) -> Vec<CandidateHit<'_>> {
        let observed_mass = neutral_mass_from_mz(precursor_mz, charge);
        let half_window = observed_mass * tolerance_ppm * 1.0e-6;
        let lo = observed_mass - half_window;
        let hi = observed_mass + half_window;

        let start = self.records.partition_point(|r| r.neutral_mass < lo);
        let end = self.records.partition_point(|r| r.neutral_mass <= hi);

        self.records[start..end]
            .iter()
            .map(|record| CandidateHit {
                peptide: &self.peptides[record.peptide_index as usize],
                glycan: &self.glycans[record.glycan_index as usize],
                neutral_mass: record.neutral_mass,
                ppm_error: ppm_error(observed_mass, record.neutral_mass),
            })
            .collect()
    }

    /// Encode this index with `bincode` for on-disk caching, so a repeat search over the same
    /// FASTA and glycan catalog can skip the build step (spec.md §6 supplemented feature).
    ///
    /// # Errors
    /// Returns a `CacheError` if `bincode` fails to encode (practically unreachable: every field
    /// is a plain number, `String`, or `Vec` of those).
    pub fn to_bytes(&self) -> Result<Vec<u8>, BoxedError<'static, CacheErrorKind>> {
        bincode::serde::encode_to_vec(self, bincode::config::standard()).map_err(|e| {
            BoxedError::new(
                CacheErrorKind,
                "Failed to encode candidate index",
                e.to_string(),
                Context::none(),
            )
        })
    }

    /// Decode an index previously written by [`Self::to_bytes`].
    ///
    /// # Errors
    /// Returns a `CacheError` if `bytes` is not a valid encoding of `Self`, e.g. because it was
    /// produced by an incompatible `gpcore`/`gpindex` version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BoxedError<'static, CacheErrorKind>> {
        bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map(|(index, _)| index)
            .map_err(|e| {
                BoxedError::new(
                    CacheErrorKind,
                    "Failed to decode candidate index",
                    e.to_string(),
                    Context::none(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpcore::glycan::Glycan;
    use gpcore::sequence::{CleavageRule, Protein, digest};

    fn sample_index() -> CandidateIndex {
        let protein = Protein::new("P1", "desc", "MKNGTDEKNGSDEKNGTDEFK").unwrap();
        let peptides = digest(&protein, CleavageRule::Trypsin, 2, 3, 30);
        let glycans = vec![
            Glycan::parse("H5N2").unwrap(),
            Glycan::parse("H5N4F1A2").unwrap(),
            Glycan::parse("H3N4").unwrap(),
        ];
        CandidateIndex::build(peptides, glycans)
    }

    #[test]
    fn build_filters_peptides_without_a_sequon() {
        let index = sample_index();
        assert!(index.peptides.iter().all(Peptide::has_sequon));
    }

    #[test]
    fn records_are_sorted_by_mass() {
        let index = sample_index();
        for window in index.records.windows(2) {
            assert!(window[0].neutral_mass <= window[1].neutral_mass);
        }
    }

    #[test]
    fn candidate_mass_equals_peptide_plus_glycan_mass() {
        let index = sample_index();
        for record in &index.records {
            let peptide = &index.peptides[record.peptide_index as usize];
            let glycan = &index.glycans[record.glycan_index as usize];
            assert!(
                (record.neutral_mass - (peptide.mass() + glycan.mass())).abs() < 1e-6
            );
        }
    }

    #[test]
    fn query_boundary_is_inclusive_at_exactly_tol_ppm() {
        // A single synthetic candidate at a known mass, queried at the +10ppm boundary.
        let protein = Protein::new("P1", "desc", "NGTGGGGGGGGGGGGGG").unwrap();
        let peptides = digest(&protein, CleavageRule::Trypsin, 0, 3, 30);
        let glycans = vec![Glycan::parse("H5N2").unwrap()];
        let index = CandidateIndex::build(peptides, glycans);
        assert_eq!(index.len(), 1);
        let candidate_mass = index.records[0].neutral_mass;

        // mz such that the neutral mass is exactly candidate_mass * (1 + 10ppm)
        let charge = 2;
        let boundary_mass = candidate_mass * (1.0 + 10.0e-6);
        let boundary_mz =
            (boundary_mass + f64::from(charge) * gpcore::mass::PROTON_MASS) / f64::from(charge);
        let hits = index.query(boundary_mz, charge, 10.0);
        assert_eq!(hits.len(), 1, "boundary hit at exactly +10ppm must be included");

        let beyond_mass = candidate_mass * (1.0 + 10.000_2e-6);
        let beyond_mz =
            (beyond_mass + f64::from(charge) * gpcore::mass::PROTON_MASS) / f64::from(charge);
        let beyond_hits = index.query(beyond_mz, charge, 10.0);
        assert!(beyond_hits.is_empty(), "hit just past +10ppm must be excluded");
    }

    #[test]
    fn every_hit_is_within_tolerance_and_none_outside_the_window_is() {
        let index = sample_index();
        let precursor_mz = 500.0;
        let charge = 2;
        let tol = 20.0;
        let hits = index.query(precursor_mz, charge, tol);
        for hit in &hits {
            assert!(hit.ppm_error.abs() <= tol + 1e-6);
        }
        let observed = neutral_mass_from_mz(precursor_mz, charge);
        for record in &index.records {
            let in_window = (record.neutral_mass - observed).abs()
                <= observed * tol * 1.0e-6;
            let was_returned = hits.iter().any(|h| (h.neutral_mass - record.neutral_mass).abs() < 1e-9);
            assert_eq!(in_window, was_returned);
        }
    }

    #[test]
    fn empty_index_is_rejected() {
        let index = CandidateIndex::build(Vec::new(), Vec::new());
        assert!(index.require_non_empty().is_err());
    }

    #[test]
    fn bincode_round_trip_preserves_query_results() {
        let index = sample_index();
        let bytes = index.to_bytes().unwrap();
        let restored = CandidateIndex::from_bytes(&bytes).unwrap();
        assert_eq!(index.len(), restored.len());
        let before = index.query(700.0, 2, 20.0);
        let after = restored.query(700.0, 2, 20.0);
        assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(after.iter()) {
            assert!((a.neutral_mass - b.neutral_mass).abs() < 1e-9);
        }
    }

    #[test]
    fn from_bytes_rejects_garbage() {
        assert!(CandidateIndex::from_bytes(&[0xFF, 0x00, 0x01]).is_err());
    }
}
