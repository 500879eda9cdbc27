//! Target-decoy FDR and q-value computation (spec.md C10 / §4.10).
//!
//! No direct teacher precedent for target-decoy competition exists in the corpus; this follows
//! the same "scorer collapses to a pure function over plain data" idiom the teacher uses for
//! scoring (spec.md §9 design note), here applied to a whole-run reduction rather than a
//! per-spectrum one.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// One scored PSM as seen by the FDR engine: just enough to sort and label. The caller (the
/// search orchestrator) is responsible for mapping the resulting q-values back onto full PSM
/// records.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredPsm {
    /// The PSM's XCorr, used to sort the competition.
    pub score: f64,
    /// Whether this PSM came from the decoy search.
    pub is_decoy: bool,
}

/// A PSM annotated with its position-wise false discovery rate and monotone-minimum q-value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FdrAnnotated {
    /// The original PSM.
    pub psm: ScoredPsm,
    /// `(decoy_factor * cumulative decoys) / (cumulative targets + cumulative decoys)` at this
    /// PSM's position in the score-descending order.
    pub fdr: f64,
    /// `min` over every FDR at this position or a lower score (spec.md §4.10 step 3).
    pub q_value: f64,
}

/// Run the target-decoy FDR procedure of spec.md §4.10 over every PSM across every spectrum.
///
/// 1. Sort by score descending (ties keep their relative input order).
/// 2. Walk the sorted list one *tie block* at a time (a maximal run of equal scores): accumulate
///    cumulative target/decoy counts over the whole block, then assign the single resulting FDR
///    `(decoy_factor * D) / (T + D)` (or `0` when `T + D == 0`) to every PSM in that block. Equal
///    scores therefore always see equal cumulative counts and so always get equal FDR, rather
///    than seeing whatever count happened to be reached part-way through the block.
/// 3. Assign `q_value[i] = min(fdr[i..])` (monotone-minimum from the low-score end), so q-values
///    never increase as score decreases (spec.md §3 invariant 5, §8 item 7).
///
/// Does not filter or discard ties; every input PSM appears exactly once in the output, in
/// sorted order, and tied PSMs always receive identical FDR and q-values.
#[must_use]
pub fn compute_fdr(mut psms: Vec<ScoredPsm>, decoy_factor: f64) -> Vec<FdrAnnotated> {
    psms.sort_by_key(|p| std::cmp::Reverse(OrderedFloat(p.score)));

    let mut targets = 0u64;
    let mut decoys = 0u64;
    let mut annotated: Vec<FdrAnnotated> = Vec::with_capacity(psms.len());
    let mut start = 0;
    while start < psms.len() {
        let score = psms[start].score;
        let mut end = start + 1;
        while end < psms.len() && psms[end].score == score {
            end += 1;
        }

        for psm in &psms[start..end] {
            if psm.is_decoy {
                decoys += 1;
            } else {
                targets += 1;
            }
        }
        let total = targets + decoys;
        let fdr = if total == 0 {
            0.0
        } else {
            decoy_factor * decoys as f64 / total as f64
        };
        for &psm in &psms[start..end] {
            annotated.push(FdrAnnotated {
                psm,
                fdr,
                q_value: fdr,
            });
        }

        start = end;
    }

    let mut running_min = f64::INFINITY;
    for entry in annotated.iter_mut().rev() {
        running_min = running_min.min(entry.fdr);
        entry.q_value = running_min;
    }

    annotated
}

/// Retain only the PSMs whose q-value is at or below `threshold` (spec.md §4.10 step 4, default
/// `0.01` per spec.md §6 `fdr_threshold`).
#[must_use]
pub fn filter_by_qvalue(psms: Vec<FdrAnnotated>, threshold: f64) -> Vec<FdrAnnotated> {
    psms.into_iter().filter(|p| p.q_value <= threshold).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn psm(score: f64, is_decoy: bool) -> ScoredPsm {
        ScoredPsm { score, is_decoy }
    }

    #[test]
    fn scenario_s6_fdr_and_qvalue_sequence() {
        // Labels T,T,D,T,D,D already in score-descending order.
        let psms = vec![
            psm(10.0, false),
            psm(9.0, false),
            psm(8.0, true),
            psm(7.0, false),
            psm(6.0, true),
            psm(5.0, true),
        ];
        let annotated = compute_fdr(psms, 2.0);

        let fdrs: Vec<f64> = annotated.iter().map(|a| a.fdr).collect();
        let expected_fdrs = [0.0, 0.0, 2.0 / 3.0, 2.0 / 4.0, 4.0 / 5.0, 6.0 / 6.0];
        for (f, e) in fdrs.iter().zip(expected_fdrs.iter()) {
            assert!((f - e).abs() < 1e-9);
        }

        let qvalues: Vec<f64> = annotated.iter().map(|a| a.q_value).collect();
        let expected_qvalues = [0.0, 0.0, 0.5, 0.5, 0.8, 1.0];
        for (q, e) in qvalues.iter().zip(expected_qvalues.iter()) {
            assert!((q - e).abs() < 1e-9);
        }

        let survivors = filter_by_qvalue(annotated, 0.5);
        assert_eq!(survivors.len(), 4);
    }

    #[test]
    fn qvalues_are_monotone_non_decreasing_as_score_decreases() {
        let psms = vec![
            psm(10.0, false),
            psm(9.0, true),
            psm(8.0, false),
            psm(7.0, true),
            psm(6.0, true),
            psm(5.0, false),
        ];
        let annotated = compute_fdr(psms, 2.0);
        for window in annotated.windows(2) {
            assert!(window[0].q_value <= window[1].q_value);
        }
    }

    #[test]
    fn ties_receive_identical_qvalues() {
        let psms = vec![psm(5.0, false), psm(5.0, true), psm(5.0, false)];
        let annotated = compute_fdr(psms, 2.0);
        let q0 = annotated[0].q_value;
        assert!(annotated.iter().all(|a| (a.q_value - q0).abs() < 1e-12));
    }

    #[test]
    fn empty_input_produces_empty_output() {
        assert!(compute_fdr(Vec::new(), 2.0).is_empty());
    }
}
