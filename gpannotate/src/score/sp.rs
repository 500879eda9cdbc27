//! Preliminary Sp scorer (spec.md C7 / §4.7).

use serde::{Deserialize, Serialize};

/// The result of [`score_sp`]: the intensity-weighted matched-peak score, plus how many
/// theoretical peaks matched a non-zero observed bin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpResult {
    /// `Σ v[i] * t[i]` over every bin `i` where `t[i] > 0`.
    pub sp: f64,
    /// Count of bins where both `v[i] > 0` and `t[i] > 0`.
    pub matched_peaks: usize,
}

/// Score the observed vector `v` against the theoretical vector `t` (spec.md §4.7). Both must
/// be the same length (one entry per bin); a length mismatch indicates `v` and `t` were built
/// from different [`crate::spectrum::BinningParams`] and is a programmer error, not a data error.
///
/// # Panics
/// Panics if `v.len() != t.len()`.
#[must_use]
pub fn score_sp(v: &[f64], t: &[f64]) -> SpResult {
    assert_eq!(
        v.len(),
        t.len(),
        "observed and theoretical vectors must share the same bin grid"
    );
    let mut sp = 0.0;
    let mut matched_peaks = 0;
    for (&vi, &ti) in v.iter().zip(t.iter()) {
        if ti > 0.0 {
            sp += vi * ti;
            if vi > 0.0 {
                matched_peaks += 1;
            }
        }
    }
    SpResult { sp, matched_peaks }
}

/// Keep the top `k` of `candidates` by [`SpResult::sp`] descending, as spec.md §4.7 describes:
/// "keep only the top k candidates that proceed to XCorr." Ties are broken by the candidates'
/// original order (stable sort).
pub fn top_k_by_sp<T>(mut candidates: Vec<(T, SpResult)>, k: usize) -> Vec<(T, SpResult)> {
    candidates.sort_by(|a, b| {
        b.1.sp
            .partial_cmp(&a.1.sp)
            .expect("Sp scores are always finite")
    });
    candidates.truncate(k);
    candidates
}
