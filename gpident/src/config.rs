//! Search configuration (spec.md §6 parameter table).

use serde::{Deserialize, Serialize};

/// The recognized search parameters, with the defaults spec.md §6 documents. Constructed once
/// per run and passed by reference into the orchestrator; never mutated afterwards (spec.md §9:
/// "implicit globals become values constructed at startup and passed in").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Cleavage rule name (spec.md §4.2).
    pub enzyme: String,
    /// Maximum inclusive missed cleavages.
    pub missed_cleavages: usize,
    /// Inclusive minimum peptide length.
    pub min_peptide_length: usize,
    /// Inclusive maximum peptide length.
    pub max_peptide_length: usize,
    /// Precursor mass window half-width, in ppm.
    pub tolerance_ppm: f64,
    /// Candidates retained after Sp pre-filtering, per spectrum.
    pub sp_top_k: usize,
    /// Maximum fragment charge considered when building theoretical spectra.
    pub max_charge: u8,
    /// Preprocessing bin width, in Da.
    pub bin_width: f64,
    /// Upper bound of the bin grid, in Da.
    pub max_mz: f64,
    /// Number of region-normalization windows.
    pub regions: usize,
    /// q-value cutoff for the final PSM list.
    pub fdr_threshold: f64,
    /// Multiplier on the decoy count in the FDR formula (spec.md §4.10: `2` for a concatenated
    /// target+decoy search, `1` for a pooled one).
    pub decoy_factor: f64,
    /// Worker pool size; `None` means "use the number of physical cores" (spec.md §5).
    pub workers: Option<usize>,
    /// Number of top-XCorr PSMs to keep per spectrum (spec.md §4.11 step 6 "plus optionally
    /// runners-up"). `1` keeps only the best hit.
    pub psms_per_spectrum: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enzyme: "trypsin".to_string(),
            missed_cleavages: 2,
            min_peptide_length: 6,
            max_peptide_length: 40,
            tolerance_ppm: 10.0,
            sp_top_k: 500,
            max_charge: 2,
            bin_width: 1.000_508,
            max_mz: 2000.0,
            regions: 10,
            fdr_threshold: 0.01,
            decoy_factor: 2.0,
            workers: None,
            psms_per_spectrum: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_table() {
        let config = SearchConfig::default();
        assert_eq!(config.enzyme, "trypsin");
        assert_eq!(config.missed_cleavages, 2);
        assert_eq!(config.min_peptide_length, 6);
        assert_eq!(config.max_peptide_length, 40);
        assert!((config.tolerance_ppm - 10.0).abs() < 1e-12);
        assert_eq!(config.sp_top_k, 500);
        assert_eq!(config.max_charge, 2);
        assert!((config.bin_width - 1.000_508).abs() < 1e-12);
        assert!((config.max_mz - 2000.0).abs() < 1e-12);
        assert_eq!(config.regions, 10);
        assert!((config.fdr_threshold - 0.01).abs() < 1e-12);
        assert!((config.decoy_factor - 2.0).abs() < 1e-12);
        assert_eq!(config.workers, None);
        assert_eq!(config.psms_per_spectrum, 1);
    }

    #[test]
    fn deserializes_a_partial_json_object_with_defaults_filled_in() {
        let config: SearchConfig = serde_json::from_str(r#"{"tolerance_ppm": 20.0}"#).unwrap();
        assert!((config.tolerance_ppm - 20.0).abs() < 1e-12);
        assert_eq!(config.enzyme, "trypsin");
    }
}
