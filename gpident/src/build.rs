//! Wiring C2 (digestion) + C3 (glycan catalog) + C9 (decoys) into the two [`CandidateIndex`]es
//! the orchestrator (C11) searches against (spec.md §4.4/§4.9/§4.11).

use context_error::BasicKind;
use context_error::BoxedError;
use gpcore::glycan::GlycanCatalog;
use gpcore::sequence::{CleavageRule, Protein, digest};
use gpindex::CandidateIndex;

use crate::config::SearchConfig;
use crate::decoy::generate_decoys;

/// Digest every protein in `proteins` under `config`'s enzyme/length/missed-cleavage rules,
/// generate one decoy per resulting peptide (spec.md C9), and build the mass-sorted target and
/// decoy candidate indices (spec.md C4) against `glycans`.
///
/// # Errors
/// Returns an `UnknownEnzymeError` (spec.md §7, fatal at startup) if `config.enzyme` does not
/// name one of the six recognized cleavage rules.
pub fn build_indices(
    proteins: &[Protein],
    glycans: &GlycanCatalog,
    config: &SearchConfig,
) -> Result<(CandidateIndex, CandidateIndex), BoxedError<'static, BasicKind>> {
    let rule = CleavageRule::by_name(&config.enzyme)?;

    let mut target_peptides = Vec::new();
    for protein in proteins {
        target_peptides.extend(digest(
            protein,
            rule,
            config.missed_cleavages,
            config.min_peptide_length,
            config.max_peptide_length,
        ));
    }
    log::info!(
        "digested {} proteins into {} peptides (enzyme={}, missed_cleavages<={})",
        proteins.len(),
        target_peptides.len(),
        config.enzyme,
        config.missed_cleavages
    );

    let decoy_peptides = generate_decoys(&target_peptides);
    let glycan_list: Vec<_> = glycans.glycans().to_vec();

    let target_index = CandidateIndex::build_parallel(target_peptides, glycan_list.clone());
    let decoy_index = CandidateIndex::build_parallel(decoy_peptides, glycan_list);
    log::info!(
        "built candidate indices: {} target records, {} decoy records",
        target_index.len(),
        decoy_index.len()
    );

    Ok((target_index, decoy_index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpcore::glycan::default_catalog;

    #[test]
    fn builds_non_empty_target_and_decoy_indices() {
        let proteins = vec![Protein::new("P1", "desc", "MKNGTDEKNGSDEKNGTDEFK").unwrap()];
        let catalog = default_catalog();
        let config = SearchConfig::default();
        let (target, decoy) = build_indices(&proteins, &catalog, &config).unwrap();
        assert!(!target.is_empty());
        assert!(!decoy.is_empty());
    }

    #[test]
    fn unknown_enzyme_is_rejected() {
        let proteins = vec![Protein::new("P1", "desc", "MKNGTDEK").unwrap()];
        let catalog = default_catalog();
        let mut config = SearchConfig::default();
        config.enzyme = "not-an-enzyme".to_string();
        assert!(build_indices(&proteins, &catalog, &config).is_err());
    }
}
