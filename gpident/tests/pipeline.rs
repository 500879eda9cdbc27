//! End-to-end integration test: digestion -> decoys -> candidate indices -> orchestrator -> FDR.

use gpannotate::prelude::Spectrum;
use gpcore::glycan::{Glycan, default_catalog};
use gpcore::mass::{mz_from_neutral_mass, peptide_mass};
use gpcore::sequence::Protein;
use gpident::prelude::*;

fn synthetic_spectrum(scan_id: &str, mass: f64, charge: i32) -> Spectrum {
    let mz = mz_from_neutral_mass(mass, charge);
    // A handful of generic fragment peaks; enough to exercise preprocessing and scoring without
    // needing to reproduce a real theoretical spectrum bin-for-bin.
    let fragment_mz = vec![150.0, 250.3, 400.7, 600.1, 820.4];
    let intensity = vec![40.0, 120.0, 80.0, 15.0, 60.0];
    Spectrum::new(scan_id, 120.0, 2, Some(mz), charge, fragment_mz, intensity).unwrap()
}

#[test]
fn full_pipeline_produces_fdr_controlled_psms() {
    let proteins = vec![
        Protein::new(
            "SP1",
            "synthetic test protein",
            "MKNGTDEKNGSDEKNGTDEFKMNGTAEKMKNGTWEK",
        )
        .unwrap(),
    ];
    let catalog = default_catalog();
    let config = SearchConfig::default();

    let (target_index, decoy_index) = build_indices(&proteins, &catalog, &config).unwrap();
    assert!(!target_index.is_empty());
    assert!(!decoy_index.is_empty());

    // Build spectra at exactly the neutral mass of a few known (peptide, glycan) pairs produced
    // by digesting `proteins` above, so the search is guaranteed to find hits.
    let sequon_peptides = ["NGTDEK", "NGSDEK", "NGTDEFK"];
    let glycan_compositions = ["H5N2", "H3N4F1", "H5N4A2"];
    let mut spectra = Vec::new();
    for (i, (sequence, composition)) in sequon_peptides
        .iter()
        .zip(glycan_compositions.iter())
        .enumerate()
    {
        let mass = peptide_mass(sequence.as_bytes()).unwrap() + Glycan::parse(composition).unwrap().mass();
        spectra.push(synthetic_spectrum(&format!("scan{i}"), mass, 2));
    }
    spectra.push(synthetic_spectrum("scan_nomatch", 1_000_000.0, 2));
    // An MS1 scan, which must be skipped outright.
    spectra.push(Spectrum::new("scan_ms1", 5.0, 1, None, 0, vec![], vec![]).unwrap());

    let token = CancellationToken::new();
    let outcome = search(spectra, &target_index, &decoy_index, &config, &token).unwrap();

    assert_eq!(outcome.summary.total_spectra, 5);
    assert_eq!(outcome.summary.skipped.get(&SkipReason::NotMs2), Some(&1));
    assert_eq!(outcome.summary.skipped.get(&SkipReason::NoCandidates), Some(&1));
    assert!(outcome.summary.scored_spectra >= 3);
    assert!(!outcome.psms.is_empty());

    let annotated = assign_q_values(outcome.psms, config.decoy_factor);
    assert!(annotated.iter().all(|p| p.q_value.is_some()));

    // q-values are monotone non-decreasing as score decreases.
    let mut sorted = annotated.clone();
    sorted.sort_by(|a, b| b.xcorr.partial_cmp(&a.xcorr).unwrap());
    for window in sorted.windows(2) {
        assert!(window[0].q_value.unwrap() <= window[1].q_value.unwrap());
    }

    let survivors = filter_psms_by_qvalue(annotated, config.fdr_threshold);
    assert!(survivors.iter().all(|p| p.q_value.unwrap() <= config.fdr_threshold));
}

#[test]
fn cancellation_before_search_skips_every_spectrum() {
    let proteins = vec![Protein::new("SP1", "desc", "MKNGTDEKNGSDEKNGTDEFK").unwrap()];
    let catalog = default_catalog();
    let config = SearchConfig::default();
    let (target_index, decoy_index) = build_indices(&proteins, &catalog, &config).unwrap();

    let mass = peptide_mass(b"NGTDEK").unwrap() + Glycan::parse("H5N2").unwrap().mass();
    let spectrum = synthetic_spectrum("scan0", mass, 2);

    let token = CancellationToken::new();
    token.cancel();
    let outcome = search(vec![spectrum], &target_index, &decoy_index, &config, &token).unwrap();
    assert_eq!(outcome.summary.skipped.get(&SkipReason::Cancelled), Some(&1));
    assert!(outcome.psms.is_empty());
}
