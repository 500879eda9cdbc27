//! Theoretical fragment prediction for a (peptide, glycan) candidate (spec.md C6 / §4.6).
//!
//! Grounded in the teacher's fragment model (`mzannotate/src/fragment/fragment.rs`): a labeled
//! peak type (`ion`, `charge`, `formula`) produced by walking the peptide backbone and emitting
//! one fragment per cleavage site and charge state. This module keeps that shape — a label, an
//! m/z, and a relative intensity — but drops the generic `FragmentType`/`NeutralLoss` machinery
//! in favor of the four fixed ion families spec.md §4.6 names.

use gpcore::glycan::Glycan;
use gpcore::mass::{PROTON_MASS, WATER_MASS, residue_mass};
use gpcore::sequence::Peptide;
use serde::{Deserialize, Serialize};

use crate::spectrum::BinningParams;

/// The seven fixed-m/z oxonium ions spec.md §4.6 names, together with the composition count
/// that must be positive for the ion to be emitted.
const OXONIUM_IONS: [(f64, OxoniumSpecies); 7] = [
    (204.086_7, OxoniumSpecies::HexNAc),
    (366.139_6, OxoniumSpecies::HexHexNAc),
    (163.060_1, OxoniumSpecies::Hexose),
    (147.065_2, OxoniumSpecies::HexNAcFragment),
    (292.102_7, OxoniumSpecies::NeuAc),
    (512.197_2, OxoniumSpecies::NeuAcHexNAc),
    (657.235_0, OxoniumSpecies::NeuAcHexHexNAc),
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum OxoniumSpecies {
    HexNAc,
    HexHexNAc,
    Hexose,
    HexNAcFragment,
    NeuAc,
    NeuAcHexNAc,
    NeuAcHexHexNAc,
}

impl OxoniumSpecies {
    /// Whether `glycan`'s composition is consistent with this species being present.
    const fn consistent_with(self, glycan: &Glycan) -> bool {
        match self {
            Self::HexNAc | Self::HexNAcFragment => glycan.hexnac() > 0,
            Self::HexHexNAc => glycan.hexose() > 0 && glycan.hexnac() > 0,
            Self::Hexose => glycan.hexose() > 0,
            Self::NeuAc => glycan.neuac() > 0,
            Self::NeuAcHexNAc => glycan.neuac() > 0 && glycan.hexnac() > 0,
            Self::NeuAcHexHexNAc => {
                glycan.neuac() > 0 && glycan.hexose() > 0 && glycan.hexnac() > 0
            }
        }
    }
}

/// Relative intensity of a backbone b/y ion (spec.md §4.6).
const BACKBONE_INTENSITY: f64 = 1.0;
/// Relative intensity of a Y0 (peptide+glycan stub) ion (spec.md §4.6).
const Y0_INTENSITY: f64 = 0.5;
/// Relative intensity of an oxonium ion (spec.md §4.6).
const OXONIUM_INTENSITY: f64 = 0.8;

/// Which ion family a [`TheoreticalPeak`] belongs to, and at what backbone position/charge.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum IonLabel {
    /// N-terminal backbone fragment retaining the first `index` residues, at the given charge.
    B {
        /// Number of N-terminal residues in the fragment.
        index: usize,
        /// Fragment charge.
        charge: u8,
    },
    /// C-terminal backbone fragment retaining the last `index` residues, at the given charge.
    Y {
        /// Number of C-terminal residues in the fragment.
        index: usize,
        /// Fragment charge.
        charge: u8,
    },
    /// A y-ion with the intact glycan still attached (spec.md §4.6 "Y0 family").
    Y0 {
        /// Number of C-terminal residues in the underlying y-ion.
        index: usize,
        /// Fragment charge.
        charge: u8,
    },
    /// One of the seven fixed-m/z oxonium diagnostic ions, identified by its position in
    /// spec.md §4.6's list (0-based).
    Oxonium {
        /// Index into the fixed oxonium ion table.
        index: usize,
    },
}

/// One predicted fragment ion: its m/z, relative intensity in `(0, 1]`, and label.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TheoreticalPeak {
    /// The fragment's m/z.
    pub mz: f64,
    /// Relative intensity in `(0, 1]` (spec.md §3), used only to build the reference vector.
    pub relative_intensity: f64,
    /// Which ion this peak is.
    pub label: IonLabel,
}

/// Predict the full theoretical peak set for `peptide` carrying `glycan`, at backbone charges
/// `1..=max_charge` (spec.md §4.6).
///
/// Backbone prefix/suffix masses are accumulated once over the sequence. Peptides shorter than 2
/// residues produce no backbone ions (there is no interior cleavage site), but still yield
/// oxonium ions if `glycan`'s composition matches.
#[must_use]
pub fn build_theoretical(peptide: &Peptide, glycan: &Glycan, max_charge: u8) -> Vec<TheoreticalPeak> {
    let sequence = peptide.sequence();
    let length = sequence.len();
    let mut peaks = Vec::new();

    if length >= 2 {
        let mut prefix_mass = 0.0;
        let mut prefix_masses = vec![0.0; length];
        for (i, &residue) in sequence.iter().enumerate() {
            prefix_mass += residue_mass(residue).unwrap_or(0.0);
            prefix_masses[i] = prefix_mass;
        }
        let total_residue_mass = prefix_mass;

        for i in 1..length {
            let prefix = prefix_masses[i - 1];
            let suffix = total_residue_mass - prefix;

            for charge in 1..=max_charge {
                let c = f64::from(charge);
                let b_mz = (prefix + c * PROTON_MASS) / c;
                peaks.push(TheoreticalPeak {
                    mz: b_mz,
                    relative_intensity: BACKBONE_INTENSITY,
                    label: IonLabel::B { index: i, charge },
                });

                let y_mz = (WATER_MASS + suffix + c * PROTON_MASS) / c;
                peaks.push(TheoreticalPeak {
                    mz: y_mz,
                    relative_intensity: BACKBONE_INTENSITY,
                    label: IonLabel::Y { index: i, charge },
                });

                let y0_mz = y_mz + glycan.mass() / c;
                peaks.push(TheoreticalPeak {
                    mz: y0_mz,
                    relative_intensity: Y0_INTENSITY,
                    label: IonLabel::Y0 { index: i, charge },
                });
            }
        }
    }

    for (index, &(mz, species)) in OXONIUM_IONS.iter().enumerate() {
        if species.consistent_with(glycan) {
            peaks.push(TheoreticalPeak {
                mz,
                relative_intensity: OXONIUM_INTENSITY,
                label: IonLabel::Oxonium { index },
            });
        }
    }

    peaks
}

/// Vectorize a theoretical peak set onto the same bin grid [`crate::spectrum::preprocess`] uses
/// (spec.md §4.6): peaks outside `[0, params.max_mz]` are dropped, and each bin holds the
/// maximum relative intensity of any peak that lands in it.
#[must_use]
pub fn vectorize(peaks: &[TheoreticalPeak], params: &BinningParams) -> Vec<f64> {
    let mut vector = vec![0.0f64; params.bin_count()];
    for peak in peaks {
        if peak.mz < 0.0 || peak.mz > params.max_mz {
            continue;
        }
        let bin = params.bin_index(peak.mz);
        vector[bin] = vector[bin].max(peak.relative_intensity);
    }
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpcore::sequence::{CleavageRule, Protein, digest};

    fn peptide_with_sequon() -> Peptide {
        let protein = Protein::new("P1", "desc", "MKNGTDEK").unwrap();
        digest(&protein, CleavageRule::Trypsin, 0, 3, 30)
            .into_iter()
            .find(|p| p.sequence() == b"NGTDEK")
            .unwrap()
    }

    #[test]
    fn backbone_ions_cover_every_interior_cleavage_site() {
        let peptide = peptide_with_sequon();
        let glycan = Glycan::parse("H5N2").unwrap();
        let peaks = build_theoretical(&peptide, &glycan, 2);

        let b_count = peaks
            .iter()
            .filter(|p| matches!(p.label, IonLabel::B { .. }))
            .count();
        // (length - 1) cleavage sites * 2 charge states
        assert_eq!(b_count, (peptide.sequence().len() - 1) * 2);
    }

    #[test]
    fn y0_stub_adds_glycan_mass_to_the_matching_y_ion() {
        let peptide = peptide_with_sequon();
        let glycan = Glycan::parse("H5N2").unwrap();
        let peaks = build_theoretical(&peptide, &glycan, 1);

        let y1 = peaks
            .iter()
            .find(|p| matches!(p.label, IonLabel::Y { index: 1, charge: 1 }))
            .unwrap();
        let y0_1 = peaks
            .iter()
            .find(|p| matches!(p.label, IonLabel::Y0 { index: 1, charge: 1 }))
            .unwrap();
        assert!((y0_1.mz - (y1.mz + glycan.mass())).abs() < 1e-9);
    }

    #[test]
    fn oxonium_ions_require_matching_composition() {
        let peptide = peptide_with_sequon();
        let no_sialic_acid = Glycan::parse("H5N2").unwrap();
        let peaks = build_theoretical(&peptide, &no_sialic_acid, 1);
        assert!(!peaks.iter().any(|p| matches!(
            p.label,
            IonLabel::Oxonium { index } if (292.102_7 - OXONIUM_IONS[index].0).abs() < 1e-6
        )));

        let with_sialic_acid = Glycan::parse("H5N4F1A2").unwrap();
        let peaks = build_theoretical(&peptide, &with_sialic_acid, 1);
        assert!(
            peaks
                .iter()
                .any(|p| matches!(p.label, IonLabel::Oxonium { index: 4 }))
        );
    }

    #[test]
    fn vectorize_keeps_the_maximum_intensity_per_bin() {
        let peaks = vec![
            TheoreticalPeak {
                mz: 500.3,
                relative_intensity: 0.5,
                label: IonLabel::Y0 { index: 1, charge: 1 },
            },
            TheoreticalPeak {
                mz: 500.3,
                relative_intensity: 1.0,
                label: IonLabel::B { index: 1, charge: 1 },
            },
        ];
        let params = BinningParams::default();
        let vector = vectorize(&peaks, &params);
        assert!((vector[params.bin_index(500.3)] - 1.0).abs() < 1e-9);
    }
}
