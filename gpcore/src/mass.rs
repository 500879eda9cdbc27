//! Monoisotopic mass constants and the handful of scalar conversions every scoring stage needs.
//!
//! All masses in this crate (and in `gpindex`/`gpannotate`/`gpident`) are plain `f64` Daltons.
//! There is no unit-conversion surface anywhere in this engine (no Da/Th display formatting, no
//! alternative mass modes), so unlike the wider mass-spectrometry ecosystem this crate does not
//! reach for a generic units-of-measure crate; it does the arithmetic spec.md §4.1 describes,
//! directly in `f64`.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Mass of a proton, used to convert between neutral mass and observed m/z.
pub const PROTON_MASS: f64 = 1.007_276;

/// Mass of a water molecule, added once per peptide backbone.
pub const WATER_MASS: f64 = 18.010_565;

/// Monoisotopic mass of the monosaccharide `H` (hexose).
pub const HEXOSE_MASS: f64 = 162.052_823;
/// Monoisotopic mass of the monosaccharide `N` (HexNAc).
pub const HEXNAC_MASS: f64 = 203.079_373;
/// Monoisotopic mass of the monosaccharide `F` (fucose/deoxyhexose).
pub const FUCOSE_MASS: f64 = 146.057_909;
/// Monoisotopic mass of the monosaccharide `A` (NeuAc/sialic acid).
pub const NEUAC_MASS: f64 = 291.095_417;

/// Monoisotopic residue masses for the 20 standard amino acids, keyed by their one-letter code.
pub static RESIDUE_MASSES: LazyLock<HashMap<u8, f64>> = LazyLock::new(|| {
    [
        (b'G', 57.021_464),
        (b'A', 71.037_114),
        (b'S', 87.032_028),
        (b'P', 97.052_764),
        (b'V', 99.068_414),
        (b'T', 101.047_678),
        (b'C', 103.009_185),
        (b'L', 113.084_064),
        (b'I', 113.084_064),
        (b'N', 114.042_927),
        (b'D', 115.026_943),
        (b'Q', 128.058_578),
        (b'K', 128.094_963),
        (b'E', 129.042_593),
        (b'M', 131.040_485),
        (b'H', 137.058_912),
        (b'F', 147.068_414),
        (b'R', 156.101_111),
        (b'Y', 163.063_329),
        (b'W', 186.079_313),
    ]
    .into_iter()
    .collect()
});

/// Look up the monoisotopic residue mass for a single uppercase amino acid letter.
#[must_use]
pub fn residue_mass(letter: u8) -> Option<f64> {
    RESIDUE_MASSES.get(&letter).copied()
}

/// Peptide neutral monoisotopic mass: sum of residue masses plus one water.
#[must_use]
pub fn peptide_mass(sequence: &[u8]) -> Option<f64> {
    sequence
        .iter()
        .try_fold(WATER_MASS, |acc, &r| residue_mass(r).map(|m| acc + m))
}

/// Glycan neutral monoisotopic mass from a `{H, N, F, A}` composition, per spec.md §4.1.
#[must_use]
pub fn glycan_mass(h: u32, n: u32, f: u32, a: u32) -> f64 {
    f64::from(h) * HEXOSE_MASS
        + f64::from(n) * HEXNAC_MASS
        + f64::from(f) * FUCOSE_MASS
        + f64::from(a) * NEUAC_MASS
}

/// Convert an observed precursor m/z and integer charge to a neutral monoisotopic mass.
///
/// `(mz * z) - z * proton_mass`, per spec.md §4.1.
#[must_use]
pub fn neutral_mass_from_mz(mz: f64, charge: i32) -> f64 {
    let z = f64::from(charge);
    mz * z - z * PROTON_MASS
}

/// Convert a neutral mass back to the m/z it would be observed at for the given charge.
#[must_use]
pub fn mz_from_neutral_mass(neutral_mass: f64, charge: i32) -> f64 {
    let z = f64::from(charge);
    (neutral_mass + z * PROTON_MASS) / z
}

/// Signed parts-per-million mass error of an observed mass against a theoretical one.
///
/// `1e6 * (observed - theoretical) / theoretical`, per spec.md §4.1.
#[must_use]
pub fn ppm_error(observed: f64, theoretical: f64) -> f64 {
    1.0e6 * (observed - theoretical) / theoretical
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glycan_mass_h5n4f1a2_matches_scenario_s2() {
        let mass = glycan_mass(5, 4, 1, 2);
        assert!((mass - 2352.834_017).abs() < 1e-6);
    }

    #[test]
    fn peptide_mass_mk() {
        // M + K residues + water
        let mass = peptide_mass(b"MK").unwrap();
        let expected = residue_mass(b'M').unwrap() + residue_mass(b'K').unwrap() + WATER_MASS;
        assert!((mass - expected).abs() < 1e-9);
    }

    #[test]
    fn peptide_mass_rejects_unknown_residue() {
        assert!(peptide_mass(b"MXK").is_none());
    }

    #[test]
    fn ppm_error_is_zero_at_theoretical() {
        assert!((ppm_error(1000.0, 1000.0)).abs() < 1e-12);
    }

    #[test]
    fn neutral_mass_round_trips_through_mz() {
        let neutral = 2445.040_59;
        let mz = mz_from_neutral_mass(neutral, 2);
        let back = neutral_mass_from_mz(mz, 2);
        assert!((back - neutral).abs() < 1e-9);
    }
}
