//! Parsing of the `([HNFA]\d+)+` glycan composition grammar (spec.md §4.3) and its five-way
//! structural classification.
//!
//! Grounded in the scanning structure of the teacher's
//! `MonoSaccharide::pro_forma_composition` (`mzcore/src/glycan/composition.rs`): walk the
//! string left to right, recognize one monosaccharide token at a time, and report the exact
//! byte range of anything that doesn't parse. The grammar here is far smaller than ProForma's
//! (four fixed letters, no custom formulas, no synonyms), so the token recognizer is a single
//! regex rather than a name table.

use std::sync::LazyLock;

use context_error::{BoxedError, Context, ErrorKind};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::mass::glycan_mass;

/// The `InvalidCompositionError` of spec.md §7: a glycan string doesn't match the
/// `([HNFA]\d+)+` grammar. Non-fatal: the catalog loader skips the line and continues
/// (spec.md §7 propagation policy), as long as at least one glycan parsed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct InvalidCompositionErrorKind;

impl ErrorKind for InvalidCompositionErrorKind {
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

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[HNFA][0-9]+").unwrap());
static WHOLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:[HNFA][0-9]+)+$").unwrap());

/// The five structural classes a glycan composition is partitioned into (spec.md §4.3).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum GlycanClass {
    /// `H >= 5 AND N = 2 AND F = 0 AND A = 0`.
    HighMannose,
    /// `A > 0 AND F > 0`.
    Sialofucosylated,
    /// `A > 0` (and not sialofucosylated).
    Sialylated,
    /// `F > 0` (and not sialylated or sialofucosylated).
    Fucosylated,
    /// Everything else.
    ComplexHybrid,
}

impl GlycanClass {
    /// Classify a `{H, N, F, A}` composition, applying the ordered rules of spec.md §4.3.
    #[must_use]
    pub const fn classify(h: u32, n: u32, f: u32, a: u32) -> Self {
        if h >= 5 && n == 2 && f == 0 && a == 0 {
            Self::HighMannose
        } else if a > 0 && f > 0 {
            Self::Sialofucosylated
        } else if a > 0 {
            Self::Sialylated
        } else if f > 0 {
            Self::Fucosylated
        } else {
            Self::ComplexHybrid
        }
    }
}

/// A parsed glycan composition with its precomputed monoisotopic mass and structural class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Glycan {
    composition: String,
    h: u32,
    n: u32,
    f: u32,
    a: u32,
    mass: f64,
    class: GlycanClass,
}

impl Glycan {
    /// Parse a composition string of the form `H#N#F#A#` (spec.md §4.3): case sensitive,
    /// species with no token present implies a count of 0.
    ///
    /// # Errors
    /// Returns an `InvalidCompositionError` if `text` does not match `([HNFA]\d+)+`.
    pub fn parse(text: &str) -> Result<Self, BoxedError<'static, InvalidCompositionErrorKind>> {
        if !WHOLE.is_match(text) {
            return Err(BoxedError::new(
                InvalidCompositionErrorKind,
                "Invalid glycan composition",
                format!(
                    "'{text}' does not match the glycan composition grammar ([HNFA]<number>)+"
                ),
                Context::show(text.to_string()),
            ));
        }

        let mut counts = [0u32; 4]; // H, N, F, A
        for token in TOKEN.find_iter(text) {
            let token = token.as_str();
            let letter = token.as_bytes()[0];
            let number: u32 = token[1..].parse().map_err(|e| {
                BoxedError::new(
                    InvalidCompositionErrorKind,
                    "Invalid glycan composition",
                    format!(
                        "The monosaccharide count '{}' {}",
                        &token[1..],
                        crate::helper_functions::explain_number_error(&e)
                    ),
                    Context::show(text.to_string()),
                )
            })?;
            let slot = match letter {
                b'H' => 0,
                b'N' => 1,
                b'F' => 2,
                b'A' => 3,
                _ => unreachable!("token regex only matches H, N, F, A"),
            };
            counts[slot] += number;
        }
        let [h, n, f, a] = counts;
        let mass = glycan_mass(h, n, f, a);
        let class = GlycanClass::classify(h, n, f, a);

        Ok(Self {
            composition: text.to_string(),
            h,
            n,
            f,
            a,
            mass,
            class,
        })
    }

    /// The original composition string.
    #[must_use]
    pub fn composition(&self) -> &str {
        &self.composition
    }

    /// Hexose count.
    #[must_use]
    pub const fn hexose(&self) -> u32 {
        self.h
    }

    /// `HexNAc` count.
    #[must_use]
    pub const fn hexnac(&self) -> u32 {
        self.n
    }

    /// Fucose count.
    #[must_use]
    pub const fn fucose(&self) -> u32 {
        self.f
    }

    /// `NeuAc` (sialic acid) count.
    #[must_use]
    pub const fn neuac(&self) -> u32 {
        self.a
    }

    /// Monoisotopic neutral mass of this glycan.
    #[must_use]
    pub const fn mass(&self) -> f64 {
        self.mass
    }

    /// The structural class this composition falls into.
    #[must_use]
    pub const fn class(&self) -> GlycanClass {
        self.class
    }
}
