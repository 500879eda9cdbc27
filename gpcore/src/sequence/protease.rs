//! Cleavage rules (spec.md §4.2): the six recognized enzymes, each a set of cleavage residues
//! plus an optional C-terminal blocking residue.

use context_error::{BasicKind, BoxedError, Context};

/// A configured enzymatic cleavage rule.
///
/// Grounded in the site-scanning digestion pattern of the teacher's
/// `Peptidoform::digest` (`mzcore/src/sequence/peptidoform/peptidoform.rs`), which turns a
/// protease into a list of split points and then slides a missed-cleavage window over them;
/// the difference here is that a [`CleavageRule`] is data (residues + blocker) rather than a
/// parsed placement-rule object, since spec.md only asks for six fixed rules.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CleavageRule {
    /// Cleaves after K or R, blocked by a following P.
    Trypsin,
    /// Cleaves after F, W, or Y.
    Chymotrypsin,
    /// Cleaves after F or L.
    Pepsin,
    /// Cleaves after K.
    LysC,
    /// Cleaves after R.
    ArgC,
    /// Cleaves after D or E.
    GluC,
}

impl CleavageRule {
    /// Resolve an enzyme name (case-insensitive) to its [`CleavageRule`].
    ///
    /// # Errors
    /// Returns an `UnknownEnzymeError` (fatal per spec.md §7) if `name` does not match one of
    /// the six recognized rules.
    pub fn by_name(name: &str) -> Result<Self, BoxedError<'static, BasicKind>> {
        match name.to_ascii_lowercase().as_str() {
            "trypsin" => Ok(Self::Trypsin),
            "chymotrypsin" => Ok(Self::Chymotrypsin),
            "pepsin" => Ok(Self::Pepsin),
            "lys-c" | "lysc" => Ok(Self::LysC),
            "arg-c" | "argc" => Ok(Self::ArgC),
            "glu-c" | "gluc" => Ok(Self::GluC),
            _ => Err(BoxedError::new(
                BasicKind::Error,
                "Unknown enzyme",
                format!(
                    "'{name}' is not a recognized cleavage rule; expected one of trypsin, \
                     chymotrypsin, pepsin, lys-c, arg-c, glu-c"
                ),
                Context::show(name.to_string()),
            )),
        }
    }

    /// The residues this rule cleaves after.
    #[must_use]
    pub const fn cleaves_after(self) -> &'static [u8] {
        match self {
            Self::Trypsin => b"KR",
            Self::Chymotrypsin => b"FWY",
            Self::Pepsin => b"FL",
            Self::LysC => b"K",
            Self::ArgC => b"R",
            Self::GluC => b"DE",
        }
    }

    /// The residue that blocks cleavage when it immediately follows a cleavage site, if any.
    #[must_use]
    pub const fn blocker(self) -> Option<u8> {
        match self {
            Self::Trypsin => Some(b'P'),
            Self::Chymotrypsin | Self::Pepsin | Self::LysC | Self::ArgC | Self::GluC => None,
        }
    }

    /// Interior cleavage sites for `sequence`: 1-based-exclusive split points strictly between
    /// the start and end of the sequence, in ascending order.
    #[must_use]
    pub fn cleavage_sites(self, sequence: &[u8]) -> Vec<usize> {
        let cleaves_after = self.cleaves_after();
        let blocker = self.blocker();
        sequence
            .iter()
            .enumerate()
            .filter_map(|(i, residue)| {
                if !cleaves_after.contains(residue) {
                    return None;
                }
                let site = i + 1;
                if site >= sequence.len() {
                    return None;
                }
                let blocked = blocker.is_some_and(|b| sequence.get(site) == Some(&b));
                (!blocked).then_some(site)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trypsin_cleaves_after_k_and_r_not_before_p() {
        // MKNGTDEK: K at index 1 (0-based) -> site 2; followed by N, not P -> kept.
        let sites = CleavageRule::Trypsin.cleavage_sites(b"MKNGTDEK");
        assert_eq!(sites, vec![2]);
    }

    #[test]
    fn trypsin_blocks_cleavage_before_proline() {
        let sites = CleavageRule::Trypsin.cleavage_sites(b"AKPDE");
        assert!(sites.is_empty());
    }

    #[test]
    fn unknown_enzyme_name_is_rejected() {
        assert!(CleavageRule::by_name("not-an-enzyme").is_err());
    }

    #[test]
    fn enzyme_names_are_case_insensitive() {
        assert_eq!(CleavageRule::by_name("TRYPSIN").unwrap(), CleavageRule::Trypsin);
    }
}
