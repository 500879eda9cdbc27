//! Protein records: the input to the peptide producer (spec.md §3 Protein entity).

use context_error::{BoxedError, Context, ErrorKind};

use crate::mass::residue_mass;

/// The `InvalidSequenceError` of spec.md §7: a protein or peptide contains an unsupported
/// residue letter. Carries no payload beyond the `Context` highlight, since the offending
/// position is encoded there.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct InvalidSequenceErrorKind;

impl ErrorKind for InvalidSequenceErrorKind {
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

/// A protein loaded from the external protein source (spec.md §6): an identifier, a free-text
/// description, and an uppercase amino-acid sequence. Immutable once constructed; construction
/// is the only place the sequence is validated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Protein {
    id: String,
    description: String,
    sequence: Vec<u8>,
}

impl Protein {
    /// Build a protein, rejecting any residue letter the mass model does not recognize.
    ///
    /// # Errors
    /// Returns an `InvalidSequenceError` naming the offending position (spec.md §7); the
    /// caller (the protein source driver) is expected to skip that protein and continue.
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        sequence: impl Into<String>,
    ) -> Result<Self, BoxedError<'static, InvalidSequenceErrorKind>> {
        let sequence: String = sequence.into();
        if let Some((position, letter)) = sequence
            .bytes()
            .enumerate()
            .find(|(_, b)| residue_mass(*b).is_none())
        {
            return Err(BoxedError::new(
                InvalidSequenceErrorKind,
                "Invalid protein sequence",
                format!(
                    "Residue '{}' at position {} is not one of the 20 standard amino acids",
                    letter as char,
                    position + 1
                ),
                Context::line(None, sequence.clone(), position, 1),
            ));
        }
        Ok(Self {
            id: id.into(),
            description: description.into(),
            sequence: sequence.into_bytes(),
        })
    }

    /// The protein identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The validated amino-acid sequence.
    #[must_use]
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_residue() {
        assert!(Protein::new("P1", "desc", "MKNGXDEK").is_err());
    }

    #[test]
    fn accepts_standard_residues() {
        assert!(Protein::new("P1", "desc", "MKNGTDEK").is_ok());
    }
}
