//! The glycan library: either the default enumerated set or an externally supplied text file
//! (spec.md §4.3/§6).

use std::io::BufRead;

use context_error::BoxedError;

use crate::glycan::composition::{Glycan, InvalidCompositionErrorKind};

/// A loaded collection of glycan compositions to search against.
#[derive(Clone, Debug, Default)]
pub struct GlycanCatalog {
    glycans: Vec<Glycan>,
}

impl GlycanCatalog {
    /// The glycans in this catalog.
    #[must_use]
    pub fn glycans(&self) -> &[Glycan] {
        &self.glycans
    }

    /// Number of glycans in this catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glycans.len()
    }

    /// Whether this catalog holds no glycans.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glycans.is_empty()
    }
}

/// Parse one composition per non-comment, non-blank line. `#` starts a line comment; both LF
/// and CRLF line endings are accepted (spec.md §6). Malformed lines are collected as warnings
/// rather than aborting the load (spec.md §7: `InvalidCompositionError` is recovered locally).
pub fn load_catalog<R: BufRead>(
    reader: R,
) -> Result<
    (GlycanCatalog, Vec<BoxedError<'static, InvalidCompositionErrorKind>>),
    std::io::Error,
> {
    let mut glycans = Vec::new();
    let mut warnings = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim_end_matches('\r');
        let content = trimmed.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        match Glycan::parse(content) {
            Ok(glycan) => glycans.push(glycan),
            Err(err) => warnings.push(err),
        }
    }
    Ok((GlycanCatalog { glycans }, warnings))
}

/// The finite default enumeration used when no external glycan-library file is supplied
/// (spec.md §4.3), spanning all five structural classes.
#[must_use]
pub fn default_catalog() -> GlycanCatalog {
    const DEFAULT_COMPOSITIONS: &[&str] = &[
        // High-Mannose
        "H5N2", "H6N2", "H7N2", "H8N2", "H9N2",
        // Fucosylated
        "H3N4F1", "H4N4F1", "H5N4F1", "H3N5F1",
        // Sialylated
        "H5N4A1", "H5N4A2", "H6N5A2",
        // Sialofucosylated
        "H5N4F1A1", "H5N4F1A2", "H6N5F1A2",
        // Complex/Hybrid
        "H3N4", "H4N4", "H5N4", "H4N5", "H5N5", "H3N5",
    ];
    let glycans = DEFAULT_COMPOSITIONS
        .iter()
        .map(|c| Glycan::parse(c).expect("default compositions are valid by construction"))
        .collect();
    GlycanCatalog { glycans }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn default_catalog_spans_all_five_classes() {
        use crate::glycan::composition::GlycanClass::{
            ComplexHybrid, Fucosylated, HighMannose, Sialofucosylated, Sialylated,
        };
        let catalog = default_catalog();
        for class in [
            HighMannose,
            Fucosylated,
            Sialylated,
            Sialofucosylated,
            ComplexHybrid,
        ] {
            assert!(
                catalog.glycans().iter().any(|g| g.class() == class),
                "missing a glycan of class {class:?}"
            );
        }
    }

    #[test]
    fn load_catalog_skips_comments_and_blank_lines() {
        let text = "H5N2\n# a comment\n\nH3N4F1\r\n";
        let (catalog, warnings) = load_catalog(Cursor::new(text)).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn load_catalog_warns_on_malformed_lines_but_keeps_valid_ones() {
        let text = "H5N2\nnot-a-glycan\nH3N4F1\n";
        let (catalog, warnings) = load_catalog(Cursor::new(text)).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(catalog.len(), 2);
    }
}
