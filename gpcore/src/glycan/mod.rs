//! Glycan composition parsing and the structural-class catalog (spec.md C3 / §4.3).

mod catalog;
mod composition;

pub use catalog::{GlycanCatalog, default_catalog, load_catalog};
pub use composition::{Glycan, GlycanClass, InvalidCompositionErrorKind};
