//! Small parsing helpers shared by the glycan-composition and enzyme-rule parsers.

use std::num::IntErrorKind;

/// Turn a `ParseIntError` into a short, user-facing explanation, to be used as
/// "The xx number {explanation}" (no trailing period).
pub(crate) const fn explain_number_error(error: &std::num::ParseIntError) -> &'static str {
    match error.kind() {
        IntErrorKind::Empty => "is empty",
        IntErrorKind::InvalidDigit => "contains an invalid character",
        IntErrorKind::NegOverflow => "is too small to fit in the internal representation",
        IntErrorKind::PosOverflow => "is too big to fit in the internal representation",
        _ => "is not a valid number",
    }
}
