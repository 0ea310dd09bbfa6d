//! Numeric literal classifier used to keep per-ticket numbers out of label values.

use regex::Regex;
use std::sync::OnceLock;

static DECIMAL: OnceLock<Regex> = OnceLock::new();

fn decimal_literal() -> &'static Regex {
    DECIMAL.get_or_init(|| {
        Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$")
            .expect("decimal literal pattern is valid")
    })
}

/// True iff `s` is a decimal floating-point literal: optional sign, digits,
/// optional decimal point, optional exponent. Whitespace, `inf`, `nan` and
/// hex forms are not numeric.
pub fn is_numeric(s: &str) -> bool {
    !s.is_empty() && decimal_literal().is_match(s)
}
