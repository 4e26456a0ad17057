use once_cell::sync::Lazy;
use regex::Regex;

static HEX_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]+$").expect("valid regex"));
static LONG_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{6,}").expect("valid regex"));
static UUID_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid regex")
});
static CLASS_HASH_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{2,6}-[a-f0-9]{4,}$").expect("valid regex"));

/// Rejects ids that look machine-generated rather than stable: long
/// hex-only strings, long digit runs, or UUID-shaped values.
pub fn is_generated_id(value: &str) -> bool {
    if value.len() > 20 && HEX_ONLY.is_match(value) {
        return true;
    }
    if LONG_DIGITS.is_match(value) {
        return true;
    }
    if value.len() == 36 && UUID_SHAPE.is_match(value) {
        return true;
    }
    false
}

/// Rejects classes that look generated: long digit-bearing tokens,
/// CSS-module hash prefixes, double-underscore (BEM-hash) names, or
/// `css-`-prefixed module identifiers.
pub fn is_generated_class(value: &str) -> bool {
    if value.len() > 12 && value.chars().any(|c| c.is_ascii_digit()) {
        return true;
    }
    if CLASS_HASH_PREFIX.is_match(value) {
        return true;
    }
    if value.contains("__") {
        return true;
    }
    if value.starts_with("css-") && value.len() >= 10 {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_hex_and_uuid_ids() {
        assert!(is_generated_id("a3f9c1e8d7b6054321af"));
        assert!(is_generated_id("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_generated_id("submit-button"));
    }

    #[test]
    fn rejects_generated_classes() {
        assert!(is_generated_class("styled-a1b2c3"));
        assert!(is_generated_class("btn__primary123456"));
        assert!(is_generated_class("css-xk29fz"));
        assert!(!is_generated_class("btn-primary"));
    }
}
