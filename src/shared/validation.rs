use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating slug fields
    /// Must be lowercase alphanumeric with single hyphens between segments
    /// - Valid: "mens-shirts", "t-shirt", "summer2025"
    /// - Invalid: "-shirts", "shirts-", "mens--shirts", "Shirts", "mens_shirts"
    pub static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();

    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9-]").unwrap();
    static ref HYPHEN_RUN: Regex = Regex::new(r"-{2,}").unwrap();
}

/// Derive a slug from a display name.
///
/// Whitespace becomes a hyphen and anything outside `[a-z0-9-]` is dropped,
/// so names written entirely in non-Latin scripts yield an empty string.
pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let hyphenated = WHITESPACE_RUN.replace_all(&lowered, "-");
    let stripped = NON_SLUG_CHARS.replace_all(&hyphenated, "");
    let collapsed = HYPHEN_RUN.replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}
