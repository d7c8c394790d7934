//! Placeholder extraction and substitution for template content.
//!
//! A placeholder is an uppercase-snake-case token wrapped in double braces,
//! e.g. `{{CUSTOMER_NAME}}`. Anything else between braces (lowercase, digits,
//! spaces) is not recognized and passes through as literal text.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    /// Recognized placeholder tokens. This pattern is the one wire-level
    /// contract external callers depend on: uppercase ASCII letters and
    /// underscores only.
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{([A-Z_]+)\}\}").unwrap();
    /// Any double-brace-delimited sequence, used for syntax validation.
    static ref BRACED: Regex = Regex::new(r"\{\{([^{}]*)\}\}").unwrap();
    static ref KEY: Regex = Regex::new(r"^[A-Z_]+$").unwrap();
    static ref NON_SLUG: Regex = Regex::new(r"[^\w\s-]").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
    static ref HYPHEN_RUN: Regex = Regex::new(r"-{2,}").unwrap();
}

/// Extract the distinct placeholder names from template content,
/// in first-occurrence order.
pub fn extract_placeholders(content: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(content) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Replace every recognized placeholder whose key exists in `values` with
/// the corresponding value. Tokens without a matching key are left in place.
///
/// Substituted values are not re-scanned, so a value containing `{{...}}`
/// cannot trigger further substitution.
pub fn replace_placeholders(content: &str, values: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(content, |caps: &Captures<'_>| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Check that every brace-delimited sequence in the content conforms to the
/// accepted key pattern. Defensive only; not enforced at save time.
pub fn validate_placeholders(content: &str) -> bool {
    BRACED
        .captures_iter(content)
        .all(|caps| KEY.is_match(&caps[1]))
}

/// Derive a URL-safe slug from a display name: lowercase, strip everything
/// outside word characters / whitespace / hyphens, collapse whitespace runs
/// and repeated hyphens to a single hyphen, trim hyphens from the edges.
///
/// Idempotent: `slugify(slugify(x)) == slugify(x)`.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = NON_SLUG.replace_all(&lowered, "");
    let hyphenated = WHITESPACE_RUN.replace_all(&stripped, "-");
    let collapsed = HYPHEN_RUN.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}
