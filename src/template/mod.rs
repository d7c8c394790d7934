//! Template domain: records, placeholder engine, Markdown rendering.

mod markdown;
mod placeholder;
mod types;

pub use markdown::render_markdown;
pub use placeholder::{extract_placeholders, replace_placeholders, slugify, validate_placeholders};
pub use types::{NewTemplate, Template, TemplateChanges};

/// Collapse an extracted placeholder list into the stored representation:
/// `None` when the content declares no placeholders.
pub fn placeholders_or_none(names: Vec<String>) -> Option<Vec<String>> {
    if names.is_empty() {
        None
    } else {
        Some(names)
    }
}
