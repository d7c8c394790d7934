//! Markdown rendering with HTML sanitization.

use pulldown_cmark::{html, Options, Parser};

/// Render Markdown to sanitized HTML.
///
/// The output has script tags, inline event handlers, and dangerous URL
/// schemes stripped, so it is safe to inject into a trusted document
/// context. Rendering never fails; unrecognized syntax passes through as
/// literal text.
pub fn render_markdown(content: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(content, options);
    let mut raw = String::new();
    html::push_html(&mut raw, parser);

    ammonia::clean(&raw)
}
