//! Content Rendering
//!
//! Turns stored document bodies into display HTML according to their content
//! kind:
//!
//! - Markdown is rendered with pulldown-cmark
//! - HTML passes through untouched (trusted authors only; sections gate who
//!   can create pages)
//! - Plain and unknown content is HTML-escaped and newline-broken, so comment
//!   text can never inject markup
//!
//! `strip_markdown` produces plain text excerpts for listings.

use crate::models::ContentKind;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use std::sync::LazyLock;

/// Compiled regex patterns for markdown stripping
///
/// The order of these patterns matters:
/// 1. Images first (to not conflict with links or italic)
/// 2. Links (before italic since links use brackets)
/// 3. Bold (before italic since ** conflicts with *)
/// 4. Other inline styles
/// 5. Line-start patterns (headers, lists, etc.)
static MARKDOWN_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        // Remove images FIRST: ![alt](url) -> alt
        (Regex::new(r"!\[([^\]]*)\]\([^)]+\)").unwrap(), "$1"),
        // Remove markdown links, keeping link text: [text](url) -> text
        (Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap(), "$1"),
        // Remove inline code: `code` -> code
        (Regex::new(r"`([^`]+)`").unwrap(), "$1"),
        // Remove bold: **text** or __text__ -> text (process before italic)
        (Regex::new(r"\*\*([^*]+)\*\*").unwrap(), "$1"),
        (Regex::new(r"__([^_]+)__").unwrap(), "$1"),
        // Remove strikethrough: ~~text~~ -> text
        (Regex::new(r"~~([^~]+)~~").unwrap(), "$1"),
        // Remove italic: *text* or _text_ -> text
        (Regex::new(r"\*([^*]+)\*").unwrap(), "$1"),
        (Regex::new(r"_([^_]+)_").unwrap(), "$1"),
        // Remove headers: # Header -> Header (up to 6 levels)
        (Regex::new(r"^#{1,6}\s+").unwrap(), ""),
        // Remove blockquote markers: > quote -> quote
        (Regex::new(r"^>\s*").unwrap(), ""),
        // Remove ordered list markers: 1. item -> item
        (Regex::new(r"^\d+\.\s+").unwrap(), ""),
        // Remove unordered list markers: - item or * item -> item
        (Regex::new(r"^[-*+]\s+").unwrap(), ""),
        // Remove horizontal rules
        (Regex::new(r"^[-*_]{3,}$").unwrap(), ""),
        // Remove HTML tags
        (Regex::new(r"<[^>]+>").unwrap(), ""),
    ]
});

/// Compiled regex for whitespace normalization
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Render a document body to display HTML
///
/// # Examples
///
/// ```
/// use sectionwiki_core::models::ContentKind;
/// use sectionwiki_core::utils::render_content;
///
/// let html = render_content(ContentKind::Markdown, "# Hi");
/// assert!(html.contains("<h1>"));
///
/// let escaped = render_content(ContentKind::Plain, "<script>alert(1)</script>");
/// assert!(!escaped.contains("<script>"));
/// ```
pub fn render_content(kind: ContentKind, content: &str) -> String {
    match kind {
        ContentKind::Markdown => {
            let mut options = Options::empty();
            options.insert(Options::ENABLE_TABLES);
            options.insert(Options::ENABLE_STRIKETHROUGH);
            let parser = Parser::new_ext(content, options);
            let mut out = String::new();
            html::push_html(&mut out, parser);
            out
        }
        ContentKind::Html => content.to_string(),
        // Plain text (comments) and anything unrecognized is escaped
        ContentKind::Plain | ContentKind::Unknown => {
            let escaped = escape_html(content);
            escaped.replace('\n', "<br>")
        }
    }
}

/// Escape the five HTML metacharacters
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Strip markdown formatting from content to produce plain text
///
/// Used for listing excerpts and search snippets.
///
/// # Examples
///
/// ```
/// use sectionwiki_core::utils::strip_markdown;
///
/// assert_eq!(strip_markdown("# Hello World"), "Hello World");
/// assert_eq!(strip_markdown("**bold** text"), "bold text");
/// assert_eq!(strip_markdown("[link](http://example.com)"), "link");
/// ```
pub fn strip_markdown(content: &str) -> String {
    let mut result = content.to_string();

    for (pattern, replacement) in MARKDOWN_PATTERNS.iter() {
        // Line-start patterns are applied per line
        if replacement.is_empty() && pattern.as_str().starts_with('^') {
            result = result
                .lines()
                .map(|line| pattern.replace_all(line, *replacement).to_string())
                .collect::<Vec<_>>()
                .join("\n");
        } else {
            result = pattern.replace_all(&result, *replacement).to_string();
        }
    }

    result = WHITESPACE_RE.replace_all(&result, " ").to_string();
    result.trim().to_string()
}
