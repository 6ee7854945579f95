//! Lightweight rendering helpers for chat message display
//!
//! The assistant replies in a small markdown subset (bold, italic, line
//! breaks). These helpers turn that into HTML and format citation links for
//! display. Input is HTML-escaped before substitution.

use crate::types::Source;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

static BOLD_RE: OnceLock<Regex> = OnceLock::new();
static ITALIC_RE: OnceLock<Regex> = OnceLock::new();

fn bold_re() -> &'static Regex {
    BOLD_RE.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold pattern"))
}

fn italic_re() -> &'static Regex {
    ITALIC_RE.get_or_init(|| Regex::new(r"\*(.*?)\*").expect("valid italic pattern"))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render a message's markdown subset as HTML
///
/// `**bold**` becomes `<strong>`, `*italic*` becomes `<em>`, newlines become
/// `<br />`. Bold runs before italic so `**x**` is not eaten as two italics.
pub fn markdown_to_html(content: &str) -> String {
    let escaped = escape_html(content);
    let html = bold_re().replace_all(&escaped, "<strong>$1</strong>");
    let html = italic_re().replace_all(&html, "<em>$1</em>");
    html.replace('\n', "<br />")
}

/// Display text for a citation link
///
/// The source title, unless it is missing or just the bare URL, in which case
/// the URL's host reads better.
pub fn source_display_title(source: &Source) -> String {
    if !source.title.is_empty() && source.title != source.uri {
        return source.title.clone();
    }
    match Url::parse(&source.uri) {
        Ok(url) => url
            .host_str()
            .map(|h| h.to_string())
            .unwrap_or_else(|| source.uri.clone()),
        Err(_) => source.uri.clone(),
    }
}
