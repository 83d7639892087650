//! Document assembly: wrap a help fragment in a complete HTML page.
//!
//! Help topics are stored as body fragments. To render one on its own it
//! needs a doctype, a `<head>` that pulls in the same stylesheets the help
//! window uses, and a `<base>` element pointing at the resource root so the
//! stylesheet and image hrefs resolve no matter where the page itself lives.

use once_cell::sync::Lazy;
use regex::Regex;

/// Everything around the fragment.
#[derive(Debug, Clone)]
pub struct DocumentShell<'a> {
    pub title: &'a str,
    /// Absolute `file://` URI with trailing slash.
    pub base_uri: &'a str,
    pub stylesheets: &'a [String],
}

static DOCTYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<!doctype\b").expect("valid regex"));
static HTML_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?html[\s>/]").expect("valid regex"));

/// Returns what makes `fragment` a full document rather than a fragment,
/// if anything.
pub fn find_document_markup(fragment: &str) -> Option<&'static str> {
    if DOCTYPE_RE.is_match(fragment) {
        Some("doctype declaration")
    } else if HTML_TAG_RE.is_match(fragment) {
        Some("<html> element")
    } else {
        None
    }
}

/// Build the full document. The fragment is inserted verbatim as the body.
pub fn wrap_fragment(fragment: &str, shell: &DocumentShell<'_>) -> String {
    let mut html = String::with_capacity(fragment.len() + 512);

    html.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    html.push_str("<title>");
    html.push_str(&escape_html(shell.title));
    html.push_str("</title>");
    // <base> must come before the links it applies to.
    html.push_str("<base href=\"");
    html.push_str(&escape_html(shell.base_uri));
    html.push_str("\">");
    for href in shell.stylesheets {
        html.push_str("<link rel=\"stylesheet\" href=\"");
        html.push_str(&escape_html(href));
        html.push_str("\">");
    }
    html.push_str("</head><body>");
    html.push_str(fragment);
    html.push_str("</body></html>");

    html
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
