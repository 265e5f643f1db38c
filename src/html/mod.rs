//! HTML fragments for work-item descriptions and acceptance criteria.
//!
//! Every string that came from the workbook goes through [`escape`] before it
//! is interpolated; the static template text does not.

pub mod acceptance;
pub mod resources;
pub mod templates;

/// Escape the five HTML-significant characters.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// `escape` for optional cells; blank becomes an empty string.
pub fn escape_opt(s: Option<&str>) -> String {
    s.map(escape).unwrap_or_default()
}

pub fn link(url: &str, text: &str) -> String {
    format!("<a href=\"{}\">{}</a>", escape(url), escape(text))
}
