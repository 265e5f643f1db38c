//! Custom acceptance criteria.
//!
//! Authors type criteria into a single spreadsheet cell using a loose
//! convention: `1. first step 2. second step`, optionally with `* sub-step`
//! bullets inside a numbered step. Anything that does not split into more
//! than one numbered piece is kept as one paragraph.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{escape, link};
use crate::audit::CustomCriteria;

pub const TESTING_REQUIREMENTS_HEADING: &str = "<h2>Testing Requirements</h2>";

static NUMBERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.\s*").unwrap());
static SUB_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\s*").unwrap());

/// Criteria text as HTML without the heading: a `<ul>` when the text is a
/// numbered list, a `<p>` otherwise.
pub fn criteria_body(raw: &str) -> String {
    let items: Vec<&str> = NUMBERED_ITEM
        .split(raw)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect();

    if items.len() <= 1 {
        return format!("<p>{}</p>", escape(raw));
    }

    let mut list = String::from("<ul>");
    for item in items {
        let mut pieces = SUB_BULLET.split(item);
        let main_line = pieces.next().unwrap_or_default().trim();
        let subs: Vec<&str> = pieces.map(str::trim).filter(|s| !s.is_empty()).collect();

        if subs.is_empty() {
            list.push_str(&format!("<li>{}</li>", escape(item)));
        } else {
            list.push_str(&format!("<li>{}<ul>", escape(main_line)));
            for sub in subs {
                list.push_str(&format!("<li>{}</li>", escape(sub)));
            }
            list.push_str("</ul></li>");
        }
    }
    list.push_str("</ul>");
    list
}

/// `Reference: <link>` paragraph, when the criteria carry a reference link.
pub fn reference_html(criteria: &CustomCriteria) -> String {
    match criteria.reference_link.as_deref() {
        Some(url) => {
            let text = criteria.reference_name.as_deref().unwrap_or(url);
            format!("<p><strong>Reference:</strong> {}</p>", link(url, text))
        }
        None => String::new(),
    }
}

/// Full acceptance-criteria field for a single finding with custom criteria.
pub fn custom_acceptance_criteria(criteria: &CustomCriteria) -> String {
    format!(
        "{}{}{}",
        TESTING_REQUIREMENTS_HEADING,
        criteria_body(&criteria.text),
        reference_html(criteria)
    )
}
