use tracing::debug;

use super::{escape, link};
use crate::audit::{ResourceCell, ResourceLookup};

/// A resource cell rendered as a link when a URL is known: the cell's own
/// hyperlink first, then the DataLayer lookup, otherwise plain text.
pub fn render_resource(cell: &ResourceCell, lookup: &ResourceLookup) -> String {
    if let Some(url) = cell.hyperlink.as_deref() {
        debug!(text = %cell.text, %url, "resource uses cell hyperlink");
        return link(url, &cell.text);
    }
    if let Some(url) = lookup.resolve(&cell.text) {
        debug!(text = %cell.text, %url, "resource resolved from DataLayer");
        return link(url, &cell.text);
    }
    debug!(text = %cell.text, "no link for resource, using plain text");
    escape(&cell.text)
}

pub fn render_resources(cells: &[ResourceCell], lookup: &ResourceLookup) -> Vec<String> {
    cells.iter().map(|c| render_resource(c, lookup)).collect()
}

/// Wrap rendered fragments as `<li>` items.
pub fn list_items(fragments: &[String]) -> String {
    fragments
        .iter()
        .map(|f| format!("<li>{}</li>", f))
        .collect()
}
