//! Azure DevOps work item tracking.

pub mod client;
pub mod patch;

pub use client::AdoClient;

use crate::error::Result;

/// Field values for a new backlog item.
#[derive(Debug, Clone, Copy)]
pub struct WorkItemDraft<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub acceptance_criteria: &'a str,
    pub priority: u8,
    pub tags: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedWorkItem {
    pub id: u64,
    /// `{org}/_workitems/edit/{id}`, the link written back to the sheet.
    pub edit_url: String,
    /// `_links.html.href` from the response, when the server sent one.
    pub html_url: Option<String>,
}

/// What the run loop needs from the tracker.
#[allow(async_fn_in_trait)]
pub trait WorkItemApi {
    async fn create_work_item(&self, draft: &WorkItemDraft<'_>) -> Result<CreatedWorkItem>;

    async fn link_to_parent(&self, id: u64, parent_id: &str) -> Result<()>;
}
