//! JSON Patch documents for the work item tracking API.

use serde::Serialize;
use serde_json::{json, Value};

use super::WorkItemDraft;

pub const FIELD_TITLE: &str = "/fields/System.Title";
pub const FIELD_DESCRIPTION: &str = "/fields/System.Description";
pub const FIELD_ACCEPTANCE_CRITERIA: &str = "/fields/Microsoft.VSTS.Common.AcceptanceCriteria";
pub const FIELD_PRIORITY: &str = "/fields/Microsoft.VSTS.Common.Priority";
pub const FIELD_ITERATION_PATH: &str = "/fields/System.IterationPath";
pub const FIELD_AREA_PATH: &str = "/fields/System.AreaPath";
pub const FIELD_TAGS: &str = "/fields/System.Tags";

pub const PARENT_LINK_REL: &str = "System.LinkTypes.Hierarchy-Reverse";
const PARENT_LINK_COMMENT: &str = "Linking PBI to Parent Feature";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PatchOperation {
    pub op: &'static str,
    pub path: &'static str,
    pub value: Value,
}

impl PatchOperation {
    fn add(path: &'static str, value: impl Into<Value>) -> Self {
        Self {
            op: "add",
            path,
            value: value.into(),
        }
    }
}

pub fn create_document(
    draft: &WorkItemDraft<'_>,
    area_path: &str,
    iteration_path: &str,
) -> Vec<PatchOperation> {
    vec![
        PatchOperation::add(FIELD_TITLE, draft.title),
        PatchOperation::add(FIELD_DESCRIPTION, draft.description),
        PatchOperation::add(FIELD_ACCEPTANCE_CRITERIA, draft.acceptance_criteria),
        PatchOperation::add(FIELD_PRIORITY, draft.priority),
        PatchOperation::add(FIELD_ITERATION_PATH, iteration_path),
        PatchOperation::add(FIELD_AREA_PATH, area_path),
        PatchOperation::add(FIELD_TAGS, draft.tags),
    ]
}

pub fn parent_link_document(parent_url: &str) -> Vec<PatchOperation> {
    vec![PatchOperation::add(
        "/relations/-",
        json!({
            "rel": PARENT_LINK_REL,
            "url": parent_url,
            "attributes": { "comment": PARENT_LINK_COMMENT }
        }),
    )]
}
