//! Turn findings rows into the list of work items a run would create.
//!
//! Planning is pure: no HTTP and no file writes, so `--dry-run` and the run
//! loop share it.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::audit::{CustomCriteriaLookup, Finding, FindingsTable, ReportDetails, ResourceLookup};
use crate::config::Surface;
use crate::html::acceptance::custom_acceptance_criteria;
use crate::html::templates::{
    default_acceptance_criteria, grouped_acceptance_criteria, grouped_description,
    single_description, FindingSummary, PageContext,
};

const TITLE_NOTES_CHARS: usize = 50;

/// High/Medium/Low to the tracker's 1..3 scale; anything else is Low.
pub fn map_priority(raw: Option<&str>) -> u8 {
    match raw.map(|p| p.trim().to_ascii_lowercase()).as_deref() {
        Some("high") => 1,
        Some("medium") => 2,
        _ => 3,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyLinked(String),
    NotNonCompliant(Option<String>),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyLinked(existing) => write!(f, "already linked to {}", existing),
            SkipReason::NotNonCompliant(Some(status)) => write!(f, "conformance is '{}'", status),
            SkipReason::NotNonCompliant(None) => write!(f, "no conformance status"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub row: u32,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct PlannedWorkItem {
    pub title: String,
    pub description: String,
    pub acceptance_criteria: String,
    pub priority: u8,
    pub tags: String,
    /// Sheet rows that receive this item's URL, in row order.
    pub rows: Vec<u32>,
    pub group: Option<String>,
}

impl PlannedWorkItem {
    pub fn first_row(&self) -> u32 {
        self.rows.first().copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub items: Vec<PlannedWorkItem>,
    pub skipped: Vec<SkippedRow>,
}

/// Lookups and page values shared by every item in one plan.
pub struct PlanContext<'a> {
    pub details: &'a ReportDetails,
    pub resources: &'a ResourceLookup,
    pub criteria: &'a CustomCriteriaLookup,
    pub surface: Surface,
}

enum Slot<'a> {
    Single(&'a Finding),
    Group(String),
}

pub fn build_plan(table: &FindingsTable, ctx: &PlanContext<'_>) -> Plan {
    let mut plan = Plan::default();
    let mut slots: Vec<Slot<'_>> = Vec::new();
    let mut groups: HashMap<String, Vec<&Finding>> = HashMap::new();

    for finding in &table.rows {
        if let Some(existing) = &finding.linked_work_item {
            debug!(row = finding.row, %existing, "row already linked");
            plan.skipped.push(SkippedRow {
                row: finding.row,
                reason: SkipReason::AlreadyLinked(existing.clone()),
            });
            continue;
        }
        if !finding.is_non_compliant() {
            plan.skipped.push(SkippedRow {
                row: finding.row,
                reason: SkipReason::NotNonCompliant(finding.conformance.clone()),
            });
            continue;
        }

        match finding.group.as_deref() {
            Some(group) => {
                let members = groups.entry(group.to_string()).or_default();
                if members.is_empty() {
                    slots.push(Slot::Group(group.to_string()));
                }
                members.push(finding);
            }
            None => slots.push(Slot::Single(finding)),
        }
    }

    let page = PageContext::new(ctx.details);
    let tags = format!(
        "Remediation,Accessibility,{} {}",
        ctx.details.page_name,
        ctx.surface.tag_suffix()
    );

    for slot in slots {
        let item = match slot {
            Slot::Single(finding) => plan_single(finding, &page, &tags, ctx),
            Slot::Group(name) => {
                let members = groups.remove(&name).unwrap_or_default();
                plan_group(name, &members, &page, &tags, ctx)
            }
        };
        plan.items.push(item);
    }

    plan
}

fn plan_single(
    finding: &Finding,
    page: &PageContext,
    tags: &str,
    ctx: &PlanContext<'_>,
) -> PlannedWorkItem {
    let summary = FindingSummary::new(finding, ctx.resources, ctx.criteria);
    let acceptance_criteria = match &summary.criteria {
        Some(criteria) => custom_acceptance_criteria(criteria),
        None => default_acceptance_criteria(page),
    };

    let notes: String = finding
        .notes
        .as_deref()
        .unwrap_or_default()
        .chars()
        .take(TITLE_NOTES_CHARS)
        .collect();

    PlannedWorkItem {
        title: format!("Remediation - {} - {}", ctx.details.page_name, notes),
        description: single_description(page, &summary),
        acceptance_criteria,
        priority: map_priority(finding.priority.as_deref()),
        tags: tags.to_string(),
        rows: vec![finding.row],
        group: None,
    }
}

/// Priority comes from the first member row.
fn plan_group(
    name: String,
    members: &[&Finding],
    page: &PageContext,
    tags: &str,
    ctx: &PlanContext<'_>,
) -> PlannedWorkItem {
    let summaries: Vec<FindingSummary> = members
        .iter()
        .map(|f| FindingSummary::new(f, ctx.resources, ctx.criteria))
        .collect();

    PlannedWorkItem {
        title: format!("Remediation - {} - {}", ctx.details.page_name, name),
        description: grouped_description(page, &summaries),
        acceptance_criteria: grouped_acceptance_criteria(&summaries),
        priority: map_priority(members.first().and_then(|f| f.priority.as_deref())),
        tags: tags.to_string(),
        rows: members.iter().map(|f| f.row).collect(),
        group: Some(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_mapping_defaults_to_low() {
        assert_eq!(map_priority(Some("High")), 1);
        assert_eq!(map_priority(Some(" medium ")), 2);
        assert_eq!(map_priority(Some("LOW")), 3);
        assert_eq!(map_priority(Some("Urgent")), 3);
        assert_eq!(map_priority(None), 3);
    }

    #[test]
    fn skip_reasons_read_naturally() {
        assert_eq!(
            SkipReason::NotNonCompliant(Some("Compliant".to_string())).to_string(),
            "conformance is 'Compliant'"
        );
        assert_eq!(
            SkipReason::AlreadyLinked("https://x/1".to_string()).to_string(),
            "already linked to https://x/1"
        );
    }
}
