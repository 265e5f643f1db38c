use colored::*;
use tracing::{info, warn};

use super::plan::{Plan, PlannedWorkItem};
use crate::ado::{WorkItemApi, WorkItemDraft};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedRow {
    pub row: u32,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub title: String,
    pub rows: Vec<u32>,
    pub error: String,
}

/// What happened to each planned item.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub created: usize,
    /// Rows that got a group's URL without a second create.
    pub reused_rows: usize,
    pub link_failures: usize,
    pub linked: Vec<LinkedRow>,
    pub failed: Vec<FailedItem>,
}

/// Create every planned item in order, then link it under the feature.
///
/// A create failure leaves the item's rows unlinked and moves on. A parent
/// link failure is reported but the item's URL is still recorded.
pub async fn execute<A: WorkItemApi>(api: &A, plan: &Plan, feature_id: &str) -> RunOutcome {
    let mut outcome = RunOutcome::default();

    for item in &plan.items {
        announce(item);

        let draft = WorkItemDraft {
            title: &item.title,
            description: &item.description,
            acceptance_criteria: &item.acceptance_criteria,
            priority: item.priority,
            tags: &item.tags,
        };

        let created = match api.create_work_item(&draft).await {
            Ok(created) => created,
            Err(e) => {
                println!(
                    "{} Failed to create PBI for row(s) {}: {}",
                    "❌".red(),
                    format_rows(&item.rows),
                    e
                );
                outcome.failed.push(FailedItem {
                    title: item.title.clone(),
                    rows: item.rows.clone(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        println!(
            "   ✅ Created PBI {} {}",
            created.id.to_string().bold(),
            created.html_url.as_deref().unwrap_or(&created.edit_url).dimmed()
        );
        info!(id = created.id, rows = ?item.rows, "work item created");
        outcome.created += 1;

        if let Err(e) = api.link_to_parent(created.id, feature_id).await {
            warn!(id = created.id, feature_id, error = %e, "could not link to parent feature");
            println!(
                "   {} Could not link PBI {} to feature {}: {}",
                "⚠️".yellow(),
                created.id,
                feature_id,
                e
            );
            outcome.link_failures += 1;
        }

        for (i, row) in item.rows.iter().enumerate() {
            if i > 0 {
                println!("   🔁 Using existing PBI for row {}", row);
                outcome.reused_rows += 1;
            }
            outcome.linked.push(LinkedRow {
                row: *row,
                url: created.edit_url.clone(),
            });
        }
    }

    outcome
}

fn announce(item: &PlannedWorkItem) {
    match &item.group {
        Some(group) => println!(
            "🚀 Creating grouped PBI for group {} at row {}...",
            group.cyan(),
            item.first_row()
        ),
        None => println!("🚀 Creating PBI for row {}...", item.first_row()),
    }
}

pub fn format_rows(rows: &[u32]) -> String {
    rows.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
