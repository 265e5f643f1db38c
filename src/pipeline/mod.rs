//! Read, plan, create, write back.

pub mod plan;
pub mod run;

use std::path::Path;

use tracing::debug;

use crate::ado::WorkItemApi;
use crate::audit::findings::{columns, FINDINGS_SHEETS};
use crate::audit::lookup::load_lookups;
use crate::audit::{FindingsTable, ReportDetails};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::workbook::{CellWrite, Workbook};
use plan::{build_plan, Plan, PlanContext};
use run::{execute, LinkedRow, RunOutcome};

/// Everything read from a workbook, plus the plan built from it.
pub struct Prepared {
    pub workbook: Workbook,
    pub details: ReportDetails,
    pub table: FindingsTable,
    pub plan: Plan,
}

pub fn prepare(path: &Path, settings: &Settings) -> Result<Prepared> {
    prepare_workbook(Workbook::open(path)?, settings)
}

/// Fails before anything is created when the report details are incomplete.
pub fn prepare_workbook(mut workbook: Workbook, settings: &Settings) -> Result<Prepared> {
    let details = ReportDetails::read(&mut workbook, settings)?;
    let (resources, criteria) = load_lookups(&mut workbook)?;
    let sheet = workbook.first_sheet_of(&FINDINGS_SHEETS)?;
    let table = FindingsTable::read(&sheet);
    debug!(sheet = %table.sheet_name, rows = table.rows.len(), "findings read");

    let plan = build_plan(
        &table,
        &PlanContext {
            details: &details,
            resources: &resources,
            criteria: &criteria,
            surface: settings.surface,
        },
    );

    Ok(Prepared {
        workbook,
        details,
        table,
        plan,
    })
}

/// Create the planned items and save their URLs into the workbook.
pub async fn run<A: WorkItemApi>(
    api: &A,
    prepared: &Prepared,
    settings: &Settings,
) -> Result<RunOutcome> {
    let outcome = execute(api, &prepared.plan, &prepared.details.feature_id).await;
    write_back(
        &prepared.workbook,
        &prepared.table,
        &outcome.linked,
        settings.write_hyperlinks,
    )?;
    Ok(outcome)
}

/// Write each URL into the "Remediation PBI" column. Returns the number of
/// cells written; nothing is saved when there is nothing to write.
pub fn write_back(
    workbook: &Workbook,
    table: &FindingsTable,
    linked: &[LinkedRow],
    hyperlinks: bool,
) -> Result<usize> {
    if linked.is_empty() {
        return Ok(0);
    }

    let col = table.remediation_pbi_column.ok_or_else(|| {
        Error::missing_field(format!(
            "'{}' column in the {} sheet",
            columns::REMEDIATION_PBI,
            table.sheet_name
        ))
    })?;

    let writes: Vec<CellWrite> = linked
        .iter()
        .map(|l| CellWrite {
            row: l.row,
            col,
            text: l.url.clone(),
            hyperlink: hyperlinks,
        })
        .collect();

    workbook.write_cells(&table.sheet_name, &writes)?;
    Ok(writes.len())
}
