use crate::workbook::Sheet;

/// Findings sheet names, newest layout first.
pub const FINDINGS_SHEETS: [&str; 2] = ["Evaluation", "Findings Summary"];

pub const HEADER_ROW: u32 = 1;

pub mod columns {
    pub const REMEDIATION_PBI: &str = "Remediation PBI";
    pub const CONFORMANCE: &str = "Conformance";
    pub const GROUP: &str = "Group";
    pub const NOTES: &str = "Notes";
    pub const RECOMMENDATION: &str = "Conformance Recommendation";
    pub const REMEDIATION: &str = "Remediation Techniques";
    pub const DESCRIPTION: &str = "Description";
    pub const PRIORITY: &str = "Priority";
    /// First resource column; every column to its right is a resource too.
    pub const RESOURCES: &str = "Resources, Screen Captures, Links";
}

const NON_COMPLIANT: &str = "non-compliant";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceCell {
    pub text: String,
    pub hyperlink: Option<String>,
}

/// One evaluated row of the findings sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Finding {
    pub row: u32,
    pub conformance: Option<String>,
    pub notes: Option<String>,
    pub recommendation: Option<String>,
    pub remediation: Option<String>,
    pub description: Option<String>,
    pub group: Option<String>,
    pub priority: Option<String>,
    pub linked_work_item: Option<String>,
    pub resources: Vec<ResourceCell>,
}

impl Finding {
    pub fn is_non_compliant(&self) -> bool {
        self.conformance
            .as_deref()
            .map(|c| c.trim().eq_ignore_ascii_case(NON_COMPLIANT))
            .unwrap_or(false)
    }

    pub fn is_linked(&self) -> bool {
        self.linked_work_item.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct FindingsTable {
    pub sheet_name: String,
    /// Column holding work-item links, when the sheet has one.
    pub remediation_pbi_column: Option<u32>,
    pub rows: Vec<Finding>,
}

impl FindingsTable {
    pub fn read(sheet: &Sheet) -> Self {
        let headers = sheet.header_columns(HEADER_ROW);
        let column = |name: &str| headers.get(name).copied();
        let text = |row: u32, name: &str| column(name).and_then(|col| sheet.text(row, col));

        let resources_start = column(columns::RESOURCES);
        let mut rows = Vec::new();

        for row in (HEADER_ROW + 1)..=sheet.max_row() {
            let resources = match resources_start {
                Some(start) => read_resources(sheet, row, start),
                None => Vec::new(),
            };

            let finding = Finding {
                row,
                conformance: text(row, columns::CONFORMANCE),
                notes: text(row, columns::NOTES),
                recommendation: text(row, columns::RECOMMENDATION),
                remediation: text(row, columns::REMEDIATION),
                description: text(row, columns::DESCRIPTION),
                group: text(row, columns::GROUP),
                priority: text(row, columns::PRIORITY),
                linked_work_item: text(row, columns::REMEDIATION_PBI),
                resources,
            };

            if !is_blank(&finding) {
                rows.push(finding);
            }
        }

        Self {
            sheet_name: sheet.name().to_string(),
            remediation_pbi_column: column(columns::REMEDIATION_PBI),
            rows,
        }
    }
}

fn read_resources(sheet: &Sheet, row: u32, start: u32) -> Vec<ResourceCell> {
    (start..=sheet.max_column())
        .filter_map(|col| {
            let cell = sheet.cell(row, col);
            cell.text().map(|text| ResourceCell {
                text: text.to_string(),
                hyperlink: cell.hyperlink.clone(),
            })
        })
        .collect()
}

fn is_blank(finding: &Finding) -> bool {
    finding.conformance.is_none()
        && finding.notes.is_none()
        && finding.recommendation.is_none()
        && finding.remediation.is_none()
        && finding.description.is_none()
        && finding.group.is_none()
        && finding.linked_work_item.is_none()
        && finding.resources.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conformance_match_ignores_case_and_padding() {
        let mut finding = Finding {
            conformance: Some("  Non-Compliant ".to_string()),
            ..Finding::default()
        };
        assert!(finding.is_non_compliant());

        finding.conformance = Some("Compliant".to_string());
        assert!(!finding.is_non_compliant());

        finding.conformance = None;
        assert!(!finding.is_non_compliant());
    }
}
