//! Lookups built from the "DataLayer" sheet.

use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;
use crate::workbook::{Sheet, Workbook};

pub const DATA_LAYER_SHEET: &str = "DataLayer";

// Friendly resource name in column E, its URL in column F.
const RESOURCE_NAME_COL: u32 = 5;
const RESOURCE_URL_COL: u32 = 6;

const NOTES_HEADER: &str = "Notes";
const REMEDIATION_HEADER: &str = "Remediation Techniques";
const CRITERIA_HEADER: &str = "Acceptance Criteria";
const REFERENCE_LINK_HEADER: &str = "AC Reference Link (full or minified URL)";
const REFERENCE_NAME_HEADER: &str = "AC Reference Name (friendly text)";

/// Friendly resource text -> URL.
#[derive(Debug, Clone, Default)]
pub struct ResourceLookup {
    urls: HashMap<String, String>,
}

impl ResourceLookup {
    pub fn from_sheet(sheet: &Sheet) -> Self {
        let mut urls = HashMap::new();
        for row in 2..=sheet.max_row() {
            let name = sheet.text(row, RESOURCE_NAME_COL);
            let url = sheet.text(row, RESOURCE_URL_COL);
            if let (Some(name), Some(url)) = (name, url) {
                urls.insert(name, url);
            }
        }
        Self { urls }
    }

    pub fn resolve(&self, text: &str) -> Option<&str> {
        self.urls.get(text.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

#[cfg(test)]
impl FromIterator<(String, String)> for ResourceLookup {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            urls: iter.into_iter().collect(),
        }
    }
}

/// Hand-written acceptance criteria for a specific (notes, remediation) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomCriteria {
    pub text: String,
    pub reference_link: Option<String>,
    pub reference_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CustomCriteriaLookup {
    entries: HashMap<(String, String), CustomCriteria>,
}

impl CustomCriteriaLookup {
    pub fn from_sheet(sheet: &Sheet) -> Self {
        let headers = sheet.header_columns(1);
        let column = |name: &str| headers.get(name).copied();

        let Some(criteria_col) = column(CRITERIA_HEADER) else {
            debug!("no '{}' column in {}", CRITERIA_HEADER, sheet.name());
            return Self::default();
        };
        let notes_col = column(NOTES_HEADER);
        let remediation_col = column(REMEDIATION_HEADER);
        let link_col = column(REFERENCE_LINK_HEADER);
        let name_col = column(REFERENCE_NAME_HEADER);

        let text_at = |row: u32, col: Option<u32>| col.and_then(|c| sheet.text(row, c));

        let mut entries = HashMap::new();
        for row in 2..=sheet.max_row() {
            let Some(text) = sheet.text(row, criteria_col) else {
                continue;
            };
            let key = (
                text_at(row, notes_col).unwrap_or_default(),
                text_at(row, remediation_col).unwrap_or_default(),
            );
            entries.insert(
                key,
                CustomCriteria {
                    text,
                    reference_link: text_at(row, link_col),
                    reference_name: text_at(row, name_col),
                },
            );
        }

        Self { entries }
    }

    pub fn get(&self, notes: Option<&str>, remediation: Option<&str>) -> Option<&CustomCriteria> {
        let key = (
            notes.unwrap_or_default().trim().to_string(),
            remediation.unwrap_or_default().trim().to_string(),
        );
        self.entries.get(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Both DataLayer lookups; empty when the workbook has no DataLayer sheet.
pub fn load_lookups(workbook: &mut Workbook) -> Result<(ResourceLookup, CustomCriteriaLookup)> {
    if !workbook.has_sheet(DATA_LAYER_SHEET) {
        debug!("workbook has no {} sheet", DATA_LAYER_SHEET);
        return Ok((ResourceLookup::default(), CustomCriteriaLookup::default()));
    }

    let sheet = workbook.sheet(DATA_LAYER_SHEET)?;
    let resources = ResourceLookup::from_sheet(&sheet);
    let criteria = CustomCriteriaLookup::from_sheet(&sheet);
    debug!(
        resources = resources.len(),
        criteria = criteria.len(),
        "DataLayer lookups built"
    );
    Ok((resources, criteria))
}
