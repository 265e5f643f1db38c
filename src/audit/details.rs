use tracing::debug;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::workbook::Workbook;

pub const REPORT_DETAILS_SHEET: &str = "Report Details";

// (row, col) of the header cells, 1-based.
const PAGE_URL_CELL: (u32, u32) = (4, 2);
const TESTING_ACCOUNT_CELL: (u32, u32) = (5, 2);
const PAGE_NAME_CELL: (u32, u32) = (6, 2);
const FEATURE_ID_CELL: (u32, u32) = (12, 2);

/// Who to log in as when reproducing the finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestingAccount {
    pub text: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDetails {
    pub page_name: String,
    pub page_url: String,
    pub feature_id: String,
    pub testing_account: Option<TestingAccount>,
}

impl ReportDetails {
    pub fn read(workbook: &mut Workbook, settings: &Settings) -> Result<Self> {
        let sheet = workbook.sheet(REPORT_DETAILS_SHEET)?;

        let feature_id = sheet
            .text(FEATURE_ID_CELL.0, FEATURE_ID_CELL.1)
            .and_then(|raw| normalize_feature_id(&raw))
            .ok_or_else(|| {
                Error::missing_field(
                    "Feature ID is missing from the Report Details sheet. \
                     This must be filled in before creating PBIs",
                )
            })?;

        let page_name = sheet
            .text(PAGE_NAME_CELL.0, PAGE_NAME_CELL.1)
            .ok_or_else(|| Error::missing_field("page name (Report Details!B6)"))?;

        let page_url = sheet
            .text(PAGE_URL_CELL.0, PAGE_URL_CELL.1)
            .map(|url| settings.rewrite_page_url(&url))
            .ok_or_else(|| Error::missing_field("page URL (Report Details!B4)"))?;

        let account_cell = sheet.cell(TESTING_ACCOUNT_CELL.0, TESTING_ACCOUNT_CELL.1);
        let testing_account = match (account_cell.text(), account_cell.hyperlink.as_deref()) {
            (None, None) => None,
            (text, url) => Some(TestingAccount {
                text: text.map(str::to_string),
                url: url.map(str::to_string),
            }),
        };

        debug!(%page_name, %page_url, %feature_id, "report details");

        Ok(Self {
            page_name,
            page_url,
            feature_id,
            testing_account,
        })
    }
}

/// Accept either a bare id or a pasted work-item URL
/// (`.../_workitems/edit/123` or `...?id=123`).
pub fn normalize_feature_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let id = if raw.starts_with("https://") || raw.starts_with("http://") {
        if raw.contains('?') {
            raw.rsplit('=').next()
        } else {
            raw.trim_end_matches('/').rsplit('/').next()
        }
    } else {
        Some(raw)
    };

    id.map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_id_from_plain_number() {
        assert_eq!(normalize_feature_id(" 4521 "), Some("4521".to_string()));
    }

    #[test]
    fn feature_id_from_edit_url() {
        assert_eq!(
            normalize_feature_id("https://tfs.example/Coll/Design/_workitems/edit/4521/"),
            Some("4521".to_string())
        );
    }

    #[test]
    fn feature_id_from_query_url() {
        assert_eq!(
            normalize_feature_id("https://tfs.example/Coll/_workitems?id=4521"),
            Some("4521".to_string())
        );
    }

    #[test]
    fn blank_feature_id_is_none() {
        assert_eq!(normalize_feature_id("   "), None);
    }
}
