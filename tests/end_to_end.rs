mod common;

use std::sync::Mutex;

use common::{data_layer, report_details, SheetFixture, WorkbookFixture, FINDINGS_HEADERS, ORG_URL};
use pbilink::ado::{CreatedWorkItem, WorkItemApi, WorkItemDraft};
use pbilink::pipeline::{self, prepare};
use pbilink::workbook::Workbook;
use pbilink::{Error, Result};
use pretty_assertions::assert_eq;

/// Records calls and hands out ids from 100; titles containing `fail_on`
/// are rejected.
struct FakeApi {
    fail_on: Option<&'static str>,
    fail_links: bool,
    created: Mutex<Vec<String>>,
    links: Mutex<Vec<(u64, String)>>,
}

impl FakeApi {
    fn new() -> Self {
        Self {
            fail_on: None,
            fail_links: false,
            created: Mutex::new(Vec::new()),
            links: Mutex::new(Vec::new()),
        }
    }
}

impl WorkItemApi for FakeApi {
    async fn create_work_item(&self, draft: &WorkItemDraft<'_>) -> Result<CreatedWorkItem> {
        if self.fail_on.is_some_and(|f| draft.title.contains(f)) {
            return Err(Error::Api {
                status: 400,
                body: "rejected".to_string(),
            });
        }
        let mut created = self.created.lock().unwrap();
        created.push(draft.title.to_string());
        let id = 99 + created.len() as u64;
        Ok(CreatedWorkItem {
            id,
            edit_url: format!("{}/_workitems/edit/{}", ORG_URL, id),
            html_url: None,
        })
    }

    async fn link_to_parent(&self, id: u64, parent_id: &str) -> Result<()> {
        if self.fail_links {
            return Err(Error::Api {
                status: 500,
                body: "link failed".to_string(),
            });
        }
        self.links.lock().unwrap().push((id, parent_id.to_string()));
        Ok(())
    }
}

fn audit_fixture() -> WorkbookFixture {
    WorkbookFixture::new()
        .sheet(report_details(Some(555.0)))
        .sheet(
            SheetFixture::new("Evaluation")
                .row(1, &FINDINGS_HEADERS)
                .row(2, &["", "Non-compliant", "", "Image has no alt", "Add alt", "Use alt attribute"])
                .row(3, &["", "Compliant", "", "Heading order ok"])
                .row(4, &["", "Non-compliant", "Forms", "Input unlabeled", "Label it", "Use label"])
                .row(5, &["https://tfs.example/Collection/_workitems/edit/9", "Non-compliant", "", "Done before"])
                .row(6, &["", "Non-compliant", "Forms", "Error not announced", "Announce", "aria-live"]),
        )
        .sheet(data_layer())
}

fn read_column_a(path: &std::path::Path) -> Vec<Option<String>> {
    let mut workbook = Workbook::open(path).unwrap();
    let sheet = workbook.sheet("Evaluation").unwrap();
    (2..=6).map(|row| sheet.text(row, 1)).collect()
}

#[tokio::test]
async fn run_creates_links_and_writes_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = audit_fixture().write(dir.path(), "audit.xlsx");
    let settings = common::settings(ORG_URL);

    let prepared = prepare(&path, &settings).unwrap();
    let api = FakeApi::new();
    let outcome = pipeline::run(&api, &prepared, &settings).await.unwrap();

    assert_eq!(outcome.created, 2);
    assert_eq!(outcome.reused_rows, 1);
    assert!(outcome.failed.is_empty());
    assert_eq!(
        *api.created.lock().unwrap(),
        vec![
            "Remediation - Cart - Image has no alt".to_string(),
            "Remediation - Cart - Forms".to_string(),
        ]
    );
    assert_eq!(
        *api.links.lock().unwrap(),
        vec![(100, "555".to_string()), (101, "555".to_string())]
    );

    let first = format!("{}/_workitems/edit/100", ORG_URL);
    let group = format!("{}/_workitems/edit/101", ORG_URL);
    assert_eq!(
        read_column_a(&path),
        vec![
            Some(first),
            None,
            Some(group.clone()),
            Some("https://tfs.example/Collection/_workitems/edit/9".to_string()),
            Some(group),
        ]
    );

    // A second run over the saved file finds nothing left to do.
    let again = prepare(&path, &settings).unwrap();
    assert!(again.plan.items.is_empty());
}

#[tokio::test]
async fn failed_group_is_not_retried_and_stays_unlinked() {
    let dir = tempfile::tempdir().unwrap();
    let path = audit_fixture().write(dir.path(), "audit.xlsx");
    let settings = common::settings(ORG_URL);

    let prepared = prepare(&path, &settings).unwrap();
    let api = FakeApi {
        fail_on: Some("Forms"),
        ..FakeApi::new()
    };
    let outcome = pipeline::run(&api, &prepared, &settings).await.unwrap();

    assert_eq!(outcome.created, 1);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].rows, vec![4, 6]);
    assert_eq!(api.created.lock().unwrap().len(), 1);

    let column = read_column_a(&path);
    assert_eq!(column[0], Some(format!("{}/_workitems/edit/100", ORG_URL)));
    assert_eq!(column[2], None);
    assert_eq!(column[4], None);
}

#[tokio::test]
async fn link_failure_still_writes_url() {
    let dir = tempfile::tempdir().unwrap();
    let path = audit_fixture().write(dir.path(), "audit.xlsx");
    let settings = common::settings(ORG_URL);

    let prepared = prepare(&path, &settings).unwrap();
    let api = FakeApi {
        fail_links: true,
        ..FakeApi::new()
    };
    let outcome = pipeline::run(&api, &prepared, &settings).await.unwrap();

    assert_eq!(outcome.created, 2);
    assert_eq!(outcome.link_failures, 2);
    assert_eq!(outcome.linked.len(), 3);
    assert!(read_column_a(&path)[0].is_some());
}

#[test]
fn missing_link_column_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = WorkbookFixture::new()
        .sheet(report_details(Some(1.0)))
        .sheet(
            SheetFixture::new("Evaluation")
                .row(1, &["Conformance", "Notes"])
                .row(2, &["Non-compliant", "No link column here"]),
        )
        .write(dir.path(), "audit.xlsx");
    let settings = common::settings(ORG_URL);

    let prepared = prepare(&path, &settings).unwrap();
    assert_eq!(prepared.plan.items.len(), 1);

    let linked = vec![pbilink::pipeline::run::LinkedRow {
        row: 2,
        url: format!("{}/_workitems/edit/1", ORG_URL),
    }];
    let err = pipeline::write_back(&prepared.workbook, &prepared.table, &linked, true).unwrap_err();
    assert!(matches!(err, Error::MissingField(_)));
}
