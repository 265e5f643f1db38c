//! In-memory `.xlsx` fixtures.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use config::Environment;
use pbilink::config::Settings;
use pbilink::workbook::cell_ref::cell_ref;
use zip::write::FileOptions;
use zip::ZipWriter;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

pub const ORG_URL: &str = "https://tfs.example/Collection";

pub fn settings(org_url: &str) -> Settings {
    let vars: HashMap<String, String> =
        [("PBILINK_ORG_URL".to_string(), org_url.to_string())].into();
    Settings::load_from(&[], Environment::with_prefix("PBILINK").source(Some(vars)))
        .expect("settings")
}

enum Value {
    Text(String),
    Number(f64),
}

pub struct SheetFixture {
    name: String,
    cells: BTreeMap<(u32, u32), Value>,
    links: Vec<(String, String)>,
}

impl SheetFixture {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: BTreeMap::new(),
            links: Vec::new(),
        }
    }

    pub fn text(mut self, row: u32, col: u32, text: &str) -> Self {
        self.cells.insert((row, col), Value::Text(text.to_string()));
        self
    }

    pub fn number(mut self, row: u32, col: u32, value: f64) -> Self {
        self.cells.insert((row, col), Value::Number(value));
        self
    }

    pub fn link(mut self, row: u32, col: u32, text: &str, url: &str) -> Self {
        self.cells.insert((row, col), Value::Text(text.to_string()));
        self.links.push((cell_ref(row, col), url.to_string()));
        self
    }

    /// A hyperlink over `range` (e.g. `"A1:C3"`) without cell values.
    pub fn range_link(mut self, range: &str, url: &str) -> Self {
        self.links.push((range.to_string(), url.to_string()));
        self
    }

    /// Fill a row from column A; empty strings leave the cell out.
    pub fn row(mut self, row: u32, values: &[&str]) -> Self {
        for (i, value) in values.iter().enumerate() {
            if !value.is_empty() {
                self = self.text(row, i as u32 + 1, value);
            }
        }
        self
    }

    fn sheet_xml(&self) -> String {
        let mut xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<worksheet xmlns=\"{}\" xmlns:r=\"{}\"><sheetData>",
            MAIN_NS, REL_NS
        );

        let mut current_row = None;
        for (&(row, col), value) in &self.cells {
            if current_row != Some(row) {
                if current_row.is_some() {
                    xml.push_str("</row>");
                }
                xml.push_str(&format!("<row r=\"{}\">", row));
                current_row = Some(row);
            }
            let reference = cell_ref(row, col);
            match value {
                Value::Text(text) => xml.push_str(&format!(
                    "<c r=\"{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                    reference,
                    escape(text)
                )),
                Value::Number(n) => {
                    xml.push_str(&format!("<c r=\"{}\"><v>{}</v></c>", reference, n))
                }
            }
        }
        if current_row.is_some() {
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData>");

        if !self.links.is_empty() {
            xml.push_str("<hyperlinks>");
            for (i, (range, _)) in self.links.iter().enumerate() {
                xml.push_str(&format!(
                    "<hyperlink ref=\"{}\" r:id=\"rId{}\"/>",
                    range,
                    i + 1
                ));
            }
            xml.push_str("</hyperlinks>");
        }

        xml.push_str("</worksheet>");
        xml
    }

    fn rels_xml(&self) -> String {
        let mut xml = format!("<Relationships xmlns=\"{}\">", PKG_REL_NS);
        for (i, (_, url)) in self.links.iter().enumerate() {
            xml.push_str(&format!(
                "<Relationship Id=\"rId{}\" Type=\"{}/hyperlink\" Target=\"{}\" TargetMode=\"External\"/>",
                i + 1,
                REL_NS,
                escape(url)
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }
}

#[derive(Default)]
pub struct WorkbookFixture {
    sheets: Vec<SheetFixture>,
}

impl WorkbookFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(mut self, sheet: SheetFixture) -> Self {
        self.sheets.push(sheet);
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::<()>::default();

        let mut add = |name: &str, data: &str| {
            zip.start_file(name, options).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        };

        add("[Content_Types].xml", &self.content_types());
        add(
            "_rels/.rels",
            &format!(
                "<Relationships xmlns=\"{}\"><Relationship Id=\"rId1\" \
Type=\"{}/officeDocument\" Target=\"xl/workbook.xml\"/></Relationships>",
                PKG_REL_NS, REL_NS
            ),
        );
        add("xl/workbook.xml", &self.workbook_xml());
        add("xl/_rels/workbook.xml.rels", &self.workbook_rels());

        for (i, sheet) in self.sheets.iter().enumerate() {
            add(&format!("xl/worksheets/sheet{}.xml", i + 1), &sheet.sheet_xml());
            if !sheet.links.is_empty() {
                add(
                    &format!("xl/worksheets/_rels/sheet{}.xml.rels", i + 1),
                    &sheet.rels_xml(),
                );
            }
        }

        zip.finish().unwrap().into_inner()
    }

    pub fn write(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        std::fs::write(&path, self.to_bytes()).unwrap();
        path
    }

    fn content_types(&self) -> String {
        let mut xml = String::from(
            "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/xl/workbook.xml\" \
ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>",
        );
        for i in 1..=self.sheets.len() {
            xml.push_str(&format!(
                "<Override PartName=\"/xl/worksheets/sheet{}.xml\" \
ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>",
                i
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn workbook_xml(&self) -> String {
        let mut xml = format!(
            "<workbook xmlns=\"{}\" xmlns:r=\"{}\"><sheets>",
            MAIN_NS, REL_NS
        );
        for (i, sheet) in self.sheets.iter().enumerate() {
            xml.push_str(&format!(
                "<sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"/>",
                escape(&sheet.name),
                i + 1,
                i + 1
            ));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn workbook_rels(&self) -> String {
        let mut xml = format!("<Relationships xmlns=\"{}\">", PKG_REL_NS);
        for i in 1..=self.sheets.len() {
            xml.push_str(&format!(
                "<Relationship Id=\"rId{}\" Type=\"{}/worksheet\" Target=\"worksheets/sheet{}.xml\"/>",
                i, REL_NS, i
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Findings header row used by most tests. Columns:
/// A Remediation PBI, B Conformance, C Group, D Notes,
/// E Conformance Recommendation, F Remediation Techniques, G Description,
/// H Priority, I and J resources.
pub const FINDINGS_HEADERS: [&str; 9] = [
    "Remediation PBI",
    "Conformance",
    "Group",
    "Notes",
    "Conformance Recommendation",
    "Remediation Techniques",
    "Description",
    "Priority",
    "Resources, Screen Captures, Links",
];

pub fn report_details(feature_id: Option<f64>) -> SheetFixture {
    let sheet = SheetFixture::new("Report Details")
        .text(4, 1, "URL")
        .text(4, 2, "https://www.shop.example/cart")
        .text(5, 1, "Testing Account")
        .link(5, 2, "qa-shopper", "https://vault.example/qa-shopper")
        .text(6, 1, "Page Name")
        .text(6, 2, "Cart")
        .text(12, 1, "Feature ID");
    match feature_id {
        Some(id) => sheet.number(12, 2, id),
        None => sheet,
    }
}

pub fn data_layer() -> SheetFixture {
    SheetFixture::new("DataLayer")
        .row(
            1,
            &[
                "Notes",
                "Remediation Techniques",
                "Acceptance Criteria",
                "",
                "Resource",
                "URL",
                "AC Reference Link (full or minified URL)",
                "AC Reference Name (friendly text)",
            ],
        )
        .row(
            2,
            &[
                "Focus is lost",
                "Return focus to trigger",
                "1. Open the dialog 2. Close it * focus returns to the button",
                "",
                "Focus Order",
                "https://w3.example/focus-order",
                "https://w3.example/2.4.3",
                "SC 2.4.3",
            ],
        )
        .row(
            3,
            &["", "", "", "", "Name, Role, Value", "https://w3.example/4.1.2"],
        )
}
