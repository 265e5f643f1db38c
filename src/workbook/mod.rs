//! Workbook access: cell values through calamine, hyperlinks and write-back
//! through the raw OOXML package.

pub mod cell_ref;
pub mod package;
pub mod patch;

use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use calamine::{Data, Range, Reader, Xlsx};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};
use package::{Hyperlink, Package, SheetEntry};
pub use patch::CellWrite;

/// One cell as the audit code sees it: its displayed text and, when the
/// cell carries an external hyperlink, the link target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub value: Option<String>,
    pub hyperlink: Option<String>,
}

impl Cell {
    /// Trimmed text, `None` when blank.
    pub fn text(&self) -> Option<&str> {
        self.value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

pub struct Sheet {
    name: String,
    range: Range<Data>,
    hyperlinks: Vec<Hyperlink>,
}

impl Sheet {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 1-based `(row, col)`, like the sheet XML.
    pub fn cell(&self, row: u32, col: u32) -> Cell {
        if row == 0 || col == 0 {
            return Cell::default();
        }
        Cell {
            value: self
                .range
                .get_value((row - 1, col - 1))
                .and_then(data_to_string),
            hyperlink: self
                .hyperlinks
                .iter()
                .find(|link| link.range.contains(row, col))
                .map(|link| link.target.clone()),
        }
    }

    /// Trimmed text of a cell, `None` when blank.
    pub fn text(&self, row: u32, col: u32) -> Option<String> {
        self.cell(row, col).text().map(str::to_string)
    }

    pub fn max_row(&self) -> u32 {
        self.range.end().map(|(row, _)| row + 1).unwrap_or(0)
    }

    pub fn max_column(&self) -> u32 {
        self.range.end().map(|(_, col)| col + 1).unwrap_or(0)
    }

    /// Header text -> column for the given header row. The first occurrence
    /// of a duplicated header wins.
    pub fn header_columns(&self, header_row: u32) -> HashMap<String, u32> {
        let mut headers = HashMap::new();
        for col in 1..=self.max_column() {
            if let Some(text) = self.text(header_row, col) {
                headers.entry(text).or_insert(col);
            }
        }
        headers
    }
}

fn data_to_string(data: &Data) -> Option<String> {
    let text = match data {
        Data::Empty => return None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::Error(e) => e.to_string(),
    };
    Some(text)
}

pub struct Workbook {
    path: PathBuf,
    package: Package,
    sheets: Vec<SheetEntry>,
    reader: Xlsx<Cursor<Vec<u8>>>,
}

impl Workbook {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        Self::from_bytes(path, bytes)
    }

    /// Load from bytes; `path` is where [`Workbook::write_cells`] will save.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Result<Self> {
        let package = Package::from_bytes(&bytes)?;
        let sheets = package.worksheets()?;
        let reader = Xlsx::new(Cursor::new(bytes))?;

        Ok(Self {
            path: path.into(),
            package,
            sheets,
            reader,
        })
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets.iter().any(|s| s.name == name)
    }

    pub fn sheet(&mut self, name: &str) -> Result<Sheet> {
        let entry = self
            .sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::MissingSheet(name.to_string()))?;

        let hyperlinks = self.package.hyperlinks(&entry.part)?;
        let range = self.reader.worksheet_range(name)?;
        debug!(sheet = name, links = hyperlinks.len(), "loaded sheet");

        Ok(Sheet {
            name: name.to_string(),
            range,
            hyperlinks,
        })
    }

    /// First sheet in `names` that exists in the workbook.
    pub fn first_sheet_of(&mut self, names: &[&str]) -> Result<Sheet> {
        match names.iter().find(|n| self.has_sheet(n)) {
            Some(name) => self.sheet(name),
            None => Err(Error::MissingSheet(names.join("\" or \""))),
        }
    }

    /// Write cells into `sheet` and save the workbook over its original path.
    /// The file is replaced atomically; every other part is copied as-is.
    pub fn write_cells(&self, sheet: &str, writes: &[CellWrite]) -> Result<()> {
        let entry = self
            .sheets
            .iter()
            .find(|s| s.name == sheet)
            .ok_or_else(|| Error::MissingSheet(sheet.to_string()))?;

        let patched = patch::patch_sheet_xml(self.package.part_str(&entry.part)?, writes)?;
        let mut replacements = HashMap::new();
        replacements.insert(entry.part.clone(), patched);

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        self.package.write_to(tmp.as_file_mut(), &replacements)?;
        tmp.as_file_mut().flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        debug!(path = %self.path.display(), cells = writes.len(), "workbook saved");
        Ok(())
    }
}
