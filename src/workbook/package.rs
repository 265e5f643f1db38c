//! Raw access to the OOXML (zip) package behind a workbook: part lookup,
//! relationship parsing, worksheet hyperlinks, and re-zipping with patched
//! parts.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};

use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::cell_ref::CellRange;
use crate::error::{Error, Result};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    /// Zip path of the worksheet XML, e.g. `xl/worksheets/sheet1.xml`.
    pub part: String,
}

/// An external hyperlink and the cells it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperlink {
    pub range: CellRange,
    pub target: String,
}

#[derive(Debug, Clone)]
struct Relationship {
    target: String,
    external: bool,
}

struct Part {
    name: String,
    data: Vec<u8>,
}

pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            parts.push(Part { name, data });
        }

        Ok(Self { parts })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    pub fn part_str(&self, name: &str) -> Result<&str> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::workbook(format!("missing part {}", name)))?;
        std::str::from_utf8(data)
            .map_err(|e| Error::workbook(format!("part {} is not UTF-8: {}", name, e)))
    }

    /// Sheets in workbook order with the zip path of each worksheet part.
    pub fn worksheets(&self) -> Result<Vec<SheetEntry>> {
        let rels = parse_relationships(self.part_str(WORKBOOK_RELS_PART)?)?;
        let xml = self.part_str(WORKBOOK_PART)?;

        let mut reader = XmlReader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut sheets = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"sheet" => {
                    let mut name = None;
                    let mut rel_id = None;
                    for attr in e.attributes() {
                        let attr = attr?;
                        match attr.key.local_name().as_ref() {
                            b"name" => name = Some(attr.unescape_value()?.into_owned()),
                            b"id" => rel_id = Some(attr.unescape_value()?.into_owned()),
                            _ => {}
                        }
                    }

                    if let (Some(name), Some(rel_id)) = (name, rel_id) {
                        if let Some(rel) = rels.get(&rel_id) {
                            sheets.push(SheetEntry {
                                name,
                                part: resolve_part_path("xl", &rel.target),
                            });
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// External hyperlinks on a worksheet in document order. Links that only
    /// point inside the workbook are not reported.
    pub fn hyperlinks(&self, sheet_part: &str) -> Result<Vec<Hyperlink>> {
        let mut links = Vec::new();

        let rels = match self.part(&rels_part_for(sheet_part)) {
            Some(_) => parse_relationships(self.part_str(&rels_part_for(sheet_part))?)?,
            None => return Ok(links),
        };

        let xml = self.part_str(sheet_part)?;
        let mut reader = XmlReader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"hyperlink" => {
                    let mut range = None;
                    let mut rel_id = None;
                    for attr in e.attributes() {
                        let attr = attr?;
                        match attr.key.local_name().as_ref() {
                            b"ref" => range = Some(attr.unescape_value()?.into_owned()),
                            b"id" => rel_id = Some(attr.unescape_value()?.into_owned()),
                            _ => {}
                        }
                    }

                    let target = rel_id
                        .and_then(|id| rels.get(&id))
                        .filter(|rel| rel.external)
                        .map(|rel| rel.target.clone());

                    let range = range.as_deref().and_then(CellRange::parse);
                    if let (Some(range), Some(target)) = (range, target) {
                        links.push(Hyperlink { range, target });
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(links)
    }

    /// Re-zip the package, swapping in `replacements` by part name. Part
    /// order is preserved.
    pub fn write_to<W: Write + Seek>(
        &self,
        out: W,
        replacements: &HashMap<String, Vec<u8>>,
    ) -> Result<W> {
        let mut writer = ZipWriter::new(out);
        let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);

        for part in &self.parts {
            let data = replacements.get(&part.name).unwrap_or(&part.data);
            writer.start_file(part.name.clone(), options)?;
            writer.write_all(data)?;
        }

        Ok(writer.finish()?)
    }
}

fn parse_relationships(xml: &str) -> Result<HashMap<String, Relationship>> {
    let mut relationships = HashMap::new();
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut target = None;
                let mut external = false;

                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.as_ref() {
                        b"Id" => id = Some(attr.unescape_value()?.into_owned()),
                        b"Target" => target = Some(attr.unescape_value()?.into_owned()),
                        b"TargetMode" => external = attr.unescape_value()? == "External",
                        _ => {}
                    }
                }

                if let (Some(id), Some(target)) = (id, target) {
                    relationships.insert(id, Relationship { target, external });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(relationships)
}

/// `xl/worksheets/sheet1.xml` -> `xl/worksheets/_rels/sheet1.xml.rels`
fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_part_path(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
