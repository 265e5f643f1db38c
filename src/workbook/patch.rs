//! Targeted edits to worksheet XML.
//!
//! Cells are spliced into `<sheetData>` by streaming the original events
//! through a writer, so everything we do not touch (styles, formulas,
//! conditional formats, extension lists) is written back byte-for-byte.

use std::collections::BTreeMap;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader as XmlReader, Writer as XmlWriter};

use super::cell_ref::{cell_ref, parse_cell_ref};
use crate::error::{Error, Result};

/// A string value to place in one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    pub row: u32,
    pub col: u32,
    pub text: String,
    /// Write as a `HYPERLINK` formula pointing at `text`.
    pub hyperlink: bool,
}

/// One `<c>` element (or anything else found inside a row) as raw events.
struct RowChild<'a> {
    col: Option<u32>,
    events: Vec<Event<'a>>,
}

pub fn patch_sheet_xml(xml: &str, writes: &[CellWrite]) -> Result<Vec<u8>> {
    let mut pending: BTreeMap<u32, BTreeMap<u32, &CellWrite>> = BTreeMap::new();
    for write in writes {
        pending.entry(write.row).or_default().insert(write.col, write);
    }

    let mut reader = XmlReader::from_str(xml);
    let mut writer = XmlWriter::new(Vec::new());
    let mut in_sheet_data = false;
    let mut prefix = String::new();
    let mut last_row = 0u32;

    loop {
        let event = reader.read_event()?;
        match event {
            Event::Start(ref e) if e.local_name().as_ref() == b"sheetData" => {
                prefix = element_prefix(e.name().as_ref());
                in_sheet_data = true;
                writer.write_event(event)?;
            }
            Event::Empty(ref e) if e.local_name().as_ref() == b"sheetData" => {
                prefix = element_prefix(e.name().as_ref());
                if pending.is_empty() {
                    writer.write_event(event)?;
                } else {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    writer.write_event(Event::Start(e.to_owned()))?;
                    write_new_rows(&mut writer, &prefix, std::mem::take(&mut pending))?;
                    writer.write_event(Event::End(BytesEnd::new(name)))?;
                }
            }
            Event::End(ref e) if e.local_name().as_ref() == b"sheetData" => {
                in_sheet_data = false;
                write_new_rows(&mut writer, &prefix, std::mem::take(&mut pending))?;
                writer.write_event(event)?;
            }
            Event::Start(ref e) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                let row = row_number(e)?.unwrap_or(last_row + 1);
                last_row = row;
                flush_rows_before(&mut writer, &prefix, &mut pending, row)?;

                match pending.remove(&row) {
                    Some(cells) => {
                        let children = read_row_children(&mut reader)?;
                        write_patched_row(&mut writer, e, &prefix, row, children, cells)?;
                    }
                    None => writer.write_event(event)?,
                }
            }
            Event::Empty(ref e) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                let row = row_number(e)?.unwrap_or(last_row + 1);
                last_row = row;
                flush_rows_before(&mut writer, &prefix, &mut pending, row)?;

                match pending.remove(&row) {
                    Some(cells) => {
                        write_patched_row(&mut writer, e, &prefix, row, Vec::new(), cells)?
                    }
                    None => writer.write_event(event)?,
                }
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    if !pending.is_empty() {
        return Err(Error::workbook("worksheet has no <sheetData> element"));
    }

    Ok(writer.into_inner())
}

fn element_prefix(name: &[u8]) -> String {
    let name = String::from_utf8_lossy(name);
    match name.split_once(':') {
        Some((prefix, _)) => format!("{}:", prefix),
        None => String::new(),
    }
}

fn row_number(e: &BytesStart<'_>) -> Result<Option<u32>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"r" {
            return Ok(attr.unescape_value()?.trim().parse().ok());
        }
    }
    Ok(None)
}

fn cell_column(e: &BytesStart<'_>) -> Result<Option<u32>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"r" {
            return Ok(parse_cell_ref(&attr.unescape_value()?).map(|(_, col)| col));
        }
    }
    Ok(None)
}

fn style_of(e: &BytesStart<'_>) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"s" {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Read everything up to the `</row>` that closes the row just opened,
/// split into cell-sized chunks.
fn read_row_children<'a>(reader: &mut XmlReader<&'a [u8]>) -> Result<Vec<RowChild<'a>>> {
    let mut children = Vec::new();
    let mut current: Option<RowChild<'a>> = None;
    let mut depth = 0usize;
    let mut last_col = 0u32;

    loop {
        let event = reader.read_event()?;

        let mut opens_child = false;
        let mut col = None;
        match &event {
            Event::End(e) if depth == 0 && e.local_name().as_ref() == b"row" => break,
            Event::Eof => return Err(Error::workbook("unterminated <row> in worksheet")),
            Event::Start(e) | Event::Empty(e) if depth == 0 => {
                if e.local_name().as_ref() == b"c" {
                    let c = cell_column(e)?.unwrap_or(last_col + 1);
                    last_col = c;
                    col = Some(c);
                }
                opens_child = true;
            }
            _ => {}
        }

        match event {
            Event::Empty(_) if opens_child => {
                children.push(RowChild { col, events: vec![event] });
                continue;
            }
            Event::Start(_) => {
                if opens_child {
                    current = Some(RowChild { col, events: Vec::new() });
                }
                depth += 1;
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }

        match current.as_mut() {
            Some(child) => child.events.push(event),
            // whitespace between cells
            None => children.push(RowChild { col: None, events: vec![event] }),
        }

        if depth == 0 {
            if let Some(child) = current.take() {
                children.push(child);
            }
        }
    }

    Ok(children)
}

fn write_patched_row<'a>(
    writer: &mut XmlWriter<Vec<u8>>,
    row_start: &BytesStart<'_>,
    prefix: &str,
    row: u32,
    children: Vec<RowChild<'a>>,
    cells: BTreeMap<u32, &CellWrite>,
) -> Result<()> {
    let name = String::from_utf8_lossy(row_start.name().as_ref()).into_owned();

    // `spans` is only an optimisation hint and may no longer cover the row.
    let mut start = BytesStart::new(name.clone());
    for attr in row_start.attributes() {
        let attr = attr?;
        if attr.key.as_ref() != b"spans" {
            start.push_attribute(attr);
        }
    }
    writer.write_event(Event::Start(start))?;

    let mut styles: BTreeMap<u32, Option<String>> = BTreeMap::new();
    let mut kept = Vec::with_capacity(children.len());
    for child in children {
        match child.col {
            Some(col) if cells.contains_key(&col) => {
                let style = match child.events.first() {
                    Some(Event::Start(e)) | Some(Event::Empty(e)) => style_of(e)?,
                    _ => None,
                };
                styles.insert(col, style);
            }
            _ => kept.push(child),
        }
    }

    let mut new_cells = cells.into_iter().peekable();
    for child in kept {
        if let Some(col) = child.col {
            while let Some((_, write)) = new_cells.next_if(|(c, _)| *c < col) {
                let style = styles.get(&write.col).cloned().flatten();
                write_cell(writer, prefix, row, write, style.as_deref())?;
            }
        }
        for event in child.events {
            writer.write_event(event)?;
        }
    }
    for (_, write) in new_cells {
        let style = styles.get(&write.col).cloned().flatten();
        write_cell(writer, prefix, row, write, style.as_deref())?;
    }

    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn flush_rows_before(
    writer: &mut XmlWriter<Vec<u8>>,
    prefix: &str,
    pending: &mut BTreeMap<u32, BTreeMap<u32, &CellWrite>>,
    row: u32,
) -> Result<()> {
    let later = pending.split_off(&row);
    let earlier = std::mem::replace(pending, later);
    write_new_rows(writer, prefix, earlier)
}

fn write_new_rows(
    writer: &mut XmlWriter<Vec<u8>>,
    prefix: &str,
    rows: BTreeMap<u32, BTreeMap<u32, &CellWrite>>,
) -> Result<()> {
    for (row, cells) in rows {
        let name = format!("{}row", prefix);
        let mut start = BytesStart::new(name.clone());
        start.push_attribute(("r", row.to_string().as_str()));
        writer.write_event(Event::Start(start))?;
        for write in cells.values() {
            write_cell(writer, prefix, row, write, None)?;
        }
        writer.write_event(Event::End(BytesEnd::new(name)))?;
    }
    Ok(())
}

fn write_cell(
    writer: &mut XmlWriter<Vec<u8>>,
    prefix: &str,
    row: u32,
    write: &CellWrite,
    style: Option<&str>,
) -> Result<()> {
    let tag = |local: &str| format!("{}{}", prefix, local);
    let reference = cell_ref(row, write.col);

    let mut start = BytesStart::new(tag("c"));
    start.push_attribute(("r", reference.as_str()));
    if let Some(style) = style {
        start.push_attribute(("s", style));
    }
    start.push_attribute(("t", if write.hyperlink { "str" } else { "inlineStr" }));
    writer.write_event(Event::Start(start))?;

    if write.hyperlink {
        let url = write.text.replace('"', "\"\"");
        let formula = format!("HYPERLINK(\"{}\",\"{}\")", url, url);
        write_text_element(writer, &tag("f"), &formula)?;
        write_text_element(writer, &tag("v"), &write.text)?;
    } else {
        writer.write_event(Event::Start(BytesStart::new(tag("is"))))?;
        write_text_element(writer, &tag("t"), &write.text)?;
        writer.write_event(Event::End(BytesEnd::new(tag("is"))))?;
    }

    writer.write_event(Event::End(BytesEnd::new(tag("c"))))?;
    Ok(())
}

fn write_text_element(writer: &mut XmlWriter<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
