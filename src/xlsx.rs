//! Minimal OOXML spreadsheet (`.xlsx`) reader.
//!
//! Reads just enough of a workbook to address cells by column letter:
//! sheet order, shared strings, and cell values of a single worksheet.
//! Styles, formulas, and dates are not interpreted; every cell value comes
//! back as the text stored in the file.
//!
//! Sheet order follows `xl/workbook.xml` resolved through
//! `xl/_rels/workbook.xml.rels`. Archives without a usable workbook part
//! fall back to the numeric order of `xl/worksheets/sheetN.xml`.

use quick_xml::events::{BytesStart, Event};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const WORKSHEET_PREFIX: &str = "xl/worksheets/sheet";

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;
/// Maximum cells to read per sheet.
const MAX_CELLS_PER_SHEET: usize = 2_000_000;
/// Widest column reference a worksheet can hold (`XFD`).
const MAX_COLUMN_LETTERS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum XlsxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid xlsx archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("malformed XML in {part}: {message}")]
    Xml { part: String, message: String },
    #[error("{part} exceeds size limit ({limit} bytes)")]
    TooLarge { part: String, limit: u64 },
    #[error("sheet index {index} out of range (workbook has {count} sheets)")]
    MissingSheet { index: usize, count: usize },
}

fn xml_error(part: &str, err: impl std::fmt::Display) -> XlsxError {
    XlsxError::Xml {
        part: part.to_string(),
        message: err.to_string(),
    }
}

/// One non-empty worksheet row, cells keyed by column letter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetRow {
    /// 1-based row number from the file, when present.
    pub number: Option<u32>,
    cells: BTreeMap<String, String>,
}

impl SheetRow {
    /// Value of the cell in `column` (e.g. `"C"`), if the row has one.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// An opened workbook with its sheet list and shared-string table loaded.
pub struct Workbook<R: Read + Seek> {
    archive: ZipArchive<R>,
    sheets: Vec<SheetEntry>,
    shared_strings: Vec<String>,
}

#[derive(Debug, Clone)]
struct SheetEntry {
    name: String,
    part: String,
}

impl Workbook<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, XlsxError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> Workbook<R> {
    pub fn from_reader(reader: R) -> Result<Self, XlsxError> {
        let mut archive = ZipArchive::new(reader)?;
        let sheets = list_sheets(&mut archive)?;
        let shared_strings = if has_entry(&archive, SHARED_STRINGS_PART) {
            let xml = read_entry_bounded(&mut archive, SHARED_STRINGS_PART)?;
            parse_shared_strings(&xml)?
        } else {
            Vec::new()
        };
        Ok(Self {
            archive,
            sheets,
            shared_strings,
        })
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Reads every non-empty row of the sheet at zero-based `index`.
    pub fn sheet_rows(&mut self, index: usize) -> Result<Vec<SheetRow>, XlsxError> {
        let entry = self
            .sheets
            .get(index)
            .cloned()
            .ok_or(XlsxError::MissingSheet {
                index,
                count: self.sheets.len(),
            })?;
        let xml = read_entry_bounded(&mut self.archive, &entry.part)?;
        parse_sheet(&entry.part, &xml, &self.shared_strings)
    }
}

fn has_entry<R: Read + Seek>(archive: &ZipArchive<R>, name: &str) -> bool {
    archive.file_names().any(|n| n == name)
}

fn read_entry_bounded<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Vec<u8>, XlsxError> {
    let entry = archive.by_name(name)?;
    let mut out = Vec::new();
    entry.take(MAX_XML_ENTRY_BYTES).read_to_end(&mut out)?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(XlsxError::TooLarge {
            part: name.to_string(),
            limit: MAX_XML_ENTRY_BYTES,
        });
    }
    Ok(out)
}

fn attr_value(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        if a.key.local_name().as_ref() == local {
            a.unescape_value().ok().map(|v| v.into_owned())
        } else {
            None
        }
    })
}

fn list_sheets<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<SheetEntry>, XlsxError> {
    if has_entry(archive, WORKBOOK_PART) && has_entry(archive, WORKBOOK_RELS_PART) {
        let workbook = read_entry_bounded(archive, WORKBOOK_PART)?;
        let rels = read_entry_bounded(archive, WORKBOOK_RELS_PART)?;
        let targets = parse_relationships(&rels)?;
        let declared = parse_workbook_sheets(&workbook)?;

        let mut sheets = Vec::new();
        for (name, rel_id) in declared {
            if let Some(target) = targets.get(&rel_id) {
                let part = resolve_target(target);
                if has_entry(archive, &part) {
                    sheets.push(SheetEntry { name, part });
                }
            }
        }
        if !sheets.is_empty() {
            return Ok(sheets);
        }
    }

    let mut parts: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with(WORKSHEET_PREFIX) && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    parts.sort_by_key(|name| {
        name.trim_start_matches(WORKSHEET_PREFIX)
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    Ok(parts
        .into_iter()
        .map(|part| SheetEntry {
            name: part
                .trim_start_matches("xl/worksheets/")
                .trim_end_matches(".xml")
                .to_string(),
            part,
        })
        .collect())
}

/// Relationship targets are relative to `xl/` unless they start with `/`.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target.trim_start_matches("./")),
    }
}

/// `(sheet name, relationship id)` pairs in declaration order.
fn parse_workbook_sheets(xml: &[u8]) -> Result<Vec<(String, String)>, XlsxError> {
    let mut out = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                let name = attr_value(&e, b"name").unwrap_or_default();
                if let Some(rel_id) = attr_value(&e, b"id") {
                    out.push((name, rel_id));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(WORKBOOK_PART, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, String>, XlsxError> {
    let mut out = HashMap::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) =
                    (attr_value(&e, b"Id"), attr_value(&e, b"Target"))
                {
                    out.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(WORKBOOK_RELS_PART, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

/// One entry per `<si>`; rich-text runs are concatenated.
fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>, XlsxError> {
    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    let mut in_t = false;
    // Phonetic runs (<rPh>) carry furigana, not cell text.
    let mut in_phonetic = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => in_phonetic = true,
                b"t" if !in_phonetic => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Ok(Event::Text(te)) if in_t => {
                if let Some(s) = current.as_mut() {
                    let text = te
                        .unescape()
                        .map_err(|e| xml_error(SHARED_STRINGS_PART, e))?;
                    s.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"si" => strings.push(current.take().unwrap_or_default()),
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(SHARED_STRINGS_PART, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Splits a cell reference like `"AB12"` into its column letters.
///
/// References wider than `XFD` are treated as absent.
fn column_of(cell_ref: &str) -> Option<&str> {
    let end = cell_ref
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(cell_ref.len());
    if end == 0 || end > MAX_COLUMN_LETTERS {
        None
    } else {
        Some(&cell_ref[..end])
    }
}

/// `"A"` → 1, `"Z"` → 26, `"AA"` → 27.
fn column_number(letters: &str) -> u32 {
    letters
        .bytes()
        .map(|b| (b.to_ascii_uppercase() - b'A' + 1) as u32)
        .fold(0u32, |acc, d| acc.saturating_mul(26).saturating_add(d))
}

/// 1 → `"A"`, 27 → `"AA"`.
fn column_letters(mut number: u32) -> String {
    let mut out = Vec::new();
    while number > 0 {
        let rem = ((number - 1) % 26) as u8;
        out.push(b'A' + rem);
        number = (number - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[derive(Default)]
struct CellState {
    column: String,
    kind: Option<String>,
    value: String,
    in_v: bool,
    in_is: bool,
    in_t: bool,
}

impl CellState {
    /// Turns the raw `<v>` / inline text into the cell's display text.
    fn resolve(self, shared_strings: &[String]) -> Option<String> {
        let text = match self.kind.as_deref() {
            Some("s") => {
                let idx = self.value.trim().parse::<usize>().ok()?;
                shared_strings.get(idx).cloned()
            }
            Some("b") => Some(match self.value.trim() {
                "1" => "TRUE".to_string(),
                _ => "FALSE".to_string(),
            }),
            _ => Some(self.value),
        };
        text.filter(|v| !v.is_empty())
    }
}

fn parse_sheet(
    part: &str,
    xml: &[u8],
    shared_strings: &[String],
) -> Result<Vec<SheetRow>, XlsxError> {
    parse_sheet_limited(part, xml, shared_strings, MAX_CELLS_PER_SHEET)
}

fn parse_sheet_limited(
    part: &str,
    xml: &[u8],
    shared_strings: &[String],
    max_cells: usize,
) -> Result<Vec<SheetRow>, XlsxError> {
    let mut rows = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut row = SheetRow::default();
    let mut last_column = 0u32;
    let mut cell: Option<CellState> = None;
    let mut cell_count = 0usize;

    loop {
        if cell_count >= max_cells {
            tracing::warn!(part, limit = max_cells, "sheet truncated at cell limit");
            if !row.is_empty() {
                rows.push(std::mem::take(&mut row));
            }
            break;
        }
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    row = SheetRow {
                        number: attr_value(&e, b"r").and_then(|r| r.parse().ok()),
                        cells: BTreeMap::new(),
                    };
                    last_column = 0;
                }
                b"c" => {
                    let column = attr_value(&e, b"r")
                        .and_then(|r| column_of(&r).map(str::to_ascii_uppercase))
                        .unwrap_or_else(|| column_letters(last_column.saturating_add(1)));
                    last_column = column_number(&column);
                    cell = Some(CellState {
                        column,
                        kind: attr_value(&e, b"t"),
                        ..CellState::default()
                    });
                }
                b"v" => {
                    if let Some(c) = cell.as_mut() {
                        c.in_v = true;
                    }
                }
                b"is" => {
                    if let Some(c) = cell.as_mut() {
                        c.in_is = true;
                    }
                }
                b"t" => {
                    if let Some(c) = cell.as_mut() {
                        c.in_t = c.in_is;
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"c" => {
                // A value-less cell still advances the implicit column.
                if let Some(col) = attr_value(&e, b"r").and_then(|r| column_of(&r).map(column_number)) {
                    last_column = col;
                } else {
                    last_column = last_column.saturating_add(1);
                }
            }
            Ok(Event::Text(te)) => {
                if let Some(c) = cell.as_mut() {
                    if c.in_v || c.in_t {
                        let text = te.unescape().map_err(|e| xml_error(part, e))?;
                        c.value.push_str(&text);
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" => {
                    if let Some(c) = cell.as_mut() {
                        c.in_v = false;
                    }
                }
                b"t" => {
                    if let Some(c) = cell.as_mut() {
                        c.in_t = false;
                    }
                }
                b"is" => {
                    if let Some(c) = cell.as_mut() {
                        c.in_is = false;
                    }
                }
                b"c" => {
                    if let Some(c) = cell.take() {
                        let column = c.column.clone();
                        if let Some(value) = c.resolve(shared_strings) {
                            row.cells.insert(column, value);
                            cell_count += 1;
                        }
                    }
                }
                b"row" => {
                    let done = std::mem::take(&mut row);
                    if !done.is_empty() {
                        rows.push(done);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(part, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}
