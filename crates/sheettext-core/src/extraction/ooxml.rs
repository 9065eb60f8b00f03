//! Direct reads of the XLSX package for what calamine does not expose:
//! per-sheet comments and the pictures and charts anchored in a sheet's
//! drawing part.
//!
//! Parts are located through relationships:
//! `xl/workbook.xml` (sheet name -> r:id) -> `xl/_rels/workbook.xml.rels`
//! (r:id -> sheet part) -> `xl/worksheets/_rels/sheetN.xml.rels`
//! (drawing and comments parts).

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader as XmlReader;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::cell::parse_cell_reference;
use crate::error::ExtractError;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

/// Relationship from one package part to another.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    /// Last path segment of the relationship type URI (`drawing`, `comments`, ...).
    pub fn kind(&self) -> &str {
        self.rel_type.rsplit('/').next().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetComment {
    pub row: u32,
    pub col: u32,
    pub text: String,
}

/// Everything attached to a sheet besides its cell values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetAnnotations {
    pub comments: Vec<SheetComment>,
    pub image_count: usize,
    pub chart_count: usize,
}

/// Pictures and charts anchored in one drawing part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawingCounts {
    pub images: usize,
    pub charts: usize,
}

pub struct WorkbookPackage<R> {
    archive: ZipArchive<R>,
    /// Sheet name -> worksheet part path.
    sheet_parts: HashMap<String, String>,
}

impl WorkbookPackage<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> WorkbookPackage<R> {
    pub fn from_reader(reader: R) -> Result<Self, ExtractError> {
        let mut archive = ZipArchive::new(reader)?;

        let workbook_xml = read_part(&mut archive, WORKBOOK_PART)?
            .ok_or_else(|| ExtractError::MissingPart(WORKBOOK_PART.into()))?;
        let sheet_ids = parse_workbook_sheets(&workbook_xml)
            .map_err(|e| malformed(WORKBOOK_PART, e))?;

        let rels = match read_part(&mut archive, WORKBOOK_RELS_PART)? {
            Some(xml) => {
                parse_relationships(&xml).map_err(|e| malformed(WORKBOOK_RELS_PART, e))?
            }
            None => Vec::new(),
        };

        let mut sheet_parts = HashMap::new();
        for (name, rel_id) in sheet_ids {
            if let Some(rel) = rels.iter().find(|r| r.id == rel_id && !r.external) {
                sheet_parts.insert(name, resolve_target(WORKBOOK_PART, &rel.target));
            }
        }

        Ok(WorkbookPackage {
            archive,
            sheet_parts,
        })
    }

    pub fn sheet_part(&self, sheet_name: &str) -> Option<&str> {
        self.sheet_parts.get(sheet_name).map(String::as_str)
    }

    /// Read comments and drawing counts for one sheet.
    ///
    /// A sheet without a relationships part has no annotations. A relationship
    /// that points at a part missing from the archive is an error.
    pub fn sheet_annotations(&mut self, sheet_name: &str) -> Result<SheetAnnotations, ExtractError> {
        let Some(sheet_part) = self.sheet_parts.get(sheet_name).cloned() else {
            return Ok(SheetAnnotations::default());
        };

        let rels_part = rels_part_for(&sheet_part);
        let rels = match read_part(&mut self.archive, &rels_part)? {
            Some(xml) => parse_relationships(&xml).map_err(|e| malformed(&rels_part, e))?,
            None => return Ok(SheetAnnotations::default()),
        };

        let mut annotations = SheetAnnotations::default();
        for rel in rels.iter().filter(|r| !r.external) {
            match rel.kind() {
                "drawing" => {
                    let part = resolve_target(&sheet_part, &rel.target);
                    let xml = self.require_part(&part)?;
                    let counts = count_drawing_objects(&xml).map_err(|e| malformed(&part, e))?;
                    annotations.image_count += counts.images;
                    annotations.chart_count += counts.charts;
                }
                "comments" => {
                    let part = resolve_target(&sheet_part, &rel.target);
                    let xml = self.require_part(&part)?;
                    let comments = parse_comments(&xml).map_err(|e| malformed(&part, e))?;
                    annotations.comments.extend(comments);
                }
                _ => {}
            }
        }

        annotations.comments.sort_by_key(|c| (c.row, c.col));
        Ok(annotations)
    }

    fn require_part(&mut self, part: &str) -> Result<String, ExtractError> {
        read_part(&mut self.archive, part)?.ok_or_else(|| ExtractError::MissingPart(part.into()))
    }
}

fn malformed(part: &str, e: quick_xml::Error) -> ExtractError {
    ExtractError::MalformedPart {
        part: part.into(),
        reason: e.to_string(),
    }
}

/// Read a part as text, or `None` when the archive has no such entry.
fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Option<String>, ExtractError> {
    let mut file = match archive.by_name(path) {
        Ok(f) => f,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

/// `xl/worksheets/sheet1.xml` -> `xl/worksheets/_rels/sheet1.xml.rels`
fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target against the part that owns the relationship.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for seg in target.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

fn attr_value(e: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>, quick_xml::Error> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == local {
            let value = attr.unescape_value()?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// `<sheet name="..." r:id="..."/>` entries in workbook order.
fn parse_workbook_sheets(xml: &str) -> Result<Vec<(String, String)>, quick_xml::Error> {
    let mut reader = XmlReader::from_str(xml);
    let mut sheets = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let name = attr_value(&e, b"name")?;
                let id = attr_value(&e, b"id")?;
                if let (Some(name), Some(id)) = (name, id) {
                    sheets.push((name, id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheets)
}

pub fn parse_relationships(xml: &str) -> Result<Vec<Relationship>, quick_xml::Error> {
    let mut reader = XmlReader::from_str(xml);
    let mut rels = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let id = attr_value(&e, b"Id")?;
                let target = attr_value(&e, b"Target")?;
                let rel_type = attr_value(&e, b"Type")?.unwrap_or_default();
                let external = attr_value(&e, b"TargetMode")?
                    .map(|m| m.eq_ignore_ascii_case("external"))
                    .unwrap_or(false);
                if let (Some(id), Some(target)) = (id, target) {
                    rels.push(Relationship {
                        id,
                        rel_type,
                        target,
                        external,
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rels)
}

/// Count `<xdr:pic>` anchors and `<c:chart>` graphic frames in a drawing part.
pub fn count_drawing_objects(xml: &str) -> Result<DrawingCounts, quick_xml::Error> {
    let mut reader = XmlReader::from_str(xml);
    let mut counts = DrawingCounts::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"pic" => counts.images += 1,
                b"chart" => counts.charts += 1,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(counts)
}

/// Parse a legacy comments part (`xl/commentsN.xml`).
///
/// The comment text is every `<t>` run inside `<text>` joined together;
/// phonetic runs (`<rPh>`) are skipped. Comments with an unparseable `ref`
/// are dropped.
pub fn parse_comments(xml: &str) -> Result<Vec<SheetComment>, quick_xml::Error> {
    let mut reader = XmlReader::from_str(xml);
    let mut comments = Vec::new();

    let mut current: Option<(u32, u32)> = None;
    let mut text = String::new();
    let mut in_t = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"comment" => {
                    current = attr_value(&e, b"ref")?
                        .as_deref()
                        .and_then(parse_cell_reference);
                    text.clear();
                }
                b"rPh" => phonetic_depth += 1,
                b"t" if current.is_some() && phonetic_depth == 0 => in_t = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"comment" => {
                    if let Some((row, col)) = current.take() {
                        comments.push(SheetComment {
                            row,
                            col,
                            text: std::mem::take(&mut text),
                        });
                    }
                }
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"t" => in_t = false,
                _ => {}
            },
            Event::Text(t) if in_t => text.push_str(&t.unescape()?),
            Event::CData(t) if in_t => text.push_str(&String::from_utf8_lossy(&t)),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(comments)
}
