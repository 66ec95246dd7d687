//! `.docx` loading: unzip the container and walk `word/document.xml`.
//!
//! Only what the budget tables need is kept: body paragraphs (for the
//! heading context) and top-level tables with their merged cells expanded
//! the way a word processor displays them.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::HaushaltError;
use crate::extraction::{document_name, Block, DocumentLoader, RawDocument, RawTable};

pub struct DocxLoader;

impl DocumentLoader for DocxLoader {
    fn load(&self, path: &Path) -> Result<RawDocument, HaushaltError> {
        let doc_error = |reason: String| HaushaltError::Document {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|e| doc_error(e.to_string()))?;
        let mut archive =
            ZipArchive::new(file).map_err(|e| doc_error(format!("not a docx container: {e}")))?;

        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| doc_error(format!("missing word/document.xml: {e}")))?
            .read_to_string(&mut xml)
            .map_err(|e| doc_error(e.to_string()))?;

        let blocks = parse_document_xml(&xml).map_err(doc_error)?;
        tracing::debug!(
            path = %path.display(),
            blocks = blocks.len(),
            "parsed word/document.xml"
        );

        Ok(RawDocument {
            name: document_name(path),
            blocks,
        })
    }

    fn backend_name(&self) -> &str {
        "docx"
    }
}

/// A `w:tc` before span expansion.
#[derive(Debug, Clone)]
struct CellInfo {
    text: String,
    grid_span: usize,
    /// `Some(true)` starts a vertical merge, `Some(false)` continues one.
    v_merge: Option<bool>,
}

impl Default for CellInfo {
    fn default() -> Self {
        CellInfo {
            text: String::new(),
            grid_span: 1,
            v_merge: None,
        }
    }
}

#[derive(Default)]
struct BodyWalker {
    blocks: Vec<Block>,
    table_depth: usize,
    rows: Vec<Vec<CellInfo>>,
    row: Vec<CellInfo>,
    cell: Option<CellInfo>,
    cell_paragraphs: Vec<String>,
    paragraph: String,
    paragraph_depth: usize,
    /// Inside a `w:r`; `w:tab` elsewhere is a tab-stop definition.
    in_run: bool,
    in_text: bool,
}

impl BodyWalker {
    /// Paragraph content is collected only in the body and in top-level table cells.
    fn collecting(&self) -> bool {
        self.table_depth == 0 || (self.table_depth == 1 && self.cell.is_some())
    }

    fn start(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"w:tbl" => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.rows.clear();
                }
            }
            b"w:tr" if self.table_depth == 1 => self.row.clear(),
            b"w:tc" if self.table_depth == 1 => {
                self.cell = Some(CellInfo::default());
                self.cell_paragraphs.clear();
            }
            b"w:p" if self.collecting() => {
                if self.paragraph_depth == 0 {
                    self.paragraph.clear();
                }
                self.paragraph_depth += 1;
            }
            b"w:r" if self.paragraph_depth > 0 => self.in_run = true,
            b"w:t" if self.paragraph_depth > 0 => self.in_text = true,
            _ => self.property(e),
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"w:tbl" => {
                if self.table_depth == 1 {
                    let grid = expand_grid(&self.rows);
                    self.blocks.push(Block::Table(RawTable::new(grid)));
                    self.rows.clear();
                }
                self.table_depth = self.table_depth.saturating_sub(1);
            }
            b"w:tr" if self.table_depth == 1 => {
                let row = std::mem::take(&mut self.row);
                self.rows.push(row);
            }
            b"w:tc" if self.table_depth == 1 => {
                if let Some(mut cell) = self.cell.take() {
                    cell.text = self.cell_paragraphs.join("\n").trim().to_string();
                    self.row.push(cell);
                }
            }
            b"w:p" if self.paragraph_depth > 0 && self.collecting() => {
                self.paragraph_depth -= 1;
                if self.paragraph_depth == 0 {
                    let text = std::mem::take(&mut self.paragraph);
                    if self.table_depth == 0 {
                        let text = text.trim();
                        if !text.is_empty() {
                            self.blocks.push(Block::Paragraph(text.to_string()));
                        }
                    } else {
                        self.cell_paragraphs.push(text);
                    }
                }
            }
            b"w:r" => self.in_run = false,
            b"w:t" => self.in_text = false,
            _ => {}
        }
    }

    /// Self-closing elements and cell properties.
    fn property(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"w:tab" if self.in_run && self.paragraph_depth > 0 => self.paragraph.push('\t'),
            b"w:br" | b"w:cr" if self.in_run && self.paragraph_depth > 0 => {
                self.paragraph.push('\n')
            }
            b"w:gridSpan" if self.table_depth == 1 => {
                if let (Some(cell), Some(span)) = (
                    self.cell.as_mut(),
                    attr_value(e, b"w:val").and_then(|v| v.parse::<usize>().ok()),
                ) {
                    cell.grid_span = span.max(1);
                }
            }
            b"w:vMerge" if self.table_depth == 1 => {
                if let Some(cell) = self.cell.as_mut() {
                    let restart = attr_value(e, b"w:val").as_deref() == Some("restart");
                    cell.v_merge = Some(restart);
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_text && self.paragraph_depth > 0 {
            self.paragraph.push_str(text);
        }
    }
}

/// Walk the XML of `word/document.xml` and return its blocks in document order.
pub fn parse_document_xml(xml: &str) -> Result<Vec<Block>, String> {
    let mut reader = Reader::from_str(xml);
    let mut walker = BodyWalker::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => walker.start(&e),
            Ok(Event::Empty(e)) => walker.property(&e),
            Ok(Event::End(e)) => walker.end(e.name().as_ref()),
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| format!("invalid text at {}: {err}", reader.buffer_position()))?;
                walker.text(&text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "XML error at position {}: {e}",
                    reader.buffer_position()
                ))
            }
        }
    }

    Ok(walker.blocks)
}

fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

/// Expand horizontal spans (text repeated in every spanned column) and
/// vertical merges (continuation cells repeat the restart cell's text).
fn expand_grid(rows: &[Vec<CellInfo>]) -> Vec<Vec<String>> {
    let mut grid = Vec::with_capacity(rows.len());
    let mut merge_starts: HashMap<usize, String> = HashMap::new();

    for row in rows {
        let mut cells = Vec::new();
        for cell in row {
            let col = cells.len();
            let text = match cell.v_merge {
                Some(true) => {
                    merge_starts.insert(col, cell.text.clone());
                    cell.text.clone()
                }
                Some(false) => merge_starts.get(&col).cloned().unwrap_or_default(),
                None => {
                    merge_starts.remove(&col);
                    cell.text.clone()
                }
            };
            for _ in 0..cell.grid_span {
                cells.push(text.clone());
            }
        }
        grid.push(cells);
    }

    grid
}
