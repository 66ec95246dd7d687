pub mod docx;
pub mod json;

use crate::error::HaushaltError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A table as it appears in the document: rows of trimmed cell texts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<String>>) -> RawTable {
        RawTable { rows }
    }

    /// Widest row; merged cells are already expanded.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }
}

/// A block of document content in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    Paragraph(String),
    Table(RawTable),
}

/// The content of one input document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub name: String,
    pub blocks: Vec<Block>,
}

impl RawDocument {
    pub fn tables(&self) -> impl Iterator<Item = &RawTable> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        })
    }
}

/// Trait for document loading backends.
pub trait DocumentLoader: Send + Sync {
    /// Read the document at `path` into paragraphs and tables.
    fn load(&self, path: &Path) -> Result<RawDocument, HaushaltError>;

    /// Name of this loader (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Load a document, picking the loader by file extension.
pub fn load_document(path: &Path) -> Result<RawDocument, HaushaltError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let loader: &dyn DocumentLoader = match extension.as_deref() {
        Some("docx") => &docx::DocxLoader,
        Some("json") => &json::JsonDocumentLoader,
        _ => {
            return Err(HaushaltError::Document {
                path: path.to_path_buf(),
                reason: "unsupported file type (expected .docx or .json)".into(),
            })
        }
    };

    tracing::debug!(path = %path.display(), backend = loader.backend_name(), "loading document");
    loader.load(path)
}

/// Name used for a document in diagnostics and run reports.
pub(crate) fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
