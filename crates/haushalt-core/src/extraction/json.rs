use std::path::Path;

use crate::error::HaushaltError;
use crate::extraction::{document_name, DocumentLoader, RawDocument};

/// Reads documents that an external extraction step already split into
/// paragraphs and tables.
pub struct JsonDocumentLoader;

impl DocumentLoader for JsonDocumentLoader {
    fn load(&self, path: &Path) -> Result<RawDocument, HaushaltError> {
        let bytes = std::fs::read(path).map_err(|e| HaushaltError::Document {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut doc: RawDocument =
            serde_json::from_slice(&bytes).map_err(|e| HaushaltError::Document {
                path: path.to_path_buf(),
                reason: format!("invalid document JSON: {e}"),
            })?;
        if doc.name.is_empty() {
            doc.name = document_name(path);
        }
        Ok(doc)
    }

    fn backend_name(&self) -> &str {
        "json"
    }
}
