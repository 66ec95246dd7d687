pub mod classify;
pub mod error;
pub mod export;
pub mod extraction;
pub mod layouts;
pub mod model;
pub mod parsing;
pub mod pipeline;
pub mod tables;

use std::path::Path;

use error::HaushaltError;
use extraction::load_document;
use layouts::schema::LayoutSet;
use pipeline::{Accumulator, RunReport};

/// Main API entry point: load documents and convert all their tables.
///
/// Documents are processed in the given order; that order decides the
/// record order within each layout. A document that cannot be loaded aborts
/// the run, a table that cannot be converted does not.
pub fn convert_files<P: AsRef<Path>>(
    paths: &[P],
    layouts: &LayoutSet,
) -> Result<(Accumulator, RunReport), HaushaltError> {
    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let doc = load_document(path)?;
        tracing::info!(
            path = %path.display(),
            tables = doc.tables().count(),
            "document loaded"
        );
        docs.push(doc);
    }
    pipeline::convert_documents(&docs, layouts)
}
