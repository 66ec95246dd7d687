use haushalt_core::error::HaushaltError;
use std::path::{Path, PathBuf};

use super::load_layouts;

pub fn run(
    input_files: &[PathBuf],
    out_dir: &Path,
    layouts_file: Option<&Path>,
    with_context: bool,
) -> Result<(), HaushaltError> {
    let layouts = load_layouts(layouts_file)?;
    let (acc, report) = haushalt_core::convert_files(input_files, &layouts)?;

    std::fs::create_dir_all(out_dir)?;
    tracing::debug!(out_dir = %out_dir.display(), layouts = %layouts.name, "writing outputs");
    let written = haushalt_core::export::write_outputs(&acc, &layouts, out_dir, with_context)?;

    for (path, (_, records)) in written.iter().zip(acc.iter()) {
        eprintln!("  {} ({} records)", path.display(), records.len());
    }
    eprintln!(
        "Converted {} of {} table(s) from {} document(s).",
        report.tables_converted, report.tables_seen, report.documents
    );
    if !report.skipped.is_empty() {
        eprintln!("  {} table(s) skipped:", report.skipped.len());
        for s in &report.skipped {
            eprintln!("    {} table {}: {}", s.document, s.table_index, s.reason);
        }
    }
    if report.rollup_mismatches > 0 {
        eprintln!(
            "  {} aggregate value(s) differ from the sum of their rows",
            report.rollup_mismatches
        );
    }

    Ok(())
}
