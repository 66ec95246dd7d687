use haushalt_core::error::HaushaltError;
use haushalt_core::extraction::load_document;
use haushalt_core::pipeline::analyze_document;
use std::path::Path;

use super::load_layouts;
use crate::output;

pub fn run(
    input_file: &Path,
    output_format: &str,
    layouts_file: Option<&Path>,
) -> Result<(), HaushaltError> {
    let layouts = load_layouts(layouts_file)?;
    let doc = load_document(input_file)?;
    let outcomes = analyze_document(&doc, &layouts);

    match output_format {
        "json" => output::json::print(&doc.name, &outcomes)?,
        _ => output::table::print(&doc.name, &outcomes),
    }

    Ok(())
}
