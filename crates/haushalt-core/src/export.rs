//! CSV serialization of the accumulated records, one file per layout.
//!
//! String fields are always quoted, numbers never. The `csv` crate's
//! `NonNumeric` style would leave codes like `10.1` unquoted, so fields are
//! quoted here and the writer is told not to quote again.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, WriterBuilder};

use crate::error::HaushaltError;
use crate::layouts::schema::LayoutSet;
use crate::model::OutputRecord;
use crate::pipeline::Accumulator;

pub const BASE_COLUMNS: [&str; 5] = ["position_code", "position_label", "year", "value_kind", "amount"];
pub const CONTEXT_COLUMNS: [&str; 3] = ["budget_unit", "product_area", "product_group"];

fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn quoted_opt(s: Option<&str>) -> String {
    s.map(quoted).unwrap_or_default()
}

/// Write a header row and one row per record.
pub fn write_records<W: Write>(
    writer: W,
    records: &[OutputRecord],
    with_context: bool,
) -> Result<(), HaushaltError> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .from_writer(writer);

    let mut header: Vec<String> = Vec::with_capacity(8);
    if with_context {
        header.extend(CONTEXT_COLUMNS.iter().map(|c| quoted(c)));
    }
    header.extend(BASE_COLUMNS.iter().map(|c| quoted(c)));
    wtr.write_record(&header)?;

    for r in records {
        let mut row: Vec<String> = Vec::with_capacity(header.len());
        if with_context {
            row.push(quoted_opt(r.context.budget_unit.as_deref()));
            row.push(quoted_opt(r.context.product_area.as_deref()));
            row.push(quoted_opt(r.context.product_group.as_deref()));
        }
        row.push(quoted(&r.position_code));
        row.push(quoted(&r.position_label));
        row.push(r.year.to_string());
        row.push(quoted(r.value_kind.as_str()));
        row.push(r.amount.to_string());
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write one CSV file per layout in the accumulator into `out_dir`.
///
/// Returns the written paths in layout order.
pub fn write_outputs(
    acc: &Accumulator,
    layouts: &LayoutSet,
    out_dir: &Path,
    with_context: bool,
) -> Result<Vec<PathBuf>, HaushaltError> {
    let mut written = Vec::new();

    for (tag, records) in acc.iter() {
        let profile = layouts
            .profile(tag)
            .ok_or_else(|| HaushaltError::LayoutInvalid(format!("no profile for layout {tag}")))?;
        let path = out_dir.join(&profile.output_file);
        let file = File::create(&path)?;
        write_records(file, records, with_context)?;
        tracing::info!(path = %path.display(), layout = %tag, records = records.len(), "output written");
        written.push(path);
    }

    Ok(written)
}
