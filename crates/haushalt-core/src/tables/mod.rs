pub mod aggregate;
pub mod extract;
pub mod melt;

use crate::classify::Classification;
use crate::error::HaushaltError;
use crate::extraction::RawTable;
use crate::model::{ReportTable, TableContext};

/// Extract a classified table, attach its heading context and flag its
/// aggregates.
pub fn build_report(
    raw: &RawTable,
    classification: &Classification<'_>,
    context: TableContext,
) -> Result<ReportTable, HaushaltError> {
    let mut table = extract::extract(raw, classification)?;
    table.context = context;
    aggregate::mark_aggregates(&mut table, &classification.profile.aggregates);
    Ok(table)
}
