use crate::model::{BudgetPosition, OutputRecord, ReportTable};

/// Turn a report table into one record per non-aggregate position and
/// filled value slot.
///
/// Positions come out in document order, slots in (year, kind) order.
/// Blank slots produce no record.
pub fn melt(table: &ReportTable) -> Vec<OutputRecord> {
    let mut records = Vec::new();

    for id in table.depth_first() {
        let position = table.position(id);
        if position.is_aggregate {
            continue;
        }
        let label = qualified_label(table, position);
        for (slot, amount) in &position.values {
            let Some(amount) = amount else {
                continue;
            };
            records.push(OutputRecord {
                position_code: position.code.clone(),
                position_label: label.clone(),
                year: slot.year,
                value_kind: slot.kind,
                amount: *amount,
                context: table.context.clone(),
            });
        }
    }

    records
}

/// `"<parent label>: <label>"`, so detail rows like "vom Land" stay readable
/// without their parent.
pub fn qualified_label(table: &ReportTable, position: &BudgetPosition) -> String {
    match position.parent.map(|id| table.position(id)) {
        Some(parent) if !parent.label.is_empty() && !position.label.is_empty() => {
            format!("{}: {}", parent.label, position.label)
        }
        Some(parent) if position.label.is_empty() => parent.label.clone(),
        _ => position.label.clone(),
    }
}
