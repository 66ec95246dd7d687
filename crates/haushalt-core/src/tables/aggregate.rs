use rust_decimal::Decimal;
use serde::Serialize;

use crate::layouts::schema::AggregateMarkers;
use crate::model::{BudgetPosition, ReportTable, RowSign, Slot};

/// An aggregate whose printed value differs from the sum of its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollupMismatch {
    pub code: String,
    pub slot: Slot,
    pub printed: Decimal,
    pub children_sum: Decimal,
}

/// Flag every position whose value is derived from other rows.
///
/// A position is an aggregate if its sign marker is a roll-up marker, if it
/// is a project group, or if it has children and the layout treats parents
/// as roll-ups or its label carries a summary word.
pub fn mark_aggregates(table: &mut ReportTable, markers: &AggregateMarkers) {
    let label_markers: Vec<String> = markers
        .label_markers
        .iter()
        .map(|m| m.to_lowercase())
        .collect();

    for position in &mut table.positions {
        position.is_aggregate = is_aggregate(position, markers, &label_markers);
    }
}

/// Leaves are never aggregates, except rows whose sign is a roll-up marker:
/// a `=` leaf totals its preceding siblings and is flagged like a parent.
fn is_aggregate(position: &BudgetPosition, markers: &AggregateMarkers, label_markers: &[String]) -> bool {
    if position.is_group {
        return true;
    }
    if let Some(sign) = position.sign {
        if markers.rollup_signs.iter().any(|m| m == sign.marker()) {
            return true;
        }
    }
    if position.is_leaf() {
        return false;
    }
    if markers.parents_are_rollups {
        return true;
    }
    let label = position.label.to_lowercase();
    label_markers
        .iter()
        .any(|m| label.split_whitespace().any(|word| word.starts_with(m.as_str())))
}

/// Compare each parent's printed values with the sum of its children.
///
/// Sibling total rows (`=`) are left out of the sum. Slots where the parent
/// or all children are blank are not checked, and so are slots whose
/// children sum past the `Decimal` range.
pub fn check_rollups(table: &ReportTable) -> Vec<RollupMismatch> {
    let mut mismatches = Vec::new();

    for parent in table.positions.iter().filter(|p| !p.is_leaf() && p.is_aggregate) {
        let children: Vec<&BudgetPosition> = parent
            .children
            .iter()
            .map(|id| table.position(*id))
            .filter(|c| c.sign != Some(RowSign::Total))
            .collect();

        for (slot, printed) in &parent.values {
            let Some(printed) = printed else {
                continue;
            };
            let values: Vec<Decimal> = children.iter().filter_map(|c| c.value(slot)).collect();
            if values.is_empty() {
                continue;
            }
            let Some(children_sum) = values
                .into_iter()
                .try_fold(Decimal::ZERO, |sum, v| sum.checked_add(v))
            else {
                tracing::warn!(
                    code = %parent.code,
                    slot = %slot,
                    "sum of child rows overflows, roll-up not checked"
                );
                continue;
            };
            if children_sum != *printed {
                mismatches.push(RollupMismatch {
                    code: parent.code.clone(),
                    slot: *slot,
                    printed: *printed,
                    children_sum,
                });
            }
        }
    }

    mismatches
}
