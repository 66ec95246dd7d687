use crate::error::HaushaltError;
use crate::layouts::schema::LayoutProfile;
use crate::model::{Slot, TableContext};
use crate::parsing::normalize_header_text;
use std::collections::HashSet;

/// Resolved column positions of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub code: usize,
    pub sign: usize,
    pub label: usize,
    pub account_group: Option<usize>,
    /// Value columns in header order.
    pub values: Vec<(usize, Slot)>,
}

impl ColumnMap {
    pub fn slots(&self) -> Vec<Slot> {
        self.values.iter().map(|(_, slot)| *slot).collect()
    }

    fn is_meta(&self, col: usize) -> bool {
        col == self.code || col == self.sign || col == self.label || Some(col) == self.account_group
    }
}

/// Resolve meta and value columns from the first header row.
///
/// Fails with `UnrecognizedLayout` if the header has no value column and
/// with `Structure` if two columns claim the same (year, kind) slot.
pub fn parse_columns(header: &[String], profile: &LayoutProfile) -> Result<ColumnMap, HaushaltError> {
    let cols = &profile.columns;
    let mut map = ColumnMap {
        code: cols.code,
        sign: cols.sign,
        label: cols.label,
        account_group: None,
        values: Vec::new(),
    };

    if let Some(ag) = &cols.account_group {
        let present = header
            .get(ag.index)
            .map(|h| normalize_header_text(h) == normalize_header_text(&ag.header))
            .unwrap_or(false);
        if present {
            let shift = |c: usize| if c >= ag.index { c + 1 } else { c };
            map.code = shift(cols.code);
            map.sign = shift(cols.sign);
            map.label = shift(cols.label);
            map.account_group = Some(ag.index);
        }
    }

    let mut seen = HashSet::new();
    for (col, cell) in header.iter().enumerate() {
        if map.is_meta(col) {
            continue;
        }
        let Some(slot) = parse_value_header(cell, profile) else {
            continue;
        };
        if !seen.insert(slot) {
            return Err(HaushaltError::Structure(format!(
                "value column {} repeats {} {}",
                col + 1,
                slot.kind,
                slot.year
            )));
        }
        map.values.push((col, slot));
    }

    if map.values.is_empty() {
        return Err(HaushaltError::UnrecognizedLayout(format!(
            "no '<kind> <year> {}' value columns in the header of a {} table",
            profile.value_header.currency, profile.layout
        )));
    }

    Ok(map)
}

/// Read a value column header like `Ansatz 2017 EUR`.
///
/// Returns None for cells that are not value headers: wrong token count,
/// other currency, unknown kind word or a non-year middle token.
pub fn parse_value_header(cell: &str, profile: &LayoutProfile) -> Option<Slot> {
    let parts: Vec<&str> = cell.split_whitespace().collect();
    let [kind, year, currency] = parts.as_slice() else {
        return None;
    };
    if !currency.eq_ignore_ascii_case(&profile.value_header.currency) {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let kind = profile.value_header.kinds.get(&kind.to_lowercase()).copied();
    if kind.is_none() {
        tracing::debug!(header = %cell, "ignoring value column with unknown kind");
    }
    Some(Slot::new(year, kind?))
}

/// Tracks budget unit, product area and product group from the headings
/// that precede the tables of a document.
///
/// The headings only carry ids and titles; their meaning follows from their
/// order: `THH<id>` opens a budget unit, a two-digit id directly below it a
/// product area, a four-digit id below that a product group.
#[derive(Debug, Clone, Default)]
pub struct HeadingTracker {
    budget_unit: Option<String>,
    product_area: Option<String>,
    product_group: Option<String>,
}

impl HeadingTracker {
    pub fn new() -> HeadingTracker {
        HeadingTracker::default()
    }

    pub fn reset(&mut self) {
        *self = HeadingTracker::default();
    }

    pub fn register(&mut self, text: &str) {
        let mut tokens = text.split_whitespace();
        let Some(first) = tokens.next() else {
            return;
        };

        if let Some(rest) = first.strip_prefix("THH") {
            // "THH1 Title" or "THH 1 Title"
            let id = if rest.is_empty() { tokens.next() } else { Some(rest) };
            if let Some(id) = id {
                if tokens.next().is_some() {
                    self.budget_unit = Some(id.to_string());
                    self.product_area = None;
                    self.product_group = None;
                }
            }
            return;
        }

        if tokens.next().is_none() || !first.chars().all(|c| c.is_ascii_digit()) {
            return;
        }

        if self.budget_unit.is_some() && self.product_area.is_none() && first.len() == 2 {
            self.product_area = Some(first.to_string());
            self.product_group = None;
        } else if self.product_area.is_some() && self.product_group.is_none() && first.len() == 4 {
            self.product_group = Some(first.to_string());
        }
    }

    pub fn context(&self) -> TableContext {
        TableContext {
            budget_unit: self.budget_unit.clone(),
            product_area: self.product_area.clone(),
            product_group: self.product_group.clone(),
        }
    }
}
