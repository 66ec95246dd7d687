//! Rebuild the position hierarchy of a classified table from its flat rows.
//!
//! Row order carries the structure: a row at depth `d` is a child of the
//! most recent row at depth `d - 1`, so the walker keeps one ancestor per
//! depth instead of parsing any nesting syntax.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::classify::Classification;
use crate::error::HaushaltError;
use crate::extraction::RawTable;
use crate::layouts::schema::LayoutProfile;
use crate::model::{BudgetPosition, PositionId, ReportTable, RowSign, Slot};
use crate::parsing::header::ColumnMap;
use crate::parsing::is_blank_row;
use crate::parsing::values::parse_amount;

/// Walk the body rows of `table` (everything after the layout's header rows)
/// into a `ReportTable`. Aggregates are not flagged yet.
pub fn extract(
    table: &RawTable,
    classification: &Classification<'_>,
) -> Result<ReportTable, HaushaltError> {
    let profile = classification.profile;
    let body = table.rows.get(profile.header_rows..).unwrap_or_default();

    let mut walker = Walker::new(profile, &classification.columns);
    for (offset, row) in body.iter().enumerate() {
        walker.row_number = profile.header_rows + offset + 1;
        if is_blank_row(row) {
            continue;
        }
        if profile.project_rows && is_project_row(row) {
            walker.project(&row[0])?;
        } else {
            walker.row(row)?;
        }
    }

    tracing::debug!(
        layout = %profile.layout,
        rows = body.len(),
        positions = walker.table.positions.len(),
        "table extracted"
    );
    Ok(walker.table)
}

/// A row made of a single merged cell: every cell repeats the same text.
pub fn is_project_row(row: &[String]) -> bool {
    match row.first() {
        Some(first) => row.len() > 1 && !first.trim().is_empty() && row.iter().all(|c| c == first),
        None => false,
    }
}

/// Split a project row `"<id>: <title>"`.
pub fn parse_project_row(text: &str) -> Option<(String, String)> {
    let (id, title) = text.split_once(':')?;
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    Some((id.to_string(), title.trim().to_string()))
}

/// The cells of one body row, read through the column map.
struct RowCells {
    code: String,
    sign: Option<RowSign>,
    account_group: Option<String>,
    label: String,
    values: Vec<(Slot, Option<Decimal>)>,
}

struct Walker<'a> {
    profile: &'a LayoutProfile,
    columns: &'a ColumnMap,
    table: ReportTable,
    /// `ancestors[d]` is the most recent position at depth `d`.
    ancestors: Vec<PositionId>,
    /// Last position with a printed code; detail rows hang below it.
    anchor: Option<PositionId>,
    /// Positions by depth and code, so a repeated code continues the earlier
    /// position wherever it reappears.
    by_code: HashMap<(usize, String), PositionId>,
    row_number: usize,
}

impl<'a> Walker<'a> {
    fn new(profile: &'a LayoutProfile, columns: &'a ColumnMap) -> Walker<'a> {
        Walker {
            profile,
            columns,
            table: ReportTable::new(profile.layout, columns.slots()),
            ancestors: Vec::new(),
            anchor: None,
            by_code: HashMap::new(),
            row_number: 0,
        }
    }

    fn structure_error(&self, reason: impl std::fmt::Display) -> HaushaltError {
        HaushaltError::Structure(format!("row {}: {}", self.row_number, reason))
    }

    fn project(&mut self, text: &str) -> Result<(), HaushaltError> {
        let (id, title) = parse_project_row(text)
            .ok_or_else(|| self.structure_error(format!("project row '{text}' is not '<id>: <title>'")))?;
        let mut node = BudgetPosition::new(id, title, 0);
        node.is_group = true;
        self.attach(node)?;
        self.anchor = None;
        Ok(())
    }

    fn row(&mut self, row: &[String]) -> Result<(), HaushaltError> {
        let cells = self.read_cells(row)?;
        if cells.code.is_empty() {
            self.detail_row(cells)
        } else {
            self.numbered_row(cells)
        }
    }

    fn numbered_row(&mut self, cells: RowCells) -> Result<(), HaushaltError> {
        let segments = cells.code.split('.').filter(|s| !s.is_empty()).count().max(1);
        let (depth, code) = if self.profile.project_rows {
            let project = self
                .ancestors
                .first()
                .map(|id| self.table.positions[*id].code.clone())
                .ok_or_else(|| self.structure_error("position before the first project row"))?;
            (segments, format!("{project}/{}", cells.code))
        } else {
            (segments - 1, cells.code.clone())
        };

        let sign = cells.sign;
        let node = self.node(code, depth, cells, sign);
        let id = self.attach(node)?;
        self.anchor = Some(id);
        Ok(())
    }

    fn detail_row(&mut self, cells: RowCells) -> Result<(), HaushaltError> {
        if let Some(sign) = cells.sign {
            return Err(self.structure_error(format!(
                "row without running number carries sign '{}'",
                sign.marker()
            )));
        }
        let parent_id = self
            .anchor
            .ok_or_else(|| self.structure_error("detail row before the first position"))?;

        let parent = &self.table.positions[parent_id];
        let suffix = match &cells.account_group {
            Some(group) => group.clone(),
            None => (parent.children.len() + 1).to_string(),
        };
        let code = format!("{}.{}", parent.code, suffix);
        let depth = parent.depth + 1;
        let inherited = self.effective_sign(parent_id);

        let node = self.node(code, depth, cells, inherited);
        self.attach(node)?;
        Ok(())
    }

    /// Build a position, orienting amounts by the row's effective sign.
    fn node(
        &self,
        code: String,
        depth: usize,
        cells: RowCells,
        orientation: Option<RowSign>,
    ) -> BudgetPosition {
        let mut node = BudgetPosition::new(code, cells.label, depth);
        node.sign = cells.sign;
        node.account_group = cells.account_group;
        let negate = self.profile.orient_by_sign && orientation == Some(RowSign::Minus);
        for (slot, value) in cells.values {
            let value = value.map(|v| if negate && v > Decimal::ZERO { -v } else { v });
            node.values.insert(slot, value);
        }
        node
    }

    /// Nearest sign marker on the position or its ancestors.
    fn effective_sign(&self, mut id: PositionId) -> Option<RowSign> {
        loop {
            let position = &self.table.positions[id];
            if position.sign.is_some() {
                return position.sign;
            }
            id = position.parent?;
        }
    }

    /// Link a position below the most recent position one level up, or merge
    /// it into an earlier position with the same code at the same depth.
    fn attach(&mut self, node: BudgetPosition) -> Result<PositionId, HaushaltError> {
        let depth = node.depth;
        if depth > self.ancestors.len() {
            return Err(self.structure_error(format!(
                "'{}' at depth {} has no enclosing position",
                node.code, depth
            )));
        }
        self.ancestors.truncate(depth);
        let parent = depth.checked_sub(1).map(|d| self.ancestors[d]);

        let key = (depth, node.code.clone());
        if let Some(&existing) = self.by_code.get(&key) {
            tracing::debug!(row = self.row_number, code = %node.code, "continuation row merged");
            self.merge(existing, node);
            self.ancestors.push(existing);
            return Ok(existing);
        }

        let id = self.table.positions.len();
        let mut node = node;
        node.parent = parent;
        self.table.positions.push(node);
        match parent {
            Some(p) => self.table.positions[p].children.push(id),
            None => self.table.roots.push(id),
        }
        self.by_code.insert(key, id);
        self.ancestors.push(id);
        Ok(id)
    }

    fn merge(&mut self, id: PositionId, row: BudgetPosition) {
        let row_number = self.row_number;
        let existing = &mut self.table.positions[id];

        if !row.label.is_empty() && !existing.label.ends_with(&row.label) {
            if existing.label.is_empty() {
                existing.label = row.label;
            } else {
                existing.label = format!("{} {}", existing.label, row.label);
            }
        }
        if existing.sign.is_none() {
            existing.sign = row.sign;
        }
        if existing.account_group.is_none() {
            existing.account_group = row.account_group;
        }

        for (slot, value) in row.values {
            let Some(value) = value else {
                existing.values.entry(slot).or_insert(None);
                continue;
            };
            match existing.values.get(&slot).copied().flatten() {
                None => {
                    existing.values.insert(slot, Some(value));
                }
                Some(previous) if previous != value => {
                    tracing::warn!(
                        row = row_number,
                        code = %existing.code,
                        slot = %slot,
                        %previous,
                        ignored = %value,
                        "continuation row disagrees with earlier value, keeping the first"
                    );
                }
                Some(_) => {}
            }
        }
    }

    fn read_cells(&self, row: &[String]) -> Result<RowCells, HaushaltError> {
        let cell = |col: usize| row.get(col).map(|s| s.trim()).unwrap_or("");

        let sign_text = cell(self.columns.sign);
        let sign = RowSign::from_marker(sign_text);
        if sign.is_none() && !sign_text.is_empty() {
            tracing::warn!(row = self.row_number, marker = sign_text, "unknown sign marker ignored");
        }

        let mut values = Vec::with_capacity(self.columns.values.len());
        for (col, slot) in &self.columns.values {
            let amount = parse_amount(cell(*col)).inspect_err(|_| {
                tracing::debug!(row = self.row_number, column = col + 1, "unparseable amount");
            })?;
            values.push((*slot, amount));
        }

        Ok(RowCells {
            code: cell(self.columns.code).to_string(),
            sign,
            account_group: self
                .columns
                .account_group
                .map(cell)
                .filter(|g| !g.is_empty())
                .map(str::to_string),
            label: cell(self.columns.label).to_string(),
            values,
        })
    }
}
