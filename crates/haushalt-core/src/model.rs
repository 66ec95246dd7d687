use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// The five report layouts produced by the accounting export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutTag {
    TotalResultBudget,
    TotalCashFlowBudget,
    PartialResultBudgets,
    PartialCashFlowBudgets,
    InvestmentOverview,
}

impl LayoutTag {
    pub const ALL: [LayoutTag; 5] = [
        LayoutTag::TotalResultBudget,
        LayoutTag::TotalCashFlowBudget,
        LayoutTag::PartialResultBudgets,
        LayoutTag::PartialCashFlowBudgets,
        LayoutTag::InvestmentOverview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutTag::TotalResultBudget => "total_result_budget",
            LayoutTag::TotalCashFlowBudget => "total_cash_flow_budget",
            LayoutTag::PartialResultBudgets => "partial_result_budgets",
            LayoutTag::PartialCashFlowBudgets => "partial_cash_flow_budgets",
            LayoutTag::InvestmentOverview => "investment_overview",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<LayoutTag> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        LayoutTag::ALL.into_iter().find(|t| t.as_str() == wanted)
    }

    /// The layout covering one budget unit of the same report, if this is a total layout.
    pub fn partial_counterpart(&self) -> Option<LayoutTag> {
        match self {
            LayoutTag::TotalResultBudget => Some(LayoutTag::PartialResultBudgets),
            LayoutTag::TotalCashFlowBudget => Some(LayoutTag::PartialCashFlowBudgets),
            _ => None,
        }
    }
}

impl fmt::Display for LayoutTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a figure for a given year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Actual,
    Planned,
    Forecast,
    Commitment,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Actual => "actual",
            ValueKind::Planned => "planned",
            ValueKind::Forecast => "forecast",
            ValueKind::Commitment => "commitment",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (year, value-kind) column slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot {
    pub year: i32,
    pub kind: ValueKind,
}

impl Slot {
    pub fn new(year: i32, kind: ValueKind) -> Slot {
        Slot { year, kind }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.year, self.kind)
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Marker printed in the sign column of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowSign {
    Plus,
    Minus,
    /// `=`: the row sums up the rows listed before it.
    Total,
}

impl RowSign {
    pub fn from_marker(s: &str) -> Option<RowSign> {
        match s.trim() {
            "+" => Some(RowSign::Plus),
            "-" | "–" | "—" => Some(RowSign::Minus),
            "=" => Some(RowSign::Total),
            _ => None,
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            RowSign::Plus => "+",
            RowSign::Minus => "-",
            RowSign::Total => "=",
        }
    }
}

pub type PositionId = usize;

/// A node in a report's position hierarchy.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetPosition {
    pub code: String,
    pub label: String,
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<PositionId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PositionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sign: Option<RowSign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_group: Option<String>,
    /// Project rows of an investment overview.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_group: bool,
    pub is_aggregate: bool,
    pub values: BTreeMap<Slot, Option<Decimal>>,
}

impl BudgetPosition {
    pub fn new(code: impl Into<String>, label: impl Into<String>, depth: usize) -> BudgetPosition {
        BudgetPosition {
            code: code.into(),
            label: label.into(),
            depth,
            parent: None,
            children: Vec::new(),
            sign: None,
            account_group: None,
            is_group: false,
            is_aggregate: false,
            values: BTreeMap::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn value(&self, slot: &Slot) -> Option<Decimal> {
        self.values.get(slot).copied().flatten()
    }
}

/// Budget context taken from the headings preceding a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableContext {
    pub budget_unit: Option<String>,
    pub product_area: Option<String>,
    pub product_group: Option<String>,
}

/// One classified table instance. Owns all of its positions.
#[derive(Debug, Clone, Serialize)]
pub struct ReportTable {
    pub layout: LayoutTag,
    pub context: TableContext,
    /// Value slots in header column order.
    pub slots: Vec<Slot>,
    pub positions: Vec<BudgetPosition>,
    pub roots: Vec<PositionId>,
}

impl ReportTable {
    pub fn new(layout: LayoutTag, slots: Vec<Slot>) -> ReportTable {
        ReportTable {
            layout,
            context: TableContext::default(),
            slots,
            positions: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn position(&self, id: PositionId) -> &BudgetPosition {
        &self.positions[id]
    }

    /// Positions in depth-first pre-order, i.e. document presentation order.
    pub fn depth_first(&self) -> Vec<PositionId> {
        let mut order = Vec::with_capacity(self.positions.len());
        let mut stack: Vec<PositionId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.positions[id].children.iter().rev().copied());
        }
        order
    }

    pub fn aggregate_count(&self) -> usize {
        self.positions.iter().filter(|p| p.is_aggregate).count()
    }
}

/// One exported row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
    pub position_code: String,
    pub position_label: String,
    pub year: i32,
    pub value_kind: ValueKind,
    pub amount: Decimal,
    #[serde(skip)]
    pub context: TableContext,
}
