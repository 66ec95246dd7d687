use crate::model::{LayoutTag, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A set of layout profiles describing how the export tool lays out its tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutSet {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    pub layouts: Vec<LayoutProfile>,
}

impl LayoutSet {
    pub fn profile(&self, layout: LayoutTag) -> Option<&LayoutProfile> {
        self.layouts.iter().find(|p| p.layout == layout)
    }
}

/// Everything needed to recognise and walk one report layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutProfile {
    pub layout: LayoutTag,
    #[serde(default)]
    pub description: Option<String>,
    /// File name of the CSV this layout is exported to.
    pub output_file: String,
    pub fingerprint: Fingerprint,
    /// Rows at the top of the table that belong to the header.
    #[serde(default = "default_header_rows")]
    pub header_rows: usize,
    pub columns: MetaColumns,
    pub value_header: ValueHeader,
    pub aggregates: AggregateMarkers,
    /// Turn positive amounts of `-` rows into negative ones.
    #[serde(default = "default_true")]
    pub orient_by_sign: bool,
    /// Single merged-cell rows introduce a project (investment overview).
    #[serde(default)]
    pub project_rows: bool,
}

/// Structural fingerprint of a layout's header.
///
/// Keywords are matched case-insensitively against the whitespace-normalised
/// text of the first header row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fingerprint {
    pub min_columns: usize,
    pub max_columns: usize,
    #[serde(default)]
    pub required_all: Vec<String>,
    #[serde(default)]
    pub required_any: Vec<String>,
    #[serde(default)]
    pub forbidden: Vec<String>,
}

/// Column positions of the non-value cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaColumns {
    pub code: usize,
    pub sign: usize,
    pub label: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_group: Option<AccountGroupColumn>,
}

/// Optional Kontogruppe column. When the header cell at `index` matches
/// `header`, the column is present and all meta columns at or after `index`
/// move one to the right.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountGroupColumn {
    pub index: usize,
    pub header: String,
}

/// How value column headers like `Ansatz 2017 EUR` are read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueHeader {
    pub currency: String,
    /// Lowercase header word -> value kind.
    pub kinds: BTreeMap<String, ValueKind>,
}

/// Markers identifying rows whose values are roll-ups of other rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateMarkers {
    /// Sign column markers declaring a sum of the preceding sibling rows.
    #[serde(default)]
    pub rollup_signs: Vec<String>,
    /// Positions split into detail rows report the sum of those rows.
    #[serde(default)]
    pub parents_are_rollups: bool,
    /// Label fragments marking a total. Only applied to positions with
    /// children, and only when `parents_are_rollups` is off.
    #[serde(default)]
    pub label_markers: Vec<String>,
}

fn default_header_rows() -> usize {
    2
}

fn default_true() -> bool {
    true
}
