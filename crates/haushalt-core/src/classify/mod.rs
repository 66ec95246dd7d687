use crate::error::HaushaltError;
use crate::extraction::RawTable;
use crate::layouts::schema::{Fingerprint, LayoutProfile, LayoutSet};
use crate::model::TableContext;
use crate::parsing::header::{parse_columns, ColumnMap};
use crate::parsing::normalize_header_text;

/// A table matched to a layout profile, with its columns resolved.
#[derive(Debug, Clone)]
pub struct Classification<'a> {
    pub profile: &'a LayoutProfile,
    pub columns: ColumnMap,
}

/// Determine the layout of a table from its first header row and its shape.
///
/// Profiles are tried in their configured order; the first one whose
/// fingerprint matches and whose header yields value columns wins.
pub fn classify<'a>(
    table: &RawTable,
    layouts: &'a LayoutSet,
) -> Result<Classification<'a>, HaushaltError> {
    let header = table
        .rows
        .first()
        .ok_or_else(|| HaushaltError::UnrecognizedLayout("table has no rows".into()))?;
    let header_text = normalize_header_text(&header.join(" "));
    let columns = table.column_count();

    let mut last_error = None;
    for profile in &layouts.layouts {
        if !fingerprint_matches(&profile.fingerprint, &header_text, columns) {
            continue;
        }
        match parse_columns(header, profile) {
            Ok(map) => {
                tracing::debug!(layout = %profile.layout, columns, "table classified");
                return Ok(Classification {
                    profile,
                    columns: map,
                });
            }
            Err(e) => {
                tracing::debug!(layout = %profile.layout, error = %e, "fingerprint matched but header did not");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        HaushaltError::UnrecognizedLayout(format!(
            "{} column(s), header '{}'",
            columns,
            abbreviate(&header_text, 80)
        ))
    }))
}

/// Classify, then move a total layout to its partial counterpart when the
/// table sits below a budget unit heading.
pub fn classify_in_context<'a>(
    table: &RawTable,
    layouts: &'a LayoutSet,
    context: &TableContext,
) -> Result<Classification<'a>, HaushaltError> {
    let classification = classify(table, layouts)?;
    if context.budget_unit.is_none() {
        return Ok(classification);
    }

    let Some(partial) = classification
        .profile
        .layout
        .partial_counterpart()
        .and_then(|tag| layouts.profile(tag))
    else {
        return Ok(classification);
    };

    match parse_columns(&table.rows[0], partial) {
        Ok(columns) => {
            tracing::debug!(
                from = %classification.profile.layout,
                to = %partial.layout,
                budget_unit = context.budget_unit.as_deref().unwrap_or_default(),
                "table below a budget unit heading, using partial layout"
            );
            Ok(Classification {
                profile: partial,
                columns,
            })
        }
        Err(_) => Ok(classification),
    }
}

fn fingerprint_matches(fp: &Fingerprint, header_text: &str, columns: usize) -> bool {
    if columns < fp.min_columns || columns > fp.max_columns {
        return false;
    }
    let contains = |kw: &String| header_text.contains(&normalize_header_text(kw));
    fp.required_all.iter().all(contains)
        && (fp.required_any.is_empty() || fp.required_any.iter().any(contains))
        && !fp.forbidden.iter().any(contains)
}

fn abbreviate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push('…');
    out
}
