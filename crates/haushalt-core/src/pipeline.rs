//! Route every table of every document to its layout's record sequence.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::classify::{classify_in_context, Classification};
use crate::error::HaushaltError;
use crate::extraction::{Block, RawDocument, RawTable};
use crate::layouts::schema::LayoutSet;
use crate::model::{LayoutTag, OutputRecord, ReportTable, TableContext};
use crate::parsing::header::HeadingTracker;
use crate::parsing::is_blank_row;
use crate::tables::aggregate::{check_rollups, RollupMismatch};
use crate::tables::build_report;
use crate::tables::extract::is_project_row;
use crate::tables::melt::melt;

/// Output records per layout, appended in document and table order.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    outputs: BTreeMap<LayoutTag, Vec<OutputRecord>>,
}

impl Accumulator {
    pub fn new() -> Accumulator {
        Accumulator::default()
    }

    /// Append the records of one table. The layout gets an entry even if
    /// the table contributed no records.
    pub fn append(&mut self, layout: LayoutTag, records: Vec<OutputRecord>) {
        self.outputs.entry(layout).or_default().extend(records);
    }

    pub fn records(&self, layout: LayoutTag) -> &[OutputRecord] {
        self.outputs.get(&layout).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn layouts(&self) -> impl Iterator<Item = LayoutTag> + '_ {
        self.outputs.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LayoutTag, &[OutputRecord])> {
        self.outputs.iter().map(|(tag, records)| (*tag, records.as_slice()))
    }

    pub fn total_records(&self) -> usize {
        self.outputs.values().map(Vec::len).sum()
    }
}

/// A table that was left out of the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTable {
    pub document: String,
    /// 1-based position among the document's tables.
    pub table_index: usize,
    pub reason: String,
}

/// Counters and diagnostics of one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub documents: usize,
    pub tables_seen: usize,
    pub tables_converted: usize,
    pub skipped: Vec<SkippedTable>,
    pub rollup_mismatches: usize,
}

/// A successfully extracted table.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertedTable {
    pub table: ReportTable,
    pub rollup_mismatches: Vec<RollupMismatch>,
}

/// What happened to one table of a document.
#[derive(Debug)]
pub struct TableOutcome {
    pub table_index: usize,
    /// Header-less tables whose rows were appended to this one. They share
    /// its result.
    pub continuation_tables: usize,
    pub context: TableContext,
    pub result: Result<ConvertedTable, HaushaltError>,
}

/// An investment overview held back until it is clear whether the next
/// tables continue it.
struct PendingInvestment<'a> {
    table_index: usize,
    context: TableContext,
    classification: Classification<'a>,
    rows: Vec<Vec<String>>,
    continuation_tables: usize,
}

/// Classify and extract every table of a document, in order.
pub fn analyze_document(doc: &RawDocument, layouts: &LayoutSet) -> Vec<TableOutcome> {
    let mut headings = HeadingTracker::new();
    let mut outcomes = Vec::new();
    let mut pending: Option<PendingInvestment<'_>> = None;
    let mut table_index = 0;

    for block in &doc.blocks {
        let raw = match block {
            Block::Paragraph(text) => {
                headings.register(text);
                continue;
            }
            Block::Table(raw) => raw,
        };
        table_index += 1;
        let context = headings.context();

        match classify_in_context(raw, layouts, &context) {
            Ok(classification) => {
                if let Some(p) = pending.take() {
                    outcomes.push(finish_investment(p));
                }
                if classification.profile.project_rows {
                    pending = Some(PendingInvestment {
                        table_index,
                        context,
                        classification,
                        rows: raw.rows.clone(),
                        continuation_tables: 0,
                    });
                } else {
                    outcomes.push(convert(table_index, raw, &classification, context, 0));
                }
            }
            Err(e) => {
                if let Some(p) = pending.as_mut().filter(|_| starts_with_project_row(raw)) {
                    tracing::debug!(
                        document = %doc.name,
                        table = table_index,
                        continues = p.table_index,
                        "header-less table continues an investment overview"
                    );
                    p.rows.extend(raw.rows.iter().cloned());
                    p.continuation_tables += 1;
                    continue;
                }
                if let Some(p) = pending.take() {
                    outcomes.push(finish_investment(p));
                }
                outcomes.push(TableOutcome {
                    table_index,
                    continuation_tables: 0,
                    context,
                    result: Err(e),
                });
            }
        }
    }

    if let Some(p) = pending.take() {
        outcomes.push(finish_investment(p));
    }
    outcomes
}

fn finish_investment(p: PendingInvestment<'_>) -> TableOutcome {
    let raw = RawTable::new(p.rows);
    convert(
        p.table_index,
        &raw,
        &p.classification,
        p.context,
        p.continuation_tables,
    )
}

fn convert(
    table_index: usize,
    raw: &RawTable,
    classification: &Classification<'_>,
    context: TableContext,
    continuation_tables: usize,
) -> TableOutcome {
    let result = build_report(raw, classification, context.clone()).map(|table| {
        let rollup_mismatches = check_rollups(&table);
        ConvertedTable {
            table,
            rollup_mismatches,
        }
    });
    TableOutcome {
        table_index,
        continuation_tables,
        context,
        result,
    }
}

fn starts_with_project_row(raw: &RawTable) -> bool {
    raw.rows
        .iter()
        .find(|row| !is_blank_row(row))
        .is_some_and(|row| is_project_row(row))
}

/// Run one document through the pipeline, appending its records to `acc`.
///
/// Table-local errors become skipped tables; any other error is returned.
pub fn process_document(
    doc: &RawDocument,
    layouts: &LayoutSet,
    acc: &mut Accumulator,
    report: &mut RunReport,
) -> Result<(), HaushaltError> {
    let converted_before = report.tables_converted;
    let skipped_before = report.skipped.len();
    report.documents += 1;

    for outcome in analyze_document(doc, layouts) {
        report.tables_seen += 1 + outcome.continuation_tables;
        match outcome.result {
            Ok(converted) => {
                report.tables_converted += 1;
                report.rollup_mismatches += converted.rollup_mismatches.len();

                let table = &converted.table;
                for m in &converted.rollup_mismatches {
                    tracing::warn!(
                        document = %doc.name,
                        table = outcome.table_index,
                        code = %m.code,
                        slot = %m.slot,
                        printed = %m.printed,
                        children_sum = %m.children_sum,
                        "aggregate does not match the sum of its rows"
                    );
                }
                let records = melt(table);
                tracing::debug!(
                    document = %doc.name,
                    table = outcome.table_index,
                    layout = %table.layout,
                    positions = table.positions.len(),
                    aggregates = table.aggregate_count(),
                    records = records.len(),
                    "table converted"
                );
                acc.append(table.layout, records);
            }
            Err(e) if !e.is_table_local() => return Err(e),
            Err(e) => {
                tracing::warn!(
                    document = %doc.name,
                    table = outcome.table_index,
                    continuation_tables = outcome.continuation_tables,
                    error = %e,
                    "table skipped"
                );
                report.skipped.push(SkippedTable {
                    document: doc.name.clone(),
                    table_index: outcome.table_index,
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        document = %doc.name,
        converted = report.tables_converted - converted_before,
        skipped = report.skipped.len() - skipped_before,
        "document processed"
    );
    Ok(())
}

/// Run all documents in input order.
///
/// Fails with `NoClassifiableTables` if not a single table was converted;
/// otherwise skipped tables are only listed in the report.
pub fn convert_documents(
    docs: &[RawDocument],
    layouts: &LayoutSet,
) -> Result<(Accumulator, RunReport), HaushaltError> {
    let mut acc = Accumulator::new();
    let mut report = RunReport::default();

    for doc in docs {
        process_document(doc, layouts, &mut acc, &mut report)?;
    }

    if report.tables_converted == 0 {
        return Err(HaushaltError::NoClassifiableTables {
            tables: report.tables_seen,
        });
    }

    tracing::info!(
        documents = report.documents,
        tables = report.tables_seen,
        converted = report.tables_converted,
        skipped = report.skipped.len(),
        records = acc.total_records(),
        "run finished"
    );
    Ok((acc, report))
}
