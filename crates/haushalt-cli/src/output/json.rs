use haushalt_core::error::HaushaltError;
use haushalt_core::model::{ReportTable, TableContext};
use haushalt_core::pipeline::TableOutcome;
use haushalt_core::tables::aggregate::RollupMismatch;
use serde::Serialize;

#[derive(Serialize)]
struct DocumentView<'a> {
    document: &'a str,
    tables: Vec<TableView<'a>>,
}

#[derive(Serialize)]
struct TableView<'a> {
    table_index: usize,
    context: &'a TableContext,
    #[serde(flatten)]
    status: Status<'a>,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Status<'a> {
    Converted {
        continuation_tables: usize,
        rollup_mismatches: &'a [RollupMismatch],
        table: &'a ReportTable,
    },
    Skipped {
        reason: String,
    },
}

pub fn print(document: &str, outcomes: &[TableOutcome]) -> Result<(), HaushaltError> {
    let view = DocumentView {
        document,
        tables: outcomes
            .iter()
            .map(|o| TableView {
                table_index: o.table_index,
                context: &o.context,
                status: match &o.result {
                    Ok(converted) => Status::Converted {
                        continuation_tables: o.continuation_tables,
                        rollup_mismatches: &converted.rollup_mismatches,
                        table: &converted.table,
                    },
                    Err(e) => Status::Skipped {
                        reason: e.to_string(),
                    },
                },
            })
            .collect(),
    };
    let json = serde_json::to_string_pretty(&view)?;
    println!("{json}");
    Ok(())
}
