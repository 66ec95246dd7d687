use haushalt_core::model::{ReportTable, TableContext};
use haushalt_core::pipeline::TableOutcome;

pub fn print(document: &str, outcomes: &[TableOutcome]) {
    println!("=== {} ===\n", document);
    if outcomes.is_empty() {
        println!("  (no tables)");
        return;
    }

    for outcome in outcomes {
        let context = format_context(&outcome.context);
        match &outcome.result {
            Ok(converted) => {
                let table = &converted.table;
                print!("Table {}: {}", outcome.table_index, table.layout);
                if outcome.continuation_tables > 0 {
                    print!(" (+{} continuation table(s))", outcome.continuation_tables);
                }
                println!("{context}");
                let slots: Vec<String> = table.slots.iter().map(|s| s.to_string()).collect();
                println!("  slots: {}", slots.join(", "));
                print_tree(table);
                for m in &converted.rollup_mismatches {
                    println!(
                        "  ! {} {}: printed {}, rows sum to {}",
                        m.code, m.slot, m.printed, m.children_sum
                    );
                }
            }
            Err(e) => {
                print!("Table {}: skipped", outcome.table_index);
                if outcome.continuation_tables > 0 {
                    print!(" (+{} continuation table(s))", outcome.continuation_tables);
                }
                println!("{context}");
                println!("  {e}");
            }
        }
        println!();
    }
}

fn format_context(ctx: &TableContext) -> String {
    let parts: Vec<String> = [
        ("THH", &ctx.budget_unit),
        ("PB", &ctx.product_area),
        ("PG", &ctx.product_group),
    ]
    .iter()
    .filter_map(|(name, value)| value.as_deref().map(|v| format!("{name} {v}")))
    .collect();

    if parts.is_empty() {
        String::new()
    } else {
        format!(" [{}]", parts.join(", "))
    }
}

/// One line per position, indented by depth. Aggregates are marked with `Σ`.
fn print_tree(table: &ReportTable) {
    let max_code = table
        .positions
        .iter()
        .map(|p| p.code.chars().count() + 2 * p.depth)
        .max()
        .unwrap_or(4);

    for id in table.depth_first() {
        let p = table.position(id);
        let code = format!("{}{}", "  ".repeat(p.depth), p.code);
        let marker = if p.is_aggregate { "Σ" } else { " " };
        let sign = p.sign.map(|s| s.marker()).unwrap_or(" ");
        let values: Vec<String> = table
            .slots
            .iter()
            .map(|slot| match p.value(slot) {
                Some(v) => v.to_string(),
                None => "-".into(),
            })
            .collect();
        println!(
            "  {} {:<width$} {} {}  [{}]",
            marker,
            code,
            sign,
            p.label,
            values.join(" | "),
            width = max_code
        );
    }
}
