use haushalt_core::error::HaushaltError;
use haushalt_core::layouts::builtin;
use haushalt_core::layouts::schema::{LayoutProfile, LayoutSet};
use haushalt_core::model::{LayoutTag, ValueKind};
use std::path::Path;

pub fn list() -> Result<(), HaushaltError> {
    let set = builtin::load_builtin()?;
    println!("{} (v{})\n", set.name, set.version);
    for profile in &set.layouts {
        println!("  {:<26} -> {}", profile.layout, profile.output_file);
        if let Some(ref desc) = profile.description {
            println!("  {:<26}    {}", "", desc);
        }
    }
    Ok(())
}

pub fn explain(layout: &str) -> Result<(), HaushaltError> {
    let tag = LayoutTag::from_str_loose(layout).ok_or_else(|| {
        let known: Vec<&str> = LayoutTag::ALL.iter().map(|t| t.as_str()).collect();
        HaushaltError::LayoutInvalid(format!(
            "unknown layout '{layout}' (known: {})",
            known.join(", ")
        ))
    })?;
    let set = builtin::load_builtin()?;
    let profile = set
        .profile(tag)
        .ok_or_else(|| HaushaltError::LayoutInvalid(format!("no built-in profile for {tag}")))?;

    print_profile(profile);
    Ok(())
}

fn print_profile(p: &LayoutProfile) {
    println!("{}\n", p.layout);
    if let Some(ref desc) = p.description {
        println!("{desc}\n");
    }

    let fp = &p.fingerprint;
    println!("Recognised when the first header row");
    println!("  has {} to {} columns", fp.min_columns, fp.max_columns);
    if !fp.required_all.is_empty() {
        println!("  contains all of: {}", fp.required_all.join(", "));
    }
    if !fp.required_any.is_empty() {
        println!("  contains one of: {}", fp.required_any.join(", "));
    }
    if !fp.forbidden.is_empty() {
        println!("  contains none of: {}", fp.forbidden.join(", "));
    }
    println!();

    println!("The first {} row(s) are header rows.", p.header_rows);
    let c = &p.columns;
    println!(
        "Columns: running number {}, sign {}, label {}",
        c.code + 1,
        c.sign + 1,
        c.label + 1
    );
    if let Some(ref ag) = c.account_group {
        println!(
            "  optional account group in column {} when its header reads '{}'",
            ag.index + 1,
            ag.header
        );
    }
    println!(
        "Value columns are headed '<kind> <year> {}' with kinds:",
        p.value_header.currency
    );
    for (word, kind) in &p.value_header.kinds {
        println!("  {:<28} -> {}", word, kind_text(*kind));
    }
    println!();

    let a = &p.aggregates;
    println!("Rows left out of the output as aggregates:");
    if !a.rollup_signs.is_empty() {
        println!("  rows signed {}", a.rollup_signs.join(" or "));
    }
    if a.parents_are_rollups {
        println!("  positions that have detail rows");
        if !a.label_markers.is_empty() {
            println!(
                "  (label markers {} have no effect while parents are roll-ups)",
                a.label_markers.join(", ")
            );
        }
    } else if !a.label_markers.is_empty() {
        println!(
            "  positions with detail rows whose label contains {}",
            a.label_markers.join(", ")
        );
    }
    if p.project_rows {
        println!("  project rows (single merged cell '<id>: <title>')");
    }
    if p.orient_by_sign {
        println!("\nAmounts of rows signed '-' are exported as negative numbers.");
    }
    println!("\nOutput file: {}", p.output_file);
}

fn kind_text(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Actual => "actual (Ergebnis/Ist)",
        ValueKind::Planned => "planned (Ansatz)",
        ValueKind::Forecast => "forecast (Planung)",
        ValueKind::Commitment => "commitment (Verpflichtungsermächtigung)",
    }
}

pub fn validate(file: &Path) -> Result<(), HaushaltError> {
    let set = haushalt_core::layouts::load_layout_set(file)?;

    println!("Layout set '{}' (v{}) is valid.", set.name, set.version);
    for profile in &set.layouts {
        println!("  {} -> {}", profile.layout, profile.output_file);
    }

    let warnings = coverage_warnings(&set);
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}

/// Non-fatal gaps: layouts without a profile are never recognised, and
/// label markers are dead while every parent counts as a roll-up.
fn coverage_warnings(set: &LayoutSet) -> Vec<String> {
    let missing = LayoutTag::ALL
        .iter()
        .filter(|tag| set.profile(**tag).is_none())
        .map(|tag| format!("no profile for layout '{tag}', its tables will be skipped"));
    let dead_markers = set
        .layouts
        .iter()
        .filter(|p| p.aggregates.parents_are_rollups && !p.aggregates.label_markers.is_empty())
        .map(|p| {
            format!(
                "layout '{}': label_markers have no effect while parents_are_rollups is true",
                p.layout
            )
        });
    missing.chain(dead_markers).collect()
}
