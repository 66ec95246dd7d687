pub mod header;
pub mod values;

/// Lowercase and collapse all whitespace (including line breaks inside
/// cells) to single spaces.
pub fn normalize_header_text(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// True if every cell of the row is blank.
pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}
