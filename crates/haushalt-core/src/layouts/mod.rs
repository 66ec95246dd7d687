pub mod builtin;
pub mod schema;

use crate::error::HaushaltError;
use schema::{LayoutProfile, LayoutSet};
use std::collections::HashSet;
use std::path::Path;

/// Load a layout profile set from a JSON file.
pub fn load_layout_set(path: &Path) -> Result<LayoutSet, HaushaltError> {
    let content = std::fs::read_to_string(path).map_err(|e| HaushaltError::LayoutLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_layout_set(&content, path)
}

/// Parse a layout profile set from a JSON string.
pub fn parse_layout_set(json: &str, source: &Path) -> Result<LayoutSet, HaushaltError> {
    let set: LayoutSet = serde_json::from_str(json).map_err(|e| HaushaltError::LayoutLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_layout_set(&set)?;
    Ok(set)
}

/// Parse a layout profile set from a JSON string (no file path context).
pub fn parse_layout_set_str(json: &str) -> Result<LayoutSet, HaushaltError> {
    let set: LayoutSet = serde_json::from_str(json).map_err(HaushaltError::Json)?;
    validate_layout_set(&set)?;
    Ok(set)
}

/// Validate that a layout profile set is well-formed.
pub fn validate_layout_set(set: &LayoutSet) -> Result<(), HaushaltError> {
    if set.layouts.is_empty() {
        return Err(HaushaltError::LayoutInvalid(
            "layouts must not be empty".into(),
        ));
    }

    let mut tags = HashSet::new();
    let mut files = HashSet::new();
    for profile in &set.layouts {
        if !tags.insert(profile.layout) {
            return Err(HaushaltError::LayoutInvalid(format!(
                "layout '{}' is defined more than once",
                profile.layout
            )));
        }
        if !files.insert(profile.output_file.as_str()) {
            return Err(HaushaltError::LayoutInvalid(format!(
                "output file '{}' is used by more than one layout",
                profile.output_file
            )));
        }
        validate_profile(profile)?;
    }

    Ok(())
}

fn validate_profile(profile: &LayoutProfile) -> Result<(), HaushaltError> {
    let invalid = |reason: &str| {
        HaushaltError::LayoutInvalid(format!("layout '{}': {}", profile.layout, reason))
    };

    if profile.output_file.trim().is_empty() {
        return Err(invalid("output_file must not be empty"));
    }
    if profile.header_rows == 0 {
        return Err(invalid("header_rows must be at least 1"));
    }

    let fp = &profile.fingerprint;
    if fp.min_columns > fp.max_columns {
        return Err(invalid("fingerprint min_columns exceeds max_columns"));
    }
    if fp.required_all.is_empty() && fp.required_any.is_empty() {
        return Err(invalid("fingerprint needs at least one required keyword"));
    }

    let cols = &profile.columns;
    if cols.code == cols.sign || cols.code == cols.label || cols.sign == cols.label {
        return Err(invalid("code, sign and label columns must be distinct"));
    }
    if let Some(ag) = &cols.account_group {
        if ag.header.trim().is_empty() {
            return Err(invalid("account_group header must not be empty"));
        }
    }

    if profile.value_header.kinds.is_empty() {
        return Err(invalid("value_header kinds must not be empty"));
    }
    if profile.value_header.currency.trim().is_empty() {
        return Err(invalid("value_header currency must not be empty"));
    }

    Ok(())
}
