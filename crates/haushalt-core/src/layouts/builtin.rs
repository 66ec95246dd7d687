use crate::error::HaushaltError;
use crate::layouts::schema::LayoutSet;
use crate::layouts::validate_layout_set;

const BUDGET_LAYOUTS_JSON: &str = include_str!("../../../../layouts/budget-layouts.json");

/// Load the layout profiles compiled into the binary.
pub fn load_builtin() -> Result<LayoutSet, HaushaltError> {
    let set: LayoutSet = serde_json::from_str(BUDGET_LAYOUTS_JSON)?;
    validate_layout_set(&set)?;
    Ok(set)
}
