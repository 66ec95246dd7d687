pub mod convert;
pub mod inspect;
pub mod layouts;

use haushalt_core::error::HaushaltError;
use haushalt_core::layouts::builtin;
use haushalt_core::layouts::schema::LayoutSet;
use std::path::Path;

/// The custom layout file if one was given, otherwise the built-in set.
pub fn load_layouts(path: Option<&Path>) -> Result<LayoutSet, HaushaltError> {
    match path {
        Some(path) => haushalt_core::layouts::load_layout_set(path),
        None => builtin::load_builtin(),
    }
}
