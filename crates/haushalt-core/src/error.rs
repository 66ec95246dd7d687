use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum HaushaltError {
    #[error("cannot parse '{text}' as an amount")]
    ValueFormat { text: String },

    #[error("unrecognized table layout: {0}")]
    UnrecognizedLayout(String),

    #[error("malformed table structure: {0}")]
    Structure(String),

    #[error("none of the {tables} table(s) in the input could be converted. Is this an export of a supported tool version?")]
    NoClassifiableTables { tables: usize },

    #[error("failed to load document {path}: {reason}")]
    Document { path: PathBuf, reason: String },

    #[error("failed to load layout profiles from {path}: {reason}")]
    LayoutLoad { path: PathBuf, reason: String },

    #[error("invalid layout profile: {0}")]
    LayoutInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl HaushaltError {
    /// True for errors that abort a single table rather than the whole run.
    pub fn is_table_local(&self) -> bool {
        matches!(
            self,
            HaushaltError::ValueFormat { .. }
                | HaushaltError::UnrecognizedLayout(_)
                | HaushaltError::Structure(_)
        )
    }
}
