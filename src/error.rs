//! Fatal error types for the fetch, merge and profile steps.
//!
//! Row-level problems that do not stop a run live in
//! [`crate::merge::quality::DataIssue`] instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`PipelineError`].
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A source file handed to the fetch step is absent and nothing was
    /// staged for it previously.
    #[error(
        "could not find {what} at '{}' and there is no existing '{}'",
        .given.display(),
        .staged.display()
    )]
    MissingSource {
        what: &'static str,
        given: PathBuf,
        staged: PathBuf,
    },

    /// A file the merge or profile step reads from a fixed path is absent.
    #[error("missing input: {what} not found at '{}'", .path.display())]
    MissingInput { what: &'static str, path: PathBuf },

    #[error("{}: required column '{column}' not found", .file.display())]
    MissingColumn { file: PathBuf, column: String },

    #[error("{}: worksheet '{sheet}' not found (available: {available})", .file.display())]
    SheetNotFound {
        file: PathBuf,
        sheet: String,
        available: String,
    },

    #[error("{} line {line}: YEAR value '{value}' is not an integer", .file.display())]
    InvalidYear {
        file: PathBuf,
        line: u64,
        value: String,
    },

    #[error(
        "{} line {line}: duplicate mortality record for {state} {year}",
        .file.display()
    )]
    DuplicateStateYear {
        file: PathBuf,
        line: u64,
        state: String,
        year: i32,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// `true` for both flavours of missing-input failure.
    pub fn is_missing_input(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingSource { .. } | PipelineError::MissingInput { .. }
        )
    }
}
