//! Structured error types for bill rendering.
//!
//! Only two things can actually go wrong: a layout definition whose spans do
//! not add up (a construction-time defect, reported with coordinates), and a
//! failure while assembling or serializing the document. Missing field values,
//! logos and fonts are recovered where they happen and never reach this type.

use thiserror::Error;

/// Grid construction errors. Each variant names the row (and column where it
/// matters) so the offending layout definition can be found and fixed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// A row's spans (plus slots covered from rows above) do not add up to
    /// the grid's column count.
    #[error("row {row}: spans cover {actual} columns, grid has {expected}")]
    ColumnMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Two spans claim the same grid coordinate.
    #[error("row {row}, column {col}: slot claimed by more than one span")]
    SpanConflict { row: usize, col: usize },

    /// A placeholder slot that no span accounts for.
    #[error("row {row}, column {col}: placeholder is not covered by any span")]
    OrphanPlaceholder { row: usize, col: usize },

    /// A cell declared with a zero column or row span.
    #[error("row {row}, column {col}: span must be at least 1")]
    ZeroSpan { row: usize, col: usize },

    /// A row span reaching past the last row of the grid.
    #[error("row {row}, column {col}: row span of {span} runs past the end of the grid")]
    RowSpanOverflow { row: usize, col: usize, span: usize },

    /// A grid declared with no columns.
    #[error("grid must have at least one column")]
    NoColumns,
}

/// The unified error type returned by the public rendering API.
#[derive(Debug, Error)]
pub enum BolError {
    /// A layout definition violated the grid invariants.
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    /// JSON input (a bill or a layout config) failed to parse.
    #[error("failed to parse input: {source}{}", hint_suffix(.hint))]
    Parse {
        source: serde_json::Error,
        hint: String,
    },

    /// The layout configuration is unusable.
    #[error("config error: {0}")]
    Config(String),

    /// Document assembly or PDF serialization failed.
    #[error("render error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for BolError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the expected shape. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input, is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        BolError::Parse { source: e, hint }
    }
}
