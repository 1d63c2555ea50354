// Error taxonomy for the analysis core and its data sources
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(
        "Input sequences differ in length: {texts} texts, {true_labels} true labels, {predictions} predictions"
    )]
    LengthMismatch {
        texts: usize,
        true_labels: usize,
        predictions: usize,
    },
    #[error("Expected {expected} confidence scores (one per text), got {actual}")]
    ConfidenceLengthMismatch { expected: usize, actual: usize },
    #[error("Table {path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },
    #[error("Invalid value {value:?} in column '{column}' at row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },
    #[error("Dataset error: {0}")]
    Dataset(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
