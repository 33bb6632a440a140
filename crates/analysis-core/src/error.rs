use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Missing date column '{column}' in {origin}")]
    MissingDateColumn { column: String, origin: String },

    #[error("Missing column '{column}' ({context})")]
    MissingColumn { column: String, context: String },

    #[error("Unparseable date in column '{column}' at row {row}: {value:?}")]
    DateParse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Duplicate date key {date}")]
    DuplicateDate { date: NaiveDate },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Alignment error: {0}")]
    AlignmentError(String),

    #[error("Insufficient data for {operation}: {valid_rows} valid rows, need at least {required}")]
    InsufficientData {
        operation: String,
        valid_rows: usize,
        required: usize,
    },

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Empty vocabulary: no terms left from {documents} documents with min_df={min_df}, max_df={max_df}")]
    EmptyVocabulary {
        documents: usize,
        min_df: String,
        max_df: String,
    },

    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("I/O error: {0}")]
    Io(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
