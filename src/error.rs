use polars::prelude::PolarsError;

/// Errors surfaced by the exploration pipeline.
#[derive(thiserror::Error, Debug)]
pub enum ExploreError {
    /// The data source's type is not one the loader can parse.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// A requested column is absent from the table.
    #[error("Unknown field: '{0}' is not a column of the table")]
    UnknownField(String),

    /// An axis scale token other than linear, log2 or log10.
    #[error("Unknown scale kind: '{0}' (expected linear, log2 or log10)")]
    UnknownScaleKind(String),

    /// A grouping column that is absent or not categorical.
    #[error("Invalid group column: '{0}' is not a categorical column")]
    InvalidGroupColumn(String),

    /// The negative-log floor is undefined because no value is strictly positive.
    #[error("Cannot take a log transform: no strictly positive values")]
    EmptyPositiveDomain,

    /// The default field picker was given no candidates to choose from.
    #[error("No candidate columns to pick from")]
    EmptyCandidates,

    #[error("Invalid filter pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Invalid filter specification '{0}'")]
    InvalidFilterSpec(String),

    #[error("Unknown example dataset: '{0}'")]
    UnknownExample(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExploreError>;
