//! Error taxonomy: ingestion, configuration, model fitting, user input.

use thiserror::Error;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Dataset download failed.
    #[error("failed to fetch dataset: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Dataset is not valid CSV.
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed.
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("dataset has no `{0}` column")]
    MissingColumn(String),

    /// Label outside {0, 1}. `row` is 1-based, header excluded.
    #[error("row {row}: label {value:?} is not 0 or 1")]
    InvalidLabel { row: usize, value: String },

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("model fit failed: {0}")]
    ModelFit(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// True when the error was caused by what the user typed rather than by the system.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}
