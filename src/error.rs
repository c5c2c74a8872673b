use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No CSV files found in the directory: {}", .0.display())]
    NoCheckpointFiles(PathBuf),
    #[error("No non-empty or non-all-null CSV files to combine in: {}", .0.display())]
    NoUsableData(PathBuf),
    #[error("Column `{0}` is missing from the combined table.")]
    MissingColumn(String),

    #[error("Server answered {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Invalid API base url: {0}")]
    InvalidBaseUrl(String),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Csv Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
}
