//! Model error types.

use std::path::PathBuf;

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read taxonomy file {path}: {source}")]
    TaxonomyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid taxonomy: {0}")]
    InvalidTaxonomy(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
