use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("species not found: {0}")]
    SpeciesNotFound(String),

    #[error("required field is empty: {0}")]
    MissingField(&'static str),

    #[error("invalid asset category: {0}")]
    #[diagnostic(help("expected one of: images, audio, maps"))]
    InvalidCategory(String),

    #[error("cannot read asset source {path}: {message}")]
    AssetSource { path: String, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => {
                CatalogError::ConstraintViolation(err.to_string())
            }
            _ => CatalogError::Database(err.to_string()),
        }
    }
}
