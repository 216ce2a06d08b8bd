use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Copy of {src} to {dst} could not be verified (expected {expected} bytes, found {found})")]
    CopyVerification {
        src: PathBuf,
        dst: PathBuf,
        expected: u64,
        found: u64,
    },
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;
