use connectors::error::{StorageError, TableError};
use engine_core::backoff::MaxBackoffReached;
use model::error::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreflightError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read source object: {0}")]
    Source(#[from] StorageError),

    #[error("Failed to parse delimited record: {0}")]
    Parse(#[from] csv::Error),

    #[error("Preflight task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read source object: {0}")]
    Source(#[from] StorageError),

    #[error("Failed to parse delimited record: {0}")]
    Parse(#[from] csv::Error),

    #[error("Record has {got} fields, expected {want}")]
    FieldCount { want: usize, got: usize },

    #[error("Batch write failed: {0}")]
    Write(#[from] WriteError),

    #[error("Import cancelled before completion")]
    Cancelled,

    #[error("Worker task failed: {0}")]
    Task(String),
}

/// Failure of one batch-write, after local retry handling.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    BackoffExhausted(#[from] MaxBackoffReached),
}
