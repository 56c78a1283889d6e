use engine_processing::error::{PreflightError, WorkerError};
use model::error::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read input file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Preflight failed: {0}")]
    Preflight(#[from] PreflightError),

    #[error("Import failed: {0}")]
    Import(#[from] WorkerError),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
