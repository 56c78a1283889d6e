use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Invalid byte range {from}..{to}")]
    InvalidRange { from: i64, to: i64 },

    #[error("Object store request failed: {0}")]
    Backend(String),

    #[error("I/O error reading object: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum TableError {
    /// The service rejected the request outright; not retryable at the
    /// batch-write layer.
    #[error("Batch write rejected by table service: {0}")]
    Rejected(String),

    #[error("Transport failure during batch write: {0}")]
    Transport(String),

    #[error("Failed to encode record for sink: {0}")]
    Encode(String),

    #[error("I/O error writing to sink: {0}")]
    Io(#[from] std::io::Error),
}
