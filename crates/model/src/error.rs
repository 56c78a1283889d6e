use thiserror::Error;

/// Raised before any I/O when a request is missing a required
/// identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Source region is required")]
    MissingSourceRegion,

    #[error("Source bucket is required")]
    MissingSourceBucket,

    #[error("Source key is required")]
    MissingSourceKey,

    #[error("Target region is required")]
    MissingTargetRegion,

    #[error("Target table name is required")]
    MissingTargetTable,
}
