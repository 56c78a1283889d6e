//! Records crossing the orchestrator boundary.
//!
//! These types serialize to the JSON document the orchestrator passes
//! between preflight invocations and import workers. Field names on the
//! wire are stable; a document round-trips through
//! serialize → deserialize without change.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Writer tasks per import worker when none is configured.
pub const DEFAULT_WORKER_CONCURRENCY: usize = 8;

/// Preflight per-invocation budget when none is configured, in seconds.
pub const DEFAULT_PHASE_DURATION_SECS: u64 = 300;

/// Smallest accepted preflight budget; anything lower falls back to the
/// default.
pub const MIN_PHASE_DURATION_SECS: u64 = 30;

/// The delimited file to import.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Source {
    pub region: String,
    pub bucket: String,
    pub key: String,
    #[serde(rename = "numFlds", default)]
    pub numeric_fields: Vec<String>,
    #[serde(rename = "boolFlds", default)]
    pub boolean_fields: Vec<String>,
    /// Single-byte field delimiter. Empty means comma.
    #[serde(rename = "delim", default)]
    pub delimiter: String,
}

impl Source {
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter.as_bytes().first().copied().unwrap_or(b',')
    }
}

/// The wide-column table written to.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Target {
    pub region: String,
    #[serde(rename = "table")]
    pub table_name: String,
}

/// Tuning knobs shared by both phases.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct Configuration {
    /// Writer tasks per import worker.
    #[serde(rename = "lambdaConcur", default)]
    pub worker_concurrency: usize,
    /// Preflight per-invocation wall-clock budget in seconds.
    #[serde(rename = "lambdaDurSecs", default)]
    pub phase_duration_secs: u64,
}

impl Configuration {
    /// Effective writer concurrency: below 1 falls back to the default.
    pub fn concurrency(&self) -> usize {
        if self.worker_concurrency < 1 {
            DEFAULT_WORKER_CONCURRENCY
        } else {
            self.worker_concurrency
        }
    }

    /// Effective preflight budget: below the minimum falls back to the
    /// default.
    pub fn phase_duration(&self) -> Duration {
        let secs = if self.phase_duration_secs < MIN_PHASE_DURATION_SECS {
            DEFAULT_PHASE_DURATION_SECS
        } else {
            self.phase_duration_secs
        };
        Duration::from_secs(secs)
    }
}

/// Source, configuration and target, immutable for the lifetime of one
/// import.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ImportRequest {
    #[serde(rename = "src")]
    pub source: Source,
    #[serde(rename = "cnf", default)]
    pub configuration: Configuration,
    #[serde(rename = "tgt")]
    pub target: Target,
}

impl ImportRequest {
    /// Rejects requests missing a required identifier, before any I/O.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.region.is_empty() {
            return Err(ConfigError::MissingSourceRegion);
        }
        if self.source.bucket.is_empty() {
            return Err(ConfigError::MissingSourceBucket);
        }
        if self.source.key.is_empty() {
            return Err(ConfigError::MissingSourceKey);
        }
        if self.target.region.is_empty() {
            return Err(ConfigError::MissingTargetRegion);
        }
        if self.target.table_name.is_empty() {
            return Err(ConfigError::MissingTargetTable);
        }
        Ok(())
    }
}

/// Where the preflight scan stands. The only state carried across
/// preflight re-invocations.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Preflight {
    /// Count of newlines fully observed so far (1-based).
    #[serde(rename = "l", default)]
    pub line: i64,
    /// Byte position of the start of the next unread line.
    #[serde(rename = "o", default)]
    pub offset: i64,
    /// Whether another preflight invocation is needed.
    #[serde(rename = "cnt", default)]
    pub should_continue: bool,
    /// Header row, once captured. Set by the first invocation that
    /// reads a record and preserved thereafter.
    #[serde(rename = "cols", default)]
    pub columns: Option<Vec<String>>,
}

/// A planned byte range `[from, to)` assigned to one worker.
pub type BatchRange = [i64; 2];

/// The full state document the orchestrator passes into and out of
/// preflight.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlanState {
    #[serde(flatten)]
    pub request: ImportRequest,
    #[serde(rename = "prefl", default)]
    pub preflight: Preflight,
    /// Record-aligned byte ranges, appended as the scan progresses.
    #[serde(default)]
    pub batches: Vec<BatchRange>,
}

/// Task document for a single import worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerInput {
    #[serde(flatten)]
    pub request: ImportRequest,
    /// Byte range `[from, to)` this worker owns.
    pub range: BatchRange,
    /// Header captured by preflight; the worker's range generally does
    /// not contain the header row.
    #[serde(rename = "cols")]
    pub columns: Vec<String>,
}

/// What a worker reports back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct WorkerOutput {
    #[serde(rename = "processedCount")]
    pub processed_count: i64,
    #[serde(rename = "durationMs")]
    pub duration_ms: i64,
}
