//! Target-table seam: batched writes with an unprocessed residue.
//!
//! The table service accepts at most [`MAX_BATCH_ITEMS`] records per
//! request and may accept only part of a batch under throttling; the
//! rest comes back as `unprocessed` and is the caller's to retry.
//! Transport failures are errors; throttling is not.

use crate::error::TableError;
use async_trait::async_trait;
use model::value::Record;

pub mod jsonl;
pub mod memory;
pub mod null;

pub use jsonl::JsonlTable;
pub use memory::MemoryTable;
pub use null::NullTable;

/// Upper bound on records per batched write request.
pub const MAX_BATCH_ITEMS: usize = 25;

/// Outcome of one batched write RPC.
#[derive(Debug, Default)]
pub struct BatchWriteOutcome {
    /// Records the service did not accept. Empty means the whole batch
    /// landed.
    pub unprocessed: Vec<Record>,
}

#[async_trait]
pub trait TableClient: Send + Sync {
    async fn batch_write(
        &self,
        table: &str,
        items: Vec<Record>,
    ) -> Result<BatchWriteOutcome, TableError>;
}
