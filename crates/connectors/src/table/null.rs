//! Discarding sink for dry runs: counts what would have been written.

use crate::error::TableError;
use crate::table::{BatchWriteOutcome, TableClient, MAX_BATCH_ITEMS};
use async_trait::async_trait;
use model::value::Record;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct NullTable {
    written: AtomicU64,
}

impl NullTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TableClient for NullTable {
    async fn batch_write(
        &self,
        _table: &str,
        items: Vec<Record>,
    ) -> Result<BatchWriteOutcome, TableError> {
        if items.len() > MAX_BATCH_ITEMS {
            return Err(TableError::Rejected(format!(
                "batch of {} exceeds the {MAX_BATCH_ITEMS}-item limit",
                items.len()
            )));
        }
        self.written.fetch_add(items.len() as u64, Ordering::Relaxed);
        Ok(BatchWriteOutcome::default())
    }
}
