//! In-memory table for tests: records accepted rows, and can be
//! scripted to throttle or fail like the real service.

use crate::error::TableError;
use crate::table::{BatchWriteOutcome, TableClient, MAX_BATCH_ITEMS};
use async_trait::async_trait;
use model::value::Record;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Inner {
    rows: HashMap<String, Vec<Record>>,
    /// Size of every batch_write call, in arrival order.
    write_sizes: Vec<usize>,
    /// For each upcoming call, how many trailing items to report as
    /// unprocessed. Exhausted entries mean full acceptance.
    throttle_script: VecDeque<usize>,
    /// Error message for upcoming calls; `None` means healthy.
    fail_message: Option<String>,
}

#[derive(Clone, Default)]
pub struct MemoryTable {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the next calls: call N leaves `script[N]` trailing items
    /// unprocessed.
    pub fn throttle(&self, script: impl IntoIterator<Item = usize>) {
        self.inner
            .lock()
            .expect("table mutex poisoned")
            .throttle_script = script.into_iter().collect();
    }

    /// Makes every subsequent call fail with a transport error.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.inner.lock().expect("table mutex poisoned").fail_message = Some(message.into());
    }

    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.inner
            .lock()
            .expect("table mutex poisoned")
            .rows
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.inner
            .lock()
            .expect("table mutex poisoned")
            .rows
            .get(table)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn write_sizes(&self) -> Vec<usize> {
        self.inner
            .lock()
            .expect("table mutex poisoned")
            .write_sizes
            .clone()
    }
}

#[async_trait]
impl TableClient for MemoryTable {
    async fn batch_write(
        &self,
        table: &str,
        mut items: Vec<Record>,
    ) -> Result<BatchWriteOutcome, TableError> {
        let mut inner = self.inner.lock().expect("table mutex poisoned");

        if let Some(message) = &inner.fail_message {
            return Err(TableError::Transport(message.clone()));
        }
        if items.len() > MAX_BATCH_ITEMS {
            return Err(TableError::Rejected(format!(
                "batch of {} exceeds the {MAX_BATCH_ITEMS}-item limit",
                items.len()
            )));
        }

        inner.write_sizes.push(items.len());

        let hold_back = inner
            .throttle_script
            .pop_front()
            .unwrap_or(0)
            .min(items.len());
        let unprocessed = items.split_off(items.len() - hold_back);

        inner.rows.entry(table.to_string()).or_default().extend(items);
        Ok(BatchWriteOutcome { unprocessed })
    }
}
