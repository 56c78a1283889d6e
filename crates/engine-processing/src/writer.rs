//! Batch writer: one write request at a time, retrying the
//! unprocessed residue of partial failures under the backoff schedule.

use crate::error::WriteError;
use connectors::table::TableClient;
use engine_core::backoff::Backoff;
use engine_core::metrics::Metrics;
use model::value::Record;
use std::sync::Arc;
use tracing::warn;

pub struct BatchWriter {
    client: Arc<dyn TableClient>,
    table: String,
    backoff: Backoff,
    metrics: Metrics,
}

impl BatchWriter {
    pub fn new(client: Arc<dyn TableClient>, table: impl Into<String>, metrics: Metrics) -> Self {
        Self {
            client,
            table: table.into(),
            backoff: Backoff::default(),
            metrics,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Succeeds only once every record has been accepted by the table.
    ///
    /// Accepted records are never resent: each round resends only the
    /// residue the service reported back. Transport errors propagate
    /// immediately; sustained throttling ends in `BackoffExhausted`.
    pub async fn write(&self, records: Vec<Record>) -> Result<(), WriteError> {
        let mut remaining = records;
        let mut retry: u32 = 0;
        loop {
            let outcome = self.client.batch_write(&self.table, remaining).await?;
            if outcome.unprocessed.is_empty() {
                return Ok(());
            }

            warn!(
                table = %self.table,
                unprocessed = outcome.unprocessed.len(),
                retry,
                "Partial batch write; backing off before resending"
            );
            self.backoff.wait(retry).await?;
            self.metrics.increment_retries(1);
            retry += 1;
            remaining = outcome.unprocessed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::table::MemoryTable;
    use model::value::AttrValue;

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record::from([("id".to_string(), AttrValue::N(i.to_string()))]))
            .collect()
    }

    fn writer(table: &MemoryTable) -> BatchWriter {
        BatchWriter::new(Arc::new(table.clone()), "rows", Metrics::new())
    }

    #[tokio::test]
    async fn clean_write_needs_one_call() {
        let table = MemoryTable::new();
        writer(&table).write(records(25)).await.unwrap();
        assert_eq!(table.write_sizes(), vec![25]);
        assert_eq!(table.row_count("rows"), 25);
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_unprocessed_residue_is_resent() {
        let table = MemoryTable::new();
        table.throttle([10, 4]);

        writer(&table).write(records(25)).await.unwrap();

        // 25 sent, 10 back; 10 resent, 4 back; 4 resent, done.
        assert_eq!(table.write_sizes(), vec![25, 10, 4]);
        assert_eq!(table.row_count("rows"), 25);

        // The residue is the tail of the original batch, so every
        // record appears exactly once.
        let mut ids: Vec<String> = table
            .rows("rows")
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect();
        ids.sort_by_key(|id| id.parse::<usize>().unwrap());
        ids.dedup();
        assert_eq!(ids.len(), 25);
    }

    #[tokio::test(start_paused = true)]
    async fn sustained_throttling_exhausts_the_backoff() {
        let table = MemoryTable::new();
        // Every call keeps one record unprocessed; retries 0..=2 are
        // allowed, the next one trips the limit.
        table.throttle([1; 16]);

        let writer = writer(&table).with_backoff(Backoff::new(2));
        let err = writer.write(records(5)).await.unwrap_err();
        assert!(matches!(err, WriteError::BackoffExhausted(_)));
        // Initial call plus retries 0, 1 and 2.
        assert_eq!(table.write_sizes().len(), 4);
    }

    #[tokio::test]
    async fn transport_errors_propagate_without_retry() {
        let table = MemoryTable::new();
        table.fail_with("connection reset");

        let err = writer(&table).write(records(3)).await.unwrap_err();
        assert!(matches!(err, WriteError::Table(_)));
        assert!(table.write_sizes().is_empty());
    }
}
