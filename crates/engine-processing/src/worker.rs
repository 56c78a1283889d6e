//! Import worker: streams one planned byte range of the source, types
//! its records, and writes them through a pool of writer tasks.

use crate::convert::{RecordConverter, TypePolicy};
use crate::error::WorkerError;
use crate::writer::BatchWriter;
use connectors::storage::{GetRange, ObjectStorage};
use connectors::table::TableClient;
use engine_core::metrics::Metrics;
use model::state::{WorkerInput, WorkerOutput};
use model::value::Record;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Batches buffered between the feeder and the writer pool. 128
/// batches at the maximum batch payload keeps the channel under
/// roughly 50 MB.
const CHANNEL_CAPACITY: usize = 128;

/// Progress log cadence, in batches written.
const PROGRESS_EVERY: u64 = 500;

pub struct ImportWorker {
    storage: Arc<dyn ObjectStorage>,
    table: Arc<dyn TableClient>,
}

impl ImportWorker {
    pub fn new(storage: Arc<dyn ObjectStorage>, table: Arc<dyn TableClient>) -> Self {
        Self { storage, table }
    }

    /// Imports the byte range described by `input`. Returns once every
    /// record in the range has been accepted by the table, or with the
    /// first error after cancelling the remaining work.
    pub async fn run(
        &self,
        input: WorkerInput,
        cancel: CancellationToken,
    ) -> Result<WorkerOutput, WorkerError> {
        let start = Instant::now();
        input.request.validate()?;

        let source = &input.request.source;
        let concurrency = input.request.configuration.concurrency();
        let [from, to] = input.range;

        info!(
            from,
            to,
            bucket = %source.bucket,
            key = %source.key,
            table = %input.request.target.table_name,
            concurrency,
            "Starting import worker"
        );

        let body = self
            .storage
            .get(&source.bucket, &source.key, GetRange::Bounded(from, to - 1))
            .await?;

        let (batch_tx, batch_rx) = mpsc::channel::<Vec<Record>>(CHANNEL_CAPACITY);
        let batch_rx = Arc::new(tokio::sync::Mutex::new(batch_rx));
        let metrics = Metrics::new();
        let first_error: Arc<Mutex<Option<WorkerError>>> = Arc::new(Mutex::new(None));

        let mut writers = Vec::with_capacity(concurrency);
        for index in 0..concurrency {
            let rx = Arc::clone(&batch_rx);
            let writer = BatchWriter::new(
                Arc::clone(&self.table),
                input.request.target.table_name.clone(),
                metrics.clone(),
            );
            let cancel = cancel.clone();
            let metrics = metrics.clone();
            let first_error = Arc::clone(&first_error);

            writers.push(tokio::spawn(async move {
                loop {
                    let batch = tokio::select! {
                        _ = cancel.cancelled() => break,
                        batch = async { rx.lock().await.recv().await } => match batch {
                            Some(batch) => batch,
                            // Channel closed and drained: feeder is done.
                            None => break,
                        },
                    };

                    let records = batch.len() as u64;
                    if let Err(err) = writer.write(batch).await {
                        error!(
                            writer = index,
                            error = %err,
                            "Batch write failed; cancelling import"
                        );
                        let mut slot = first_error.lock().expect("error slot poisoned");
                        if slot.is_none() {
                            *slot = Some(WorkerError::Write(err));
                        }
                        drop(slot);
                        cancel.cancel();
                        break;
                    }

                    metrics.increment_records(records);
                    let batches = metrics.increment_batches(1);
                    if batches % PROGRESS_EVERY == 0 {
                        let snapshot = metrics.snapshot();
                        let secs = start.elapsed().as_secs_f64();
                        info!(
                            batches,
                            records = snapshot.records_processed,
                            rps = (snapshot.records_processed as f64 / secs) as u64,
                            "Import progress"
                        );
                    }
                }
            }));
        }

        // The feeder owns the source stream and the sender; dropping the
        // sender at the end of the closure is what closes the channel.
        let feeder = {
            let cancel = cancel.clone();
            let columns = input.columns.clone();
            let policy = TypePolicy::new(&source.numeric_fields, &source.boolean_fields);
            let delimiter = source.delimiter_byte();
            let headerless = from > 0;
            let reader = body.reader;

            tokio::task::spawn_blocking(move || -> Result<bool, WorkerError> {
                let rdr = csv::ReaderBuilder::new()
                    .delimiter(delimiter)
                    .has_headers(false)
                    .from_reader(reader);
                let mut converter = if headerless {
                    // Mid-file ranges carry no header row; replay the
                    // schema preflight captured and pin the width.
                    RecordConverter::with_columns(rdr, columns, policy)
                } else {
                    RecordConverter::from_header(rdr, policy)?
                };

                loop {
                    if cancel.is_cancelled() {
                        return Ok(false);
                    }
                    let (batch, eof) = converter.read_batch()?;
                    if !batch.is_empty() && batch_tx.blocking_send(batch).is_err() {
                        // Every writer is gone; nothing left to feed.
                        return Ok(false);
                    }
                    if eof {
                        return Ok(true);
                    }
                }
            })
        };

        let fed_to_completion = feeder
            .await
            .map_err(|err| WorkerError::Task(err.to_string()))?;
        for handle in writers {
            handle
                .await
                .map_err(|err| WorkerError::Task(err.to_string()))?;
        }

        if let Some(err) = first_error.lock().expect("error slot poisoned").take() {
            return Err(err);
        }
        let completed = fed_to_completion?;
        if !completed || cancel.is_cancelled() {
            // Cancelled from outside: queued batches were dropped, so
            // the range cannot be reported as imported.
            return Err(WorkerError::Cancelled);
        }

        let snapshot = metrics.snapshot();
        let output = WorkerOutput {
            processed_count: snapshot.records_processed as i64,
            duration_ms: start.elapsed().as_millis() as i64,
        };
        info!(
            records = output.processed_count,
            batches = snapshot.batches_processed,
            retries = snapshot.retry_count,
            duration_ms = output.duration_ms,
            "Import worker complete"
        );
        Ok(output)
    }
}
