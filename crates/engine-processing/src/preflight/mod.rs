//! Preflight: one budgeted scan of the source that slices it into
//! record-aligned byte ranges.
//!
//! The scan reads the file through the line-tracking reader, so after
//! every successful record read the reader's offset sits exactly on
//! the next record boundary. Every K lines that offset is committed as
//! a batch boundary. When the wall-clock budget runs out the scan
//! checkpoints at the last committed boundary and asks to be
//! re-invoked; re-reading the short tail is cheaper than resuming
//! inside a partial batch.

mod line_reader;

pub use line_reader::{LineReader, NewLineFn};

use crate::error::PreflightError;
use connectors::storage::{GetRange, ObjectStorage};
use model::state::PlanState;
use std::cell::Cell;
use std::io::Read;
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info};

/// Source lines covered by each planned batch.
///
/// 100,000 lines / 25 items per write request = 4,000 requests per
/// batch, roughly 25-60 seconds of table work per import worker at
/// typical table throughput.
pub const LINES_PER_BATCH: i64 = 100_000;

/// Progress log cadence while scanning, in records.
const PROGRESS_EVERY: i64 = 50_000;

/// One preflight invocation: ranged GET from the checkpoint offset,
/// then a budgeted scan on a blocking thread.
///
/// The returned state either has `should_continue == false` and a
/// complete batch plan, or carries a checkpoint for the next
/// invocation.
pub async fn run(storage: &dyn ObjectStorage, state: PlanState) -> Result<PlanState, PreflightError> {
    state.request.validate()?;

    let bucket = state.request.source.bucket.clone();
    let key = state.request.source.key.clone();
    let budget = state.request.configuration.phase_duration();

    info!(
        bucket = %bucket,
        key = %key,
        offset = state.preflight.offset,
        line = state.preflight.line,
        budget_secs = budget.as_secs(),
        "Starting preflight scan"
    );

    let body = storage
        .get(&bucket, &key, GetRange::From(state.preflight.offset))
        .await?;
    debug!(content_length = body.content_length, "Source stream opened");

    let deadline = Instant::now() + budget;
    let result = tokio::task::spawn_blocking(move || {
        plan(body.reader, state, LINES_PER_BATCH, || {
            Instant::now() >= deadline
        })
    })
    .await
    .map_err(|err| PreflightError::Task(err.to_string()))??;

    if result.preflight.should_continue {
        info!(
            offset = result.preflight.offset,
            batches = result.batches.len(),
            "Preflight budget exhausted; continuing in a new invocation"
        );
    } else {
        info!(
            lines = result.preflight.line,
            batches = result.batches.len(),
            "Preflight complete"
        );
    }
    Ok(result)
}

/// The scan itself, single-threaded and cooperative: `timed_out` is
/// polled between records.
///
/// Exposed separately from [`run`] so the boundary arithmetic can be
/// exercised against plain readers and injected clocks.
pub fn plan<R, F>(
    src: R,
    mut state: PlanState,
    lines_per_batch: i64,
    mut timed_out: F,
) -> Result<PlanState, PreflightError>
where
    R: Read,
    F: FnMut() -> bool,
{
    let boundary_due = Rc::new(Cell::new(false));
    let flag = Rc::clone(&boundary_due);
    let reader = LineReader::new(
        src,
        state.preflight.line,
        state.preflight.offset,
        Some(Box::new(move |line, _offset| {
            if line % lines_per_batch == 0 {
                flag.set(true);
            }
        })),
    );

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(state.request.source.delimiter_byte())
        .has_headers(false)
        .from_reader(reader);

    let mut batch_start = state.preflight.offset;
    let mut batch_start_line = state.preflight.line;
    let mut records: i64 = 0;
    let mut record = csv::StringRecord::new();

    loop {
        if !rdr.read_record(&mut record)? {
            // End of stream: the tail since the last boundary becomes
            // the final batch. Emitting it here, and only here, keeps
            // coverage exact across re-invocations.
            let end = rdr.get_ref().offset();
            if batch_start != end {
                state.batches.push([batch_start, end]);
            }
            state.preflight.line = rdr.get_ref().line();
            state.preflight.offset = end;
            state.preflight.should_continue = false;
            break;
        }

        if state.preflight.columns.is_none() {
            state.preflight.columns = Some(record.iter().map(String::from).collect());
        }

        // A quota boundary observed inside a multi-line quoted record
        // slides here, to the end of the enclosing record, so committed
        // boundaries are always record-aligned.
        if boundary_due.get() {
            boundary_due.set(false);
            let end = rdr.get_ref().offset();
            state.batches.push([batch_start, end]);
            batch_start = end;
            batch_start_line = rdr.get_ref().line();
        }

        if timed_out() {
            // Rewind to the last committed boundary; the lines read past
            // it are simply re-read by the next invocation.
            state.preflight.line = batch_start_line;
            state.preflight.offset = batch_start;
            state.preflight.should_continue = true;
            info!(
                offset = batch_start,
                "Preflight budget exhausted, checkpointing"
            );
            break;
        }

        records += 1;
        if records % PROGRESS_EVERY == 0 {
            info!(records, offset = rdr.get_ref().offset(), "Preflight progress");
        }
    }

    Ok(state)
}
