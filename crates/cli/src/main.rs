use crate::{commands::Commands, error::CliError, shutdown::ShutdownCoordinator};
use clap::Parser;
use connectors::storage::{FsObjectStore, ObjectStorage, S3Config, S3ObjectStore};
use connectors::table::{JsonlTable, NullTable, TableClient};
use engine_processing::{error::WorkerError, preflight, worker::ImportWorker};
use futures::{stream, StreamExt, TryStreamExt};
use model::state::{
    Configuration, ImportRequest, PlanState, Source, Target, WorkerInput, WorkerOutput,
};
use std::{process, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};

mod commands;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "tabload",
    version,
    about = "Bulk delimited-file importer for wide-column tables"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Initialize logger
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let exit_code = match run_cli().await {
        Ok(()) => 0,
        Err(CliError::ShutdownRequested) => {
            info!("Stopped on shutdown request");
            130 // Standard exit code for SIGINT
        }
        Err(e) => {
            tracing::error!("Application error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}

async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();
    let cancel = CancellationToken::new();
    ShutdownCoordinator::new(cancel.clone()).register_handlers();

    match cli.command {
        Commands::Preflight {
            state,
            output,
            single_pass,
            local,
        } => {
            let doc = tokio::fs::read_to_string(&state).await?;
            let mut plan: PlanState = serde_json::from_str(&doc)?;
            let storage = storage_for(local.as_deref(), &plan.request.source.region);

            plan = preflight::run(storage.as_ref(), plan).await?;
            while !single_pass && plan.preflight.should_continue {
                if cancel.is_cancelled() {
                    return Err(CliError::ShutdownRequested);
                }
                plan = preflight::run(storage.as_ref(), plan).await?;
            }
            output::write_document(&plan, output.as_deref()).await
        }
        Commands::Import { input, local, sink } => {
            let doc = tokio::fs::read_to_string(&input).await?;
            let input: WorkerInput = serde_json::from_str(&doc)?;
            let storage = storage_for(local.as_deref(), &input.request.source.region);
            let worker = ImportWorker::new(storage, table_for(sink.as_deref()));

            let result = worker
                .run(input, cancel.clone())
                .await
                .map_err(map_cancelled)?;
            output::write_document(&result, None).await
        }
        Commands::Run {
            bucket_region,
            bucket,
            key,
            table_region,
            table,
            numeric_fields,
            boolean_fields,
            delimiter,
            concurrency,
            phase_duration_secs,
            parallel_workers,
            local,
            sink,
        } => {
            let request = ImportRequest {
                source: Source {
                    region: bucket_region,
                    bucket,
                    key,
                    numeric_fields: split_fields(&numeric_fields),
                    boolean_fields: split_fields(&boolean_fields),
                    delimiter: delimiter_value(&delimiter),
                },
                configuration: Configuration {
                    worker_concurrency: concurrency,
                    phase_duration_secs,
                },
                target: Target {
                    region: table_region,
                    table_name: table,
                },
            };
            run_import(
                request,
                parallel_workers,
                local.as_deref(),
                sink.as_deref(),
                &cancel,
            )
            .await
        }
    }
}

async fn run_import(
    request: ImportRequest,
    parallel_workers: usize,
    local: Option<&str>,
    sink: Option<&str>,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    request.validate()?;
    let storage = storage_for(local, &request.source.region);

    // Drive preflight to completion, re-invoking whenever an invocation
    // exhausts its budget.
    let mut plan = PlanState {
        request: request.clone(),
        ..Default::default()
    };
    loop {
        plan = preflight::run(storage.as_ref(), plan).await?;
        if !plan.preflight.should_continue {
            break;
        }
        if cancel.is_cancelled() {
            return Err(CliError::ShutdownRequested);
        }
    }

    let columns = plan.preflight.columns.clone().unwrap_or_default();
    info!(
        batches = plan.batches.len(),
        lines = plan.preflight.line,
        "Preflight plan ready"
    );

    let worker = ImportWorker::new(storage, table_for(sink));
    let inputs: Vec<WorkerInput> = plan
        .batches
        .iter()
        .map(|&range| WorkerInput {
            request: request.clone(),
            range,
            columns: columns.clone(),
        })
        .collect();

    let outputs: Vec<WorkerOutput> = stream::iter(inputs)
        .map(|input| worker.run(input, cancel.clone()))
        .buffer_unordered(parallel_workers.max(1))
        .try_collect()
        .await
        .map_err(map_cancelled)?;

    let records: i64 = outputs.iter().map(|out| out.processed_count).sum();
    let duration_ms = outputs.iter().map(|out| out.duration_ms).max().unwrap_or(0);
    info!(records, batches = outputs.len(), duration_ms, "Import complete");
    Ok(())
}

fn map_cancelled(err: WorkerError) -> CliError {
    match err {
        WorkerError::Cancelled => CliError::ShutdownRequested,
        other => CliError::Import(other),
    }
}

fn storage_for(local: Option<&str>, region: &str) -> Arc<dyn ObjectStorage> {
    match local {
        Some(root) => Arc::new(FsObjectStore::new(root)),
        None => Arc::new(S3ObjectStore::new(S3Config::from_env(region))),
    }
}

fn table_for(sink: Option<&str>) -> Arc<dyn TableClient> {
    match sink {
        Some(dir) => Arc::new(JsonlTable::new(dir)),
        None => {
            warn!("No sink configured; records will be counted and discarded");
            Arc::new(NullTable::new())
        }
    }
}

fn split_fields(list: &str) -> Vec<String> {
    list.split(',')
        .filter(|field| !field.is_empty())
        .map(String::from)
        .collect()
}

fn delimiter_value(name: &str) -> String {
    match name {
        "comma" => ",".to_string(),
        "tab" => "\t".to_string(),
        other => other.chars().take(1).collect(),
    }
}
