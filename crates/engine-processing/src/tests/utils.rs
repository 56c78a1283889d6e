#![allow(dead_code)]

use connectors::storage::MemoryObjectStore;
use model::state::{
    Configuration, ImportRequest, PlanState, Source, Target, WorkerInput,
};

pub const BUCKET: &str = "imports";
pub const KEY: &str = "data.csv";
pub const TABLE: &str = "rows";

/// Header plus `n` identical 6-byte data rows, the shape used by the
/// boundary arithmetic tests.
pub fn generate(n: usize) -> String {
    let mut out = String::from("a,b,c\n");
    for _ in 0..n {
        out.push_str("x,y,z\n");
    }
    out
}

pub fn request() -> ImportRequest {
    ImportRequest {
        source: Source {
            region: "eu-west-2".into(),
            bucket: BUCKET.into(),
            key: KEY.into(),
            numeric_fields: Vec::new(),
            boolean_fields: Vec::new(),
            delimiter: ",".into(),
        },
        configuration: Configuration {
            worker_concurrency: 2,
            phase_duration_secs: 500,
        },
        target: Target {
            region: "eu-west-2".into(),
            table_name: TABLE.into(),
        },
    }
}

pub fn plan_state() -> PlanState {
    PlanState {
        request: request(),
        ..Default::default()
    }
}

pub fn seeded_store(data: &str) -> MemoryObjectStore {
    let store = MemoryObjectStore::new();
    store.put(BUCKET, KEY, data.as_bytes().to_vec());
    store
}

/// Task document for one planned batch, replaying the captured header
/// the way the orchestrator would.
pub fn worker_input(state: &PlanState, batch: usize) -> WorkerInput {
    WorkerInput {
        request: state.request.clone(),
        range: state.batches[batch],
        columns: state
            .preflight
            .columns
            .clone()
            .expect("preflight captured no columns"),
    }
}

/// A timeout predicate that fires once `limit` records have been
/// observed.
pub fn timeout_after(limit: usize) -> impl FnMut() -> bool {
    let mut calls = 0;
    move || {
        calls += 1;
        calls >= limit
    }
}

pub fn never() -> impl FnMut() -> bool {
    || false
}
