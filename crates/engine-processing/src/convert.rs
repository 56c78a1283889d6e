//! Cell typing: turns parsed rows into typed records under the
//! per-import column policy.

use crate::error::WorkerError;
use connectors::table::MAX_BATCH_ITEMS;
use model::value::{ColumnType, Record};
use std::collections::HashMap;
use std::io::Read;

/// Column name → converter. Columns not listed as numeric or boolean
/// default to string.
#[derive(Debug, Clone, Default)]
pub struct TypePolicy {
    types: HashMap<String, ColumnType>,
}

impl TypePolicy {
    pub fn new(numeric_fields: &[String], boolean_fields: &[String]) -> Self {
        let mut types = HashMap::new();
        for name in numeric_fields {
            types.insert(name.clone(), ColumnType::Number);
        }
        for name in boolean_fields {
            types.insert(name.clone(), ColumnType::Boolean);
        }
        Self { types }
    }

    pub fn column_type(&self, column: &str) -> ColumnType {
        self.types
            .get(column)
            .copied()
            .unwrap_or(ColumnType::String)
    }
}

/// Streams typed records off a delimited reader, bundled into
/// write-sized batches.
pub struct RecordConverter<R> {
    rdr: csv::Reader<R>,
    columns: Vec<String>,
    policy: TypePolicy,
    /// Set when the schema was preloaded: the stream holds headerless
    /// data rows whose width must match the schema.
    pinned: bool,
    record: csv::StringRecord,
}

impl<R: Read> RecordConverter<R> {
    /// Consumes the first record of the stream as the column schema.
    pub fn from_header(mut rdr: csv::Reader<R>, policy: TypePolicy) -> Result<Self, WorkerError> {
        let mut header = csv::StringRecord::new();
        rdr.read_record(&mut header)?;
        let columns = header.iter().map(String::from).collect();
        Ok(Self {
            rdr,
            columns,
            policy,
            pinned: false,
            record: csv::StringRecord::new(),
        })
    }

    /// Uses a schema captured elsewhere; every record in the stream is
    /// a data row and must have exactly `columns.len()` fields.
    pub fn with_columns(rdr: csv::Reader<R>, columns: Vec<String>, policy: TypePolicy) -> Self {
        Self {
            rdr,
            columns,
            policy,
            pinned: true,
            record: csv::StringRecord::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Next typed record, or `None` at end of stream. Empty cells are
    /// left out of the record entirely.
    pub fn read_record(&mut self) -> Result<Option<Record>, WorkerError> {
        if !self.rdr.read_record(&mut self.record)? {
            return Ok(None);
        }
        if self.pinned && self.record.len() != self.columns.len() {
            return Err(WorkerError::FieldCount {
                want: self.columns.len(),
                got: self.record.len(),
            });
        }

        let mut out = Record::with_capacity(self.columns.len());
        for (i, column) in self.columns.iter().enumerate() {
            let cell = self.record.get(i).unwrap_or("");
            if let Some(value) = self.policy.column_type(column).convert(cell) {
                out.insert(column.clone(), value);
            }
        }
        Ok(Some(out))
    }

    /// Up to one write request's worth of records. The flag is true at
    /// end of stream.
    pub fn read_batch(&mut self) -> Result<(Vec<Record>, bool), WorkerError> {
        let mut batch = Vec::with_capacity(MAX_BATCH_ITEMS);
        while batch.len() < MAX_BATCH_ITEMS {
            match self.read_record()? {
                Some(record) => batch.push(record),
                None => return Ok((batch, true)),
            }
        }
        Ok((batch, false))
    }
}
