//! Local JSON-lines sink: one file per table, one accepted record per
//! line. Gives local runs an observable destination.

use crate::error::TableError;
use crate::table::{BatchWriteOutcome, TableClient, MAX_BATCH_ITEMS};
use async_trait::async_trait;
use model::value::Record;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

pub struct JsonlTable {
    dir: PathBuf,
    files: Mutex<HashMap<String, BufWriter<File>>>,
}

impl JsonlTable {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl TableClient for JsonlTable {
    async fn batch_write(
        &self,
        table: &str,
        items: Vec<Record>,
    ) -> Result<BatchWriteOutcome, TableError> {
        if items.len() > MAX_BATCH_ITEMS {
            return Err(TableError::Rejected(format!(
                "batch of {} exceeds the {MAX_BATCH_ITEMS}-item limit",
                items.len()
            )));
        }

        let mut files = self.files.lock().expect("files mutex poisoned");
        if !files.contains_key(table) {
            std::fs::create_dir_all(&self.dir)?;
            let path = self.dir.join(format!("{table}.jsonl"));
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            info!(table, path = %path.display(), "Opened JSONL sink");
            files.insert(table.to_string(), BufWriter::new(file));
        }
        let writer = files.get_mut(table).expect("sink file just inserted");

        for record in &items {
            let line = serde_json::to_string(record)
                .map_err(|err| TableError::Encode(err.to_string()))?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        Ok(BatchWriteOutcome::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::value::AttrValue;

    #[tokio::test]
    async fn writes_one_json_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlTable::new(dir.path());

        let record = Record::from([
            ("a".to_string(), AttrValue::S("the".to_string())),
            ("b".to_string(), AttrValue::N("42".to_string())),
        ]);
        sink.batch_write("rows", vec![record.clone(), record])
            .await
            .unwrap();

        let contents = std::fs::read_to_string(dir.path().join("rows.jsonl")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: Record = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.get("b"), Some(&AttrValue::N("42".to_string())));
    }
}
