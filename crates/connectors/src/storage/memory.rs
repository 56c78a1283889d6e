//! In-memory object store for tests and local experiments.

use crate::error::StorageError;
use crate::storage::{GetRange, ObjectBody, ObjectStorage};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<HashMap<(String, String), Vec<u8>>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, bucket: &str, key: &str, data: impl Into<Vec<u8>>) {
        self.objects
            .lock()
            .expect("objects mutex poisoned")
            .insert((bucket.to_string(), key.to_string()), data.into());
    }

    pub fn len(&self, bucket: &str, key: &str) -> Option<usize> {
        self.objects
            .lock()
            .expect("objects mutex poisoned")
            .get(&(bucket.to_string(), key.to_string()))
            .map(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.objects
            .lock()
            .expect("objects mutex poisoned")
            .is_empty()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStore {
    async fn get(
        &self,
        bucket: &str,
        key: &str,
        range: GetRange,
    ) -> Result<ObjectBody, StorageError> {
        let data = {
            let objects = self.objects.lock().expect("objects mutex poisoned");
            objects
                .get(&(bucket.to_string(), key.to_string()))
                .cloned()
                .ok_or_else(|| StorageError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })?
        };

        let (start, end) = range.resolve(data.len() as i64)?;
        let slice = data[start as usize..end as usize].to_vec();
        Ok(ObjectBody {
            content_length: (end - start),
            reader: Box::new(Cursor::new(slice)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[tokio::test]
    async fn ranged_get_returns_exact_window() {
        let store = MemoryObjectStore::new();
        store.put("b", "k", b"a,b,c\nx,y,z\n".to_vec());

        let mut body = store.get("b", "k", GetRange::Bounded(6, 11)).await.unwrap();
        assert_eq!(body.content_length, 6);
        let mut out = String::new();
        body.reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "x,y,z\n");
    }

    #[tokio::test]
    async fn open_range_reads_to_end() {
        let store = MemoryObjectStore::new();
        store.put("b", "k", b"a,b,c\nx,y,z\n".to_vec());

        let mut body = store.get("b", "k", GetRange::From(6)).await.unwrap();
        let mut out = Vec::new();
        body.reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"x,y,z\n");
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let store = MemoryObjectStore::new();
        let err = store.get("b", "nope", GetRange::From(0)).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }
}
