//! Object-storage seam: ranged reads of the source file.
//!
//! Both phases consume the source through [`ObjectStorage`]: preflight
//! streams from its checkpoint offset to the end of the object, import
//! workers stream exactly their assigned byte window. The body is a
//! blocking [`Read`] because the record parser downstream is
//! synchronous; callers run it on a blocking thread.

use crate::error::StorageError;
use async_trait::async_trait;

pub mod fs;
pub mod memory;
pub mod s3;

pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;
pub use s3::{S3Config, S3ObjectStore};

/// Byte range of a ranged GET, inclusive on both ends as in HTTP
/// `bytes=from-to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetRange {
    /// Everything from `from` to the end of the object.
    From(i64),
    /// Bytes `from..=to`.
    Bounded(i64, i64),
}

impl GetRange {
    /// Resolves against an object of `size` bytes into a half-open
    /// `start..end` pair.
    pub fn resolve(&self, size: i64) -> Result<(i64, i64), StorageError> {
        let (start, end) = match *self {
            GetRange::From(from) => (from, size),
            GetRange::Bounded(from, to) => (from, (to + 1).min(size)),
        };
        if start < 0 || start > end || start > size {
            return Err(StorageError::InvalidRange {
                from: start,
                to: end,
            });
        }
        Ok((start, end))
    }
}

/// Streamed body of a ranged GET.
pub struct ObjectBody {
    /// Number of bytes the reader will yield.
    pub content_length: i64,
    pub reader: Box<dyn std::io::Read + Send>,
}

impl std::fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn get(
        &self,
        bucket: &str,
        key: &str,
        range: GetRange,
    ) -> Result<ObjectBody, StorageError>;
}
