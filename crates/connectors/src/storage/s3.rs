//! S3-backed object store. Ranged GETs stream the body; the async
//! stream is bridged to the blocking reader the parsers consume.

use crate::error::StorageError;
use crate::storage::{GetRange, ObjectBody, ObjectStorage};
use async_trait::async_trait;
use futures::TryStreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::{GetOptions, ObjectStore};
use tokio_util::io::{StreamReader, SyncIoBridge};
use tracing::debug;

/// Connection settings for S3-compatible storage.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// AWS region (e.g. "eu-west-2")
    pub region: String,
    /// Explicit credentials; left unset, ambient credentials apply.
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Custom endpoint URL (MinIO / LocalStack)
    pub endpoint_url: Option<String>,
    /// Allow HTTP (non-TLS) connections, for local endpoints
    pub allow_http: bool,
}

impl S3Config {
    /// Region from the import request, credentials and endpoint from
    /// the environment: AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY,
    /// AWS_ENDPOINT_URL, AWS_ALLOW_HTTP.
    pub fn from_env(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
            endpoint_url: std::env::var("AWS_ENDPOINT_URL").ok(),
            allow_http: std::env::var("AWS_ALLOW_HTTP")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

pub struct S3ObjectStore {
    config: S3Config,
}

impl S3ObjectStore {
    pub fn new(config: S3Config) -> Self {
        Self { config }
    }

    fn build_store(&self, bucket: &str) -> Result<AmazonS3, StorageError> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(&self.config.region)
            .with_bucket_name(bucket);

        if let (Some(key), Some(secret)) = (
            self.config.access_key_id.as_ref(),
            self.config.secret_access_key.as_ref(),
        ) {
            builder = builder
                .with_access_key_id(key)
                .with_secret_access_key(secret);
        }
        if let Some(ref endpoint) = self.config.endpoint_url {
            builder = builder.with_endpoint(endpoint);
        }
        if self.config.allow_http {
            builder = builder.with_allow_http(true);
        }

        builder
            .build()
            .map_err(|err| StorageError::Backend(err.to_string()))
    }
}

fn to_store_range(range: GetRange) -> object_store::GetRange {
    match range {
        GetRange::From(from) => object_store::GetRange::Offset(from as usize),
        // The wire range is inclusive; object_store takes half-open.
        GetRange::Bounded(from, to) => {
            object_store::GetRange::Bounded(from as usize..(to + 1) as usize)
        }
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStore {
    async fn get(
        &self,
        bucket: &str,
        key: &str,
        range: GetRange,
    ) -> Result<ObjectBody, StorageError> {
        let store = self.build_store(bucket)?;
        let path = ObjectPath::from(key);

        let opts = GetOptions {
            range: Some(to_store_range(range)),
            ..Default::default()
        };
        let result = store.get_opts(&path, opts).await.map_err(|err| match err {
            object_store::Error::NotFound { .. } => StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            other => StorageError::Backend(other.to_string()),
        })?;

        let content_length = (result.range.end - result.range.start) as i64;
        debug!(bucket, key, content_length, "Opened S3 object stream");

        let stream = result.into_stream().map_err(std::io::Error::other);
        let reader = SyncIoBridge::new(StreamReader::new(stream));
        Ok(ObjectBody {
            content_length,
            reader: Box::new(reader),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> S3Config {
        S3Config {
            region: "eu-west-2".to_string(),
            access_key_id: Some("test-key".to_string()),
            secret_access_key: Some("test-secret".to_string()),
            endpoint_url: Some("http://localhost:9000".to_string()),
            allow_http: true,
        }
    }

    #[test]
    fn build_store_accepts_custom_endpoint() {
        let store = S3ObjectStore::new(test_config());
        assert!(store.build_store("imports").is_ok());
    }

    #[test]
    fn bounded_range_converts_to_half_open() {
        match to_store_range(GetRange::Bounded(6, 11)) {
            object_store::GetRange::Bounded(r) => assert_eq!(r, 6..12),
            other => panic!("unexpected range: {other:?}"),
        }
        match to_store_range(GetRange::From(6)) {
            object_store::GetRange::Offset(o) => assert_eq!(o, 6),
            other => panic!("unexpected range: {other:?}"),
        }
    }
}
