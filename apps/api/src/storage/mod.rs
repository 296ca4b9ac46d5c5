//! Object storage access for uploaded CVs.
//!
//! `ObjectStore` is the seam; `S3ObjectStore` talks to S3 or MinIO.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use thiserror::Error;
use tracing::{info, warn};

/// Delay before the single retry of a transient fetch failure.
const TRANSIENT_RETRY_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object '{0}' not found")]
    NotFound(String),

    #[error("access denied for object '{0}'")]
    AccessDenied(String),

    #[error("transient storage fault: {0}")]
    Transient(String),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Loads the raw bytes stored under `key`.
    async fn get_object(&self, key: &str) -> Result<Bytes, StorageError>;
}

/// Bucket-scoped S3 client.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, key: &str) -> Result<Bytes, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify_get_error(key, e))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Transient(format!("reading body of '{key}': {e}")))?;

        Ok(data.into_bytes())
    }
}

fn classify_get_error(key: &str, err: SdkError<GetObjectError>) -> StorageError {
    if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
        return StorageError::NotFound(key.to_string());
    }
    match err.raw_response().map(|r| r.status().as_u16()) {
        Some(404) => StorageError::NotFound(key.to_string()),
        Some(401) | Some(403) => StorageError::AccessDenied(key.to_string()),
        _ => StorageError::Transient(format!("fetching '{key}': {err}")),
    }
}

/// Fetches a stored PDF and returns it base64-encoded (standard alphabet, padded).
///
/// Transient faults get exactly one retry; not-found and access errors fail immediately.
pub async fn fetch_pdf_base64(store: &dyn ObjectStore, key: &str) -> Result<String, StorageError> {
    let bytes = match store.get_object(key).await {
        Err(StorageError::Transient(reason)) => {
            warn!("Transient failure fetching CV '{key}', retrying once: {reason}");
            tokio::time::sleep(TRANSIENT_RETRY_DELAY).await;
            store.get_object(key).await?
        }
        other => other?,
    };

    info!("Fetched CV '{key}' ({} bytes)", bytes.len());
    Ok(STANDARD.encode(&bytes))
}
