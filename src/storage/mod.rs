pub mod content_type;
pub mod endpoints;
pub mod s3;
pub mod unavailable;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::Serialize;
use thiserror::Error;

pub use content_type::content_type_for;
pub use endpoints::{candidate_endpoints, probe_endpoints};
pub use s3::S3ObjectStore;
pub use unavailable::UnavailableStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object store request failed: {0}")]
    Request(String),

    #[error("Object stream failed: {0}")]
    Stream(String),
}

pub type ObjectStream = BoxStream<'static, Result<Bytes, StorageError>>;

/// An object ready to be streamed out
pub struct StoredObject {
    pub key: String,
    pub content_length: Option<u64>,
    pub body: ObjectStream,
}

impl std::fmt::Debug for StoredObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredObject")
            .field("key", &self.key)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSummary {
    pub key: String,
    pub size: i64,
    #[serde(rename = "lastModified")]
    pub last_modified: Option<String>,
}

/// Read-only view of the bucket files are served from
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fails with `NotFound` before any byte is produced when the key is absent
    async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError>;

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, StorageError>;

    /// Endpoint the store is bound to
    fn endpoint(&self) -> &str;

    fn bucket(&self) -> &str;
}
