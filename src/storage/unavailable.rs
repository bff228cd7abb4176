use async_trait::async_trait;

use super::{ObjectStore, ObjectSummary, StorageError, StoredObject};
use crate::config::StorageConfig;

/// Stand-in used when the object store could not be configured at startup.
/// Every request fails with the startup reason; the rest of the API keeps
/// serving.
pub struct UnavailableStore {
    endpoint: String,
    bucket: String,
    reason: String,
}

impl UnavailableStore {
    pub fn new(config: &StorageConfig, reason: impl Into<String>) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            bucket: config.bucket.clone(),
            reason: reason.into(),
        }
    }

    fn error(&self) -> StorageError {
        StorageError::Request(format!("object store unavailable: {}", self.reason))
    }
}

#[async_trait]
impl ObjectStore for UnavailableStore {
    async fn get_object(&self, _key: &str) -> Result<StoredObject, StorageError> {
        Err(self.error())
    }

    async fn list_objects(&self, _prefix: &str) -> Result<Vec<ObjectSummary>, StorageError> {
        Err(self.error())
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
