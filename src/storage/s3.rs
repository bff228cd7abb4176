use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Builder as S3ConfigBuilder, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::{ByteStream, DateTimeFormat};
use aws_sdk_s3::Client as S3Client;
use futures::StreamExt;
use tracing::{debug, info, instrument, warn};

use super::endpoints::{candidate_endpoints, probe_endpoints};
use super::{ObjectStore, ObjectSummary, StorageError, StoredObject};
use crate::config::StorageConfig;

/// S3-compatible store (MinIO) bound to one endpoint chosen at startup
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
    endpoint: String,
    reachable: bool,
}

impl S3ObjectStore {
    /// Probe every candidate endpoint with `HeadBucket` and bind to the first
    /// that answers. When none does, bind to the first candidate anyway so the
    /// server keeps running; file requests will fail until the store is back.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StorageError> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let candidates = candidate_endpoints(config);
        let fallback = candidates
            .first()
            .cloned()
            .ok_or_else(|| StorageError::Request(format!("no usable endpoint in '{}'", config.endpoint)))?;

        let bucket = config.bucket.clone();
        let probed = probe_endpoints(&candidates, |endpoint| {
            let client = build_client(&sdk_config, config, &endpoint);
            let bucket = bucket.clone();
            async move {
                client
                    .head_bucket()
                    .bucket(&bucket)
                    .send()
                    .await
                    .map(|_| client)
                    .map_err(|err| DisplayErrorContext(err).to_string())
            }
        })
        .await;

        let store = match probed {
            Some((endpoint, client)) => {
                info!(endpoint = %endpoint, bucket = %config.bucket, "Object store connected");
                Self {
                    client,
                    bucket,
                    endpoint,
                    reachable: true,
                }
            }
            None => {
                warn!(
                    bucket = %config.bucket,
                    tried = candidates.len(),
                    "No object store endpoint reachable, file serving will fail until it recovers"
                );
                Self {
                    client: build_client(&sdk_config, config, &fallback),
                    bucket,
                    endpoint: fallback,
                    reachable: false,
                }
            }
        };

        Ok(store)
    }

    /// Whether the startup probe found a working endpoint
    pub fn reachable(&self) -> bool {
        self.reachable
    }
}

fn build_client(sdk_config: &aws_config::SdkConfig, config: &StorageConfig, endpoint: &str) -> S3Client {
    let credentials = Credentials::new(&config.access_key, &config.secret_key, None, None, "minio-static");
    let s3_config = S3ConfigBuilder::from(sdk_config)
        .endpoint_url(endpoint)
        .credentials_provider(credentials)
        .force_path_style(true)
        .build();
    S3Client::from_conf(s3_config)
}

fn byte_stream(body: ByteStream) -> super::ObjectStream {
    futures::stream::unfold(body, |mut body| async move {
        body.next()
            .await
            .map(|chunk| (chunk.map_err(|err| StorageError::Stream(err.to_string())), body))
    })
    .boxed()
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                let missing = err.as_service_error().is_some_and(|e| e.is_no_such_key())
                    || err.raw_response().is_some_and(|raw| raw.status().as_u16() == 404);
                if missing {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::Request(DisplayErrorContext(err).to_string())
                }
            })?;

        let content_length = output.content_length().and_then(|len| u64::try_from(len).ok());
        debug!(content_length, "Object found");

        Ok(StoredObject {
            key: key.to_string(),
            content_length,
            body: byte_stream(output.body),
        })
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, StorageError> {
        let mut summaries = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|err| StorageError::Request(DisplayErrorContext(err).to_string()))?;

            summaries.extend(output.contents().iter().filter_map(|object| {
                Some(ObjectSummary {
                    key: object.key()?.to_string(),
                    size: object.size().unwrap_or_default(),
                    last_modified: object
                        .last_modified()
                        .and_then(|dt| dt.fmt(DateTimeFormat::DateTime).ok()),
                })
            }));

            match output.next_continuation_token() {
                Some(token) if output.is_truncated().unwrap_or(false) => continuation = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(summaries)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
