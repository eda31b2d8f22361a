//! S3-compatible store over the AWS SDK.
//!
//! Works against any S3-compatible endpoint (AWS itself, Backblaze B2,
//! MinIO) via an explicit endpoint URL, region, and static credentials.
//! Credential resolution falls back to the ambient AWS environment when no
//! keys are configured.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use bytes::Bytes;

use crate::error::TransferError;

use super::{ObjectRef, ObjectStore, PartResult};

/// Connection settings for an S3-compatible destination.
#[derive(Debug, Clone, Default)]
pub struct S3StoreConfig {
    /// Endpoint URL for S3-compatible services; `None` uses AWS proper.
    pub endpoint: Option<String>,
    /// Region name (some S3-compatible services accept any value here).
    pub region: String,
    /// Static access key id; both keys unset falls back to the ambient
    /// AWS credential chain.
    pub access_key_id: Option<String>,
    /// Static secret access key.
    pub secret_access_key: Option<String>,
}

/// Destination store backed by an S3-compatible service.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Builds the SDK client from explicit settings layered over the
    /// ambient AWS configuration.
    pub async fn connect(config: S3StoreConfig) -> Self {
        let base = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&base);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if !config.region.is_empty() {
            builder = builder.region(Region::new(config.region.clone()));
        }
        if let (Some(id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            builder = builder
                .credentials_provider(Credentials::new(
                    id.clone(),
                    secret.clone(),
                    None,
                    None,
                    "ferry-static",
                ));
        }
        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    /// Wraps an already-built SDK client (lifetime owned by the caller).
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn create_upload(
        &self,
        bucket: &str,
        key: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<String, TransferError> {
        let mut request = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key);
        for (name, value) in metadata {
            request = request.metadata(name, value);
        }
        let output = request.send().await.map_err(|e| {
            TransferError::DestinationUpload(format!(
                "create multipart upload: {}",
                DisplayErrorContext(&e)
            ))
        })?;
        let upload_id = output.upload_id().ok_or_else(|| {
            TransferError::DestinationUpload(
                "destination returned no upload id".to_string(),
            )
        })?;
        tracing::debug!(bucket, key, upload_id, "multipart upload created");
        Ok(upload_id.to_string())
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> Result<String, TransferError> {
        let size = body.len();
        let output = self
            .client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .content_length(size as i64)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                TransferError::DestinationUpload(format!(
                    "part {part_number}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        let etag = output.e_tag().ok_or_else(|| {
            TransferError::DestinationUpload(format!(
                "part {part_number}: destination returned no etag"
            ))
        })?;
        tracing::debug!(part = part_number, bytes = size, "part accepted");
        Ok(etag.to_string())
    }

    async fn complete_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[PartResult],
    ) -> Result<ObjectRef, TransferError> {
        let manifest = CompletedMultipartUpload::builder()
            .set_parts(Some(
                parts
                    .iter()
                    .map(|p| {
                        CompletedPart::builder()
                            .part_number(p.part_number)
                            .e_tag(&p.etag)
                            .build()
                    })
                    .collect(),
            ))
            .build();
        let output = self
            .client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(manifest)
            .send()
            .await
            .map_err(|e| {
                TransferError::DestinationUpload(format!(
                    "complete multipart upload: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(ObjectRef {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size: parts.iter().map(|p| p.size).sum(),
            etag: output.e_tag().map(|t| t.to_string()),
        })
    }

    async fn abort_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<(), TransferError> {
        self.client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| {
                TransferError::DestinationUpload(format!(
                    "abort multipart upload: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        tracing::debug!(bucket, key, upload_id, "multipart upload aborted");
        Ok(())
    }
}
