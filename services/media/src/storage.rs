//! Object storage backends for editor images

use anyhow::Result;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{Client, config::Region, primitives::ByteStream};
use bytes::Bytes;
use tracing::info;

use crate::models::StorageConfig;

/// Object storage contract used by the image asset manager
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `body` under `key`
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<()>;

    /// Remove the object stored under `key`
    async fn remove(&self, key: &str) -> Result<()>;
}

/// S3-compatible image store
#[derive(Clone)]
pub struct S3ImageStore {
    s3_client: Client,
    bucket: String,
}

impl S3ImageStore {
    pub fn new(s3_client: Client, bucket: String) -> Self {
        Self { s3_client, bucket }
    }

    /// Build a client from the AWS default chain plus the configured overrides
    pub async fn from_config(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        info!("S3 image store initialized for bucket: {}", config.bucket);
        Self::new(Client::from_conf(s3_config), config.bucket.clone())
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        info!("Uploading image to S3: {}", key);

        self.s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        info!("Removing image from S3: {}", key);

        self.s3_client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;

        Ok(())
    }
}
