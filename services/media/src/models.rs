use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Object storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Bucket holding editor images
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Public URL prefix under which stored objects resolve, without the key
    pub public_base_url: String,
    /// Region override; the AWS default chain is used when absent
    #[serde(default)]
    pub region: Option<String>,
    /// Custom S3 endpoint (Supabase storage, MinIO, ...)
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_bucket() -> String {
    "editor-images".to_string()
}

/// An image stored for the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedImage {
    pub key: String,
    pub url: String,
}

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("No file uploaded")]
    EmptyUpload,

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type MediaResult<T> = Result<T, MediaError>;
