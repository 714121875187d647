//! Media library for the YouTube notes backend
//!
//! Stores the images embedded in note documents in an S3-compatible bucket
//! and removes them again when the editor drops them from a note.

pub mod images;
pub mod models;
pub mod storage;

pub use images::ImageAssetManager;
pub use models::{MediaError, MediaResult, StorageConfig, UploadedImage};
pub use storage::{ImageStore, S3ImageStore};
