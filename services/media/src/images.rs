//! Upload and cleanup of images embedded in note documents

use std::{path::Path, sync::Arc};

use bytes::Bytes;
use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    models::{MediaError, MediaResult, UploadedImage},
    storage::ImageStore,
};

/// Image asset manager
#[derive(Clone)]
pub struct ImageAssetManager {
    store: Arc<dyn ImageStore>,
    public_base_url: String,
}

impl ImageAssetManager {
    pub fn new(store: Arc<dyn ImageStore>, public_base_url: &str) -> Self {
        Self {
            store,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Store an uploaded image and return its public URL
    pub async fn upload_image(
        &self,
        body: Bytes,
        content_type: &str,
        original_name: &str,
    ) -> MediaResult<UploadedImage> {
        if body.is_empty() {
            return Err(MediaError::EmptyUpload);
        }

        let key = Self::object_key(original_name, Utc::now().timestamp_millis());
        info!(
            "Storing editor image {} ({} bytes, {})",
            key,
            body.len(),
            content_type
        );

        self.store
            .put(&key, body, content_type)
            .await
            .map_err(|e| {
                error!("Failed to store image {}: {}", key, e);
                MediaError::Storage(e.to_string())
            })?;

        Ok(UploadedImage {
            url: self.public_url(&key),
            key,
        })
    }

    /// Remove every image referenced by `urls`, returning how many were removed
    ///
    /// URLs outside the public prefix and individual storage failures are
    /// logged and skipped; the remaining URLs are still processed.
    pub async fn delete_images(&self, urls: &[String]) -> usize {
        let mut removed = 0;

        for url in urls {
            let Some(key) = self.key_from_url(url) else {
                warn!("Skipping image outside the storage prefix: {}", url);
                continue;
            };

            match self.store.remove(key).await {
                Ok(()) => removed += 1,
                Err(e) => error!("Error deleting image {}: {}", key, e),
            }
        }

        info!("Removed {} of {} editor images", removed, urls.len());
        removed
    }

    /// Public URL of a stored object
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    /// Bucket-relative key of a public URL, if it points into this bucket
    pub fn key_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.public_base_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
    }

    /// `editor-<millis>-<random>` plus the original file's extension
    pub fn object_key(original_name: &str, timestamp_millis: i64) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        let extension = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default();

        format!("editor-{}-{}{}", timestamp_millis, &suffix[..8], extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::{collections::HashMap, sync::Mutex};

    const BASE: &str = "https://project.supabase.co/storage/v1/object/public/editor-images";

    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<HashMap<String, (Bytes, String)>>,
        failing_keys: Vec<String>,
    }

    #[async_trait]
    impl ImageStore for MemoryStore {
        async fn put(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), (body, content_type.to_string()));
            Ok(())
        }

        async fn remove(&self, key: &str) -> anyhow::Result<()> {
            if self.failing_keys.iter().any(|k| k == key) {
                anyhow::bail!("storage refused to delete {}", key);
            }
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[test]
    fn test_object_key_keeps_extension() {
        let key = ImageAssetManager::object_key("Screenshot 1.PNG", 1_700_000_000_000);
        assert!(key.starts_with("editor-1700000000000-"));
        assert!(key.ends_with(".png"));
        assert_eq!(key.len(), "editor-1700000000000-".len() + 8 + ".png".len());

        let bare = ImageAssetManager::object_key("blob", 1);
        assert_eq!(bare.len(), "editor-1-".len() + 8);
    }

    #[test]
    fn test_object_keys_do_not_collide_within_a_millisecond() {
        let a = ImageAssetManager::object_key("a.jpg", 42);
        let b = ImageAssetManager::object_key("a.jpg", 42);
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_from_url() {
        let manager = ImageAssetManager::new(Arc::new(MemoryStore::default()), &format!("{BASE}/"));
        assert_eq!(
            manager.key_from_url(&format!("{BASE}/editor-1-abc.png")),
            Some("editor-1-abc.png")
        );
        assert_eq!(manager.key_from_url("https://elsewhere.com/editor-1.png"), None);
        assert_eq!(manager.key_from_url(&format!("{BASE}/")), None);
        assert_eq!(manager.key_from_url(&format!("{BASE}evil/x.png")), None);
    }

    #[tokio::test]
    async fn test_upload_stores_bytes_and_returns_public_url() {
        let store = Arc::new(MemoryStore::default());
        let manager = ImageAssetManager::new(store.clone(), BASE);

        let uploaded = manager
            .upload_image(Bytes::from_static(b"\x89PNG"), "image/png", "shot.png")
            .await
            .unwrap();

        assert_eq!(uploaded.url, format!("{BASE}/{}", uploaded.key));
        let objects = store.objects.lock().unwrap();
        let (body, content_type) = objects.get(&uploaded.key).unwrap();
        assert_eq!(body.as_ref(), b"\x89PNG");
        assert_eq!(content_type, "image/png");
    }

    #[tokio::test]
    async fn test_empty_upload_is_rejected() {
        let manager = ImageAssetManager::new(Arc::new(MemoryStore::default()), BASE);
        let result = manager.upload_image(Bytes::new(), "image/png", "x.png").await;
        assert!(matches!(result, Err(MediaError::EmptyUpload)));
    }

    #[tokio::test]
    async fn test_delete_continues_past_failures() {
        let store = Arc::new(MemoryStore {
            failing_keys: vec!["editor-2.png".to_string()],
            ..MemoryStore::default()
        });
        for key in ["editor-1.png", "editor-2.png", "editor-3.png"] {
            store
                .put(key, Bytes::from_static(b"x"), "image/png")
                .await
                .unwrap();
        }
        let manager = ImageAssetManager::new(store.clone(), BASE);

        let urls = vec![
            format!("{BASE}/editor-1.png"),
            format!("{BASE}/editor-2.png"),
            "https://elsewhere.com/editor-9.png".to_string(),
            format!("{BASE}/editor-3.png"),
        ];
        let removed = manager.delete_images(&urls).await;

        assert_eq!(removed, 2);
        let objects = store.objects.lock().unwrap();
        assert!(!objects.contains_key("editor-1.png"));
        assert!(objects.contains_key("editor-2.png"));
        assert!(!objects.contains_key("editor-3.png"));
    }
}
