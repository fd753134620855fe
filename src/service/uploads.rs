//! Asset uploads into object storage.
//!
//! Keys are `<path>/<prefix>-<unix millis>.<ext>`. Two uploads of the same
//! category within one millisecond get the same key; the second is then
//! refused by the storage backend. Uploaded objects are never cleaned up,
//! even when the form that referenced them is discarded.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::backend::{AccessToken, StorageBackend};
use crate::error::SiteError;

/// What an upload is for; selects bucket, path and file-name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadCategory {
    /// Company logo (site settings `logo_url`).
    Logo,
    /// Team member photo (`avatar_url`).
    Avatar,
}

impl UploadCategory {
    const fn path(self) -> &'static str {
        match self {
            Self::Logo => "site",
            Self::Avatar => "team",
        }
    }

    const fn prefix(self) -> &'static str {
        match self {
            Self::Logo => "logo",
            Self::Avatar => "avatar",
        }
    }

    /// Form field the resulting URL is written into.
    #[must_use]
    pub const fn target_field(self) -> &'static str {
        match self {
            Self::Logo => "logo_url",
            Self::Avatar => "avatar_url",
        }
    }
}

/// A stored upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    /// Bucket the object landed in.
    pub bucket: String,
    /// Object key inside the bucket.
    pub key: String,
    /// Publicly resolvable URL.
    pub public_url: String,
}

/// Uploads files into the logo and avatar buckets.
#[derive(Debug, Clone)]
pub struct Uploader {
    storage: Arc<dyn StorageBackend>,
    logo_bucket: String,
    avatar_bucket: String,
}

impl Uploader {
    /// Creates an uploader over `storage`.
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        logo_bucket: impl Into<String>,
        avatar_bucket: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            logo_bucket: logo_bucket.into(),
            avatar_bucket: avatar_bucket.into(),
        }
    }

    fn bucket(&self, category: UploadCategory) -> &str {
        match category {
            UploadCategory::Logo => &self.logo_bucket,
            UploadCategory::Avatar => &self.avatar_bucket,
        }
    }

    /// Uploads `bytes` stamped with the current time.
    ///
    /// # Errors
    ///
    /// See [`Uploader::upload_at`].
    pub async fn upload(
        &self,
        auth: Option<&AccessToken>,
        category: UploadCategory,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredObject, SiteError> {
        self.upload_at(auth, category, file_name, bytes, Utc::now().timestamp_millis())
            .await
    }

    /// Uploads `bytes` under a key stamped with `millis`.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Validation`] for an empty file and
    /// [`SiteError::Backend`] when storage refuses the object.
    pub async fn upload_at(
        &self,
        auth: Option<&AccessToken>,
        category: UploadCategory,
        file_name: &str,
        bytes: Vec<u8>,
        millis: i64,
    ) -> Result<StoredObject, SiteError> {
        if bytes.is_empty() {
            return Err(SiteError::validation("Please choose a non-empty file"));
        }
        let key = object_key(category, file_name, millis);
        let content_type = mime_guess::from_path(file_name).first_or_octet_stream();
        let bucket = self.bucket(category);
        let size = bytes.len();

        self.storage
            .upload(auth, bucket, &key, bytes, content_type.essence_str())
            .await?;
        tracing::info!(bucket, key = %key, size, "asset uploaded");

        Ok(StoredObject {
            bucket: bucket.to_string(),
            public_url: self.storage.public_url(bucket, &key),
            key,
        })
    }
}

/// `<path>/<prefix>-<millis>.<ext>`; the extension is taken from
/// `file_name`, lowercased, defaulting to `bin`.
fn object_key(category: UploadCategory, file_name: &str, millis: i64) -> String {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map_or_else(|| "bin".to_string(), str::to_ascii_lowercase);
    format!("{}/{}-{millis}.{ext}", category.path(), category.prefix())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;

    fn uploader(backend: &Arc<MemoryBackend>) -> Uploader {
        Uploader::new(
            Arc::clone(backend) as Arc<dyn StorageBackend>,
            "logos",
            "avatars",
        )
    }

    #[test]
    fn keys_follow_category_layout() {
        assert_eq!(
            object_key(UploadCategory::Logo, "Brand.PNG", 1_732_000_000_000),
            "site/logo-1732000000000.png"
        );
        assert_eq!(
            object_key(UploadCategory::Avatar, "photo", 7),
            "team/avatar-7.bin"
        );
    }

    #[tokio::test]
    async fn distinct_timestamps_give_distinct_urls() {
        let backend = Arc::new(MemoryBackend::new());
        let up = uploader(&backend);
        let Ok(first) = up
            .upload_at(None, UploadCategory::Avatar, "a.jpg", vec![1, 2, 3], 1000)
            .await
        else {
            panic!("first upload failed");
        };
        let Ok(second) = up
            .upload_at(None, UploadCategory::Avatar, "a.jpg", vec![4, 5, 6], 1001)
            .await
        else {
            panic!("second upload failed");
        };
        assert_ne!(first.key, second.key);
        assert_ne!(first.public_url, second.public_url);
        assert_eq!(first.bucket, "avatars");

        let stored = backend.object("avatars", &first.key).await;
        assert_eq!(stored, Some((vec![1, 2, 3], "image/jpeg".to_string())));
    }

    #[tokio::test]
    async fn same_millisecond_collides() {
        let backend = Arc::new(MemoryBackend::new());
        let up = uploader(&backend);
        let Ok(_) = up
            .upload_at(None, UploadCategory::Logo, "logo.svg", vec![1], 42)
            .await
        else {
            panic!("first upload failed");
        };
        let second = up
            .upload_at(None, UploadCategory::Logo, "logo.svg", vec![2], 42)
            .await;
        assert!(matches!(second, Err(SiteError::Backend(_))));
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let backend = Arc::new(MemoryBackend::new());
        let result = uploader(&backend)
            .upload(None, UploadCategory::Logo, "logo.png", Vec::new())
            .await;
        assert!(matches!(result, Err(SiteError::Validation(_))));
    }
}
