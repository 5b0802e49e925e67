//! Object storage for uploaded images and public image URLs.
//!
//! Files live in a local directory under generated keys
//! (`{prefix}/{uuid}.{ext}`) and are served at `/media`. When an image CDN is
//! configured, URLs go through it with resize and format parameters.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use crate::config::MediaConfig;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Accepted file extensions.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Errors from storing or removing media.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("file exceeds {max} bytes")]
    TooLarge { max: usize },

    #[error("empty upload")]
    Empty,

    #[error("file content does not match its extension")]
    ContentMismatch,

    #[error("invalid media key")]
    InvalidKey,

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Folder a file is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaPrefix {
    Products,
    Avatars,
}

impl MediaPrefix {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Avatars => "avatars",
        }
    }
}

/// CDN transformation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageTransform {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub format: &'static str,
}

impl ImageTransform {
    /// Catalog grid tiles.
    pub const CARD: Self = Self {
        width: 600,
        height: 600,
        quality: 80,
        format: "webp",
    };

    /// Product detail and Open Graph images.
    pub const LARGE: Self = Self {
        width: 1200,
        height: 1200,
        quality: 85,
        format: "webp",
    };

    /// Cart thumbnails and avatars.
    pub const THUMB: Self = Self {
        width: 160,
        height: 160,
        quality: 75,
        format: "webp",
    };
}

/// Local media store.
#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
    cdn_url: Option<String>,
}

impl MediaStore {
    /// Create a store from configuration.
    #[must_use]
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            cdn_url: config
                .cdn_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_owned()),
        }
    }

    /// Directory served at `/media`.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate and write an upload, returning its new key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the file type, size or content is rejected,
    /// or if the write fails.
    pub async fn save(
        &self,
        prefix: MediaPrefix,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let ext = validate_upload(filename, bytes)?;
        let key = format!("{}/{}.{ext}", prefix.as_str(), Uuid::new_v4());
        let path = self.dir.join(&key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        tracing::info!(key = %key, size = bytes.len(), "Stored upload");
        Ok(key)
    }

    /// Remove a stored file. Missing files are ignored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidKey` for keys that are not store keys,
    /// or `StorageError::Io` if removal fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if !is_valid_key(key) {
            return Err(StorageError::InvalidKey);
        }
        match tokio::fs::remove_file(self.dir.join(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Public URL of a stored image.
    #[must_use]
    pub fn url(&self, key: &str, transform: ImageTransform) -> String {
        image_url(self.cdn_url.as_deref(), key, transform)
    }
}

/// Build a public image URL.
///
/// ```
/// use ballonwerk_storefront::services::storage::{ImageTransform, image_url};
///
/// assert_eq!(
///     image_url(Some("https://ik.example.net/bw"), "products/a.png", ImageTransform::THUMB),
///     "https://ik.example.net/bw/tr:w-160,h-160,q-75,f-webp/products/a.png"
/// );
/// assert_eq!(image_url(None, "products/a.png", ImageTransform::THUMB), "/media/products/a.png");
/// ```
#[must_use]
pub fn image_url(cdn_url: Option<&str>, key: &str, transform: ImageTransform) -> String {
    let key = key.trim_start_matches('/');
    match cdn_url {
        Some(cdn) => format!(
            "{cdn}/tr:w-{},h-{},q-{},f-{}/{key}",
            transform.width, transform.height, transform.quality, transform.format
        ),
        None => format!("/media/{key}"),
    }
}

/// Check name, size and magic bytes; returns the normalised extension.
fn validate_upload(filename: &str, bytes: &[u8]) -> Result<&'static str, StorageError> {
    if bytes.is_empty() {
        return Err(StorageError::Empty);
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(StorageError::TooLarge {
            max: MAX_UPLOAD_BYTES,
        });
    }

    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let ext = ALLOWED_EXTENSIONS
        .iter()
        .copied()
        .find(|allowed| *allowed == ext)
        .ok_or(StorageError::UnsupportedType(ext))?;

    let matches = match ext {
        "jpg" | "jpeg" => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
        "png" => bytes.starts_with(b"\x89PNG\r\n\x1a\n"),
        "webp" => bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(b"WEBP".as_slice()),
        _ => false,
    };
    if !matches {
        return Err(StorageError::ContentMismatch);
    }

    Ok(ext)
}

/// Keys are `{prefix}/{name}` with no traversal or absolute components.
fn is_valid_key(key: &str) -> bool {
    let mut parts = key.split('/');
    let (Some(prefix), Some(name), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    matches!(prefix, "products" | "avatars")
        && !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n0000";

    fn temp_store() -> MediaStore {
        let dir = std::env::temp_dir().join(format!("bw-media-{}", Uuid::new_v4()));
        MediaStore::new(&MediaConfig { dir, cdn_url: None })
    }

    #[test]
    fn test_validate_upload() {
        assert_eq!(validate_upload("Heart.PNG", PNG).unwrap(), "png");
        assert!(matches!(
            validate_upload("heart.gif", b"GIF89a"),
            Err(StorageError::UnsupportedType(_))
        ));
        assert!(matches!(
            validate_upload("heart.jpg", PNG),
            Err(StorageError::ContentMismatch)
        ));
        assert!(matches!(
            validate_upload("heart.png", &[]),
            Err(StorageError::Empty)
        ));
        let big = vec![0xFF; MAX_UPLOAD_BYTES + 1];
        assert!(matches!(
            validate_upload("big.jpg", &big),
            Err(StorageError::TooLarge { .. })
        ));
        let webp = b"RIFF\0\0\0\0WEBPVP8 ";
        assert_eq!(validate_upload("a.webp", webp).unwrap(), "webp");
    }

    #[test]
    fn test_key_validation() {
        assert!(is_valid_key("products/0d3c-aa.png"));
        assert!(!is_valid_key("products/../secret"));
        assert!(!is_valid_key("/etc/passwd"));
        assert!(!is_valid_key("other/a.png"));
        assert!(!is_valid_key("products/a/b.png"));
    }

    #[test]
    fn test_cdn_url_trailing_slash_is_trimmed() {
        let store = MediaStore::new(&MediaConfig {
            dir: PathBuf::from("./media"),
            cdn_url: Some("https://cdn.example.net/bw/".to_string()),
        });
        assert_eq!(
            store.url("avatars/x.webp", ImageTransform::CARD),
            "https://cdn.example.net/bw/tr:w-600,h-600,q-80,f-webp/avatars/x.webp"
        );
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let store = temp_store();
        let key = store
            .save(MediaPrefix::Avatars, "me.png", PNG)
            .await
            .unwrap();
        assert!(key.starts_with("avatars/") && key.ends_with(".png"));
        assert!(store.dir().join(&key).exists());

        store.delete(&key).await.unwrap();
        assert!(!store.dir().join(&key).exists());
        store.delete(&key).await.unwrap();

        let _ = tokio::fs::remove_dir_all(store.dir()).await;
    }
}
