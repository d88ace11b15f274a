// Media storage: pass-through of uploaded files to local disk.
// Files get a unique generated name and are served statically from the
// upload directory.

use rand::Rng;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::core::current_time_millis;
use crate::error::{AppError, AppResult};

/// Accepted upload content types: images, audio and video
const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
    "audio/mp3",
    "video/mp4",
    "video/mpeg",
    "video/quicktime",
];

/// Maximum upload size: 100 MB
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Metadata returned for a stored upload
#[derive(Debug, Clone, Serialize)]
pub struct StoredMedia {
    pub url: String,
    pub filename: String,
    pub mimetype: String,
    pub size: usize,
}

#[derive(Clone)]
pub struct MediaStorage {
    upload_dir: PathBuf,
}

impl MediaStorage {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub async fn ensure_upload_dir(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| {
                AppError::Internal(format!(
                    "Failed to create upload directory {}: {}",
                    self.upload_dir.display(),
                    e
                ))
            })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn is_allowed_mime(content_type: &str) -> bool {
        ALLOWED_MIME_TYPES.contains(&content_type)
    }

    /// Persist an uploaded file under a unique generated name
    pub async fn save(
        &self,
        field_name: &str,
        original_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> AppResult<StoredMedia> {
        if !Self::is_allowed_mime(content_type) {
            return Err(AppError::Validation("Invalid file type".to_string()));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::Validation("File too large".to_string()));
        }

        let filename = unique_filename(field_name, original_name);
        let path = self.upload_dir.join(&filename);
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            AppError::Internal(format!("Failed to write upload {}: {}", path.display(), e))
        })?;

        Ok(StoredMedia {
            url: format!("/uploads/{}", filename),
            filename,
            mimetype: content_type.to_string(),
            size: bytes.len(),
        })
    }
}

/// `<field>-<millis>-<random><ext>`, extension taken from the original name
/// when it looks safe
fn unique_filename(field_name: &str, original_name: &str) -> String {
    let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();
    format!("{}-{}-{}{}", field_name, current_time_millis(), suffix, ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_allow_list() {
        assert!(MediaStorage::is_allowed_mime("image/png"));
        assert!(MediaStorage::is_allowed_mime("audio/mpeg"));
        assert!(!MediaStorage::is_allowed_mime("application/x-msdownload"));
        assert!(!MediaStorage::is_allowed_mime("text/html"));
    }

    #[test]
    fn test_unique_filename_keeps_safe_extension() {
        let name = unique_filename("media", "track.MP3");
        assert!(name.starts_with("media-"));
        assert!(name.ends_with(".mp3"));

        let name = unique_filename("media", "../../etc/passwd");
        assert!(!name.contains('/'));
        assert!(!name.contains(".."));
    }

    #[tokio::test]
    async fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());
        storage.ensure_upload_dir().await.unwrap();

        let stored = storage
            .save("media", "cover.png", "image/png", b"not really a png")
            .await
            .unwrap();
        assert!(stored.url.starts_with("/uploads/"));
        assert_eq!(stored.size, 16);

        let on_disk = tokio::fs::read(dir.path().join(&stored.filename))
            .await
            .unwrap();
        assert_eq!(on_disk, b"not really a png");
    }

    #[tokio::test]
    async fn test_save_rejects_bad_mime() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());
        storage.ensure_upload_dir().await.unwrap();

        let result = storage
            .save("media", "evil.exe", "application/x-msdownload", b"mz")
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
