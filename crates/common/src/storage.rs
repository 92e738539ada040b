//! File storage for report attachments.

use std::path::PathBuf;

use crate::{AppError, AppResult};

/// Stored file metadata.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Storage key (generated filename).
    pub key: String,
    /// Path or URL the file can be retrieved from.
    pub path: String,
    /// File size in bytes.
    pub size: u64,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store a file under the given key.
    async fn store(&self, key: &str, data: &[u8]) -> AppResult<StoredFile>;

    /// Delete a file. Deleting a missing file is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }

    fn public_path(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn store(&self, key: &str, data: &[u8]) -> AppResult<StoredFile> {
        let path = self.base_path.join(key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        Ok(StoredFile {
            key: key.to_string(),
            path: self.public_path(key),
            size: data.len() as u64,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.base_path.join(key);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to delete file: {e}")))?;
        }
        Ok(())
    }
}

/// Reduce an uploaded filename to a safe basename.
///
/// Path components are dropped and anything outside `[A-Za-z0-9._-]` becomes
/// `_`. Leading dots are stripped so the result is never hidden or relative.
#[must_use]
pub fn sanitize_filename(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

/// Lowercased extension of a filename, if it has one.
#[must_use]
pub fn file_extension(name: &str) -> Option<String> {
    name.rfind('.')
        .filter(|&pos| pos > 0 && pos < name.len() - 1)
        .map(|pos| name[pos + 1..].to_ascii_lowercase())
}

/// Generate the storage key for an attachment.
///
/// The key embeds a millisecond timestamp followed by the sanitized original
/// name.
#[must_use]
pub fn generate_storage_key(original_name: &str) -> String {
    let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S%3f");
    format!("{timestamp}_{}", sanitize_filename(original_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_paths() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\photo.jpg"), "photo.jpg");
    }

    #[test]
    fn test_sanitize_replaces_unsafe_chars() {
        assert_eq!(sanitize_filename("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename(""), "file");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("scan.PDF").as_deref(), Some("pdf"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension(".bashrc"), None);
        assert_eq!(file_extension("trailing."), None);
    }

    #[test]
    fn test_generate_storage_key() {
        let key = generate_storage_key("evidence photo.jpg");
        assert!(key.ends_with("_evidence_photo.jpg"));
        assert!(key.split('_').next().is_some_and(|ts| ts.len() == 17));
    }

    #[tokio::test]
    async fn test_local_storage_round_trip() {
        let dir = std::env::temp_dir().join(format!("safenet-storage-{}", std::process::id()));
        let storage = LocalStorage::new(dir.clone(), "/uploads/".to_string());

        let stored = storage.store("a_test.txt", b"hello").await.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(stored.size, 5);
        assert_eq!(stored.path, "/uploads/a_test.txt");
        let path = dir.join("a_test.txt");
        assert!(tokio::fs::try_exists(&path).await.unwrap_or(false));

        storage.delete("a_test.txt").await.unwrap_or_else(|e| panic!("{e}"));
        assert!(!tokio::fs::try_exists(&path).await.unwrap_or(true));

        // Already gone.
        storage.delete("a_test.txt").await.unwrap_or_else(|e| panic!("{e}"));

        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
