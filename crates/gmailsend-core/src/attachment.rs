//! Uploaded attachment files.
//!
//! Uploads are written to uniquely named temp files under the upload
//! directory. A file belongs to the request that uploaded it and is removed
//! once the send attempt finishes, whatever its outcome.

use crate::service::SendError;
use chrono::Utc;
use gmailsend_mime::{Attachment, resolve_mime_type};
use rand::Rng;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Content types accepted for upload.
pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/jpeg",
    "image/png",
    "image/gif",
    "text/plain",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// A temp file could not be removed. Logged, never returned to callers.
#[derive(Debug, thiserror::Error)]
#[error("failed to delete attachment file {path}: {source}")]
pub struct FileCleanupError {
    /// Temp file path.
    pub path: PathBuf,
    /// Underlying error.
    pub source: std::io::Error,
}

/// An uploaded attachment stored in a temp file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentFile {
    /// Filename as uploaded by the browser.
    pub original_name: String,
    /// Content type declared by the upload.
    pub mime_type: String,
    /// Temp file location.
    pub path: PathBuf,
    /// File size in bytes.
    pub size_bytes: u64,
}

impl AttachmentFile {
    /// Reads the temp file into an in-memory attachment.
    ///
    /// The content type is resolved from the original filename, falling
    /// back to the declared upload type.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::AttachmentRead`] if the file cannot be read.
    pub async fn read_to_attachment(&self) -> Result<Attachment, SendError> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|source| SendError::AttachmentRead {
                name: self.original_name.clone(),
                source,
            })?;
        let content_type = resolve_mime_type(&self.original_name, Some(&self.mime_type));
        Ok(Attachment::new(&self.original_name, content_type, data))
    }

    /// Deletes the temp file. A file that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be deleted.
    pub fn remove(&self) -> Result<(), FileCleanupError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Removed attachment file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(FileCleanupError {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Owns attachment temp files and deletes them when dropped.
///
/// Dropping happens exactly once, on success, on error, and when the owning
/// request future is cancelled.
#[derive(Debug, Default)]
pub struct AttachmentCleanup {
    files: Vec<AttachmentFile>,
}

impl AttachmentCleanup {
    /// Takes ownership of the given files.
    #[must_use]
    pub const fn new(files: Vec<AttachmentFile>) -> Self {
        Self { files }
    }

    /// Adds a file.
    pub fn push(&mut self, file: AttachmentFile) {
        self.files.push(file);
    }

    /// Returns the guarded files in upload order.
    #[must_use]
    pub fn files(&self) -> &[AttachmentFile] {
        &self.files
    }

    /// Returns the number of guarded files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if no files are guarded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Releases the files without deleting them, handing responsibility
    /// to the caller.
    #[must_use]
    pub fn into_files(mut self) -> Vec<AttachmentFile> {
        std::mem::take(&mut self.files)
    }
}

impl Drop for AttachmentCleanup {
    fn drop(&mut self) {
        for file in self.files.drain(..) {
            if let Err(e) = file.remove() {
                warn!("{e}");
            }
        }
    }
}

/// Limits applied to uploads before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Maximum number of files per message.
    pub max_files: usize,
    /// Maximum size of a single file in bytes.
    pub max_file_bytes: usize,
    /// Accepted declared content types.
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_MAX_ATTACHMENTS,
            crate::config::DEFAULT_MAX_ATTACHMENT_BYTES,
        )
    }
}

impl UploadPolicy {
    /// Creates a policy with the default allow-list.
    #[must_use]
    pub fn new(max_files: usize, max_file_bytes: usize) -> Self {
        Self {
            max_files,
            max_file_bytes,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Checks that one more file fits. `count` includes the new file.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::AttachmentRejected`] when over the limit.
    pub fn check_count(&self, count: usize) -> Result<(), SendError> {
        if count > self.max_files {
            return Err(SendError::AttachmentRejected(format!(
                "at most {} attachments are allowed",
                self.max_files
            )));
        }
        Ok(())
    }

    /// Checks the declared content type against the allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::AttachmentRejected`] for unlisted types.
    pub fn check_type(&self, mime_type: &str) -> Result<(), SendError> {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        if self.allowed_mime_types.iter().any(|t| *t == essence) {
            Ok(())
        } else {
            Err(SendError::AttachmentRejected(format!(
                "File type {mime_type} is not allowed"
            )))
        }
    }

    /// Checks a (possibly partial) file size against the limit.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::AttachmentTooLarge`] when over the limit.
    pub fn check_size(&self, name: &str, size: usize) -> Result<(), SendError> {
        if size > self.max_file_bytes {
            return Err(SendError::AttachmentTooLarge {
                name: name.to_string(),
                limit: self.max_file_bytes,
            });
        }
        Ok(())
    }
}

/// Directory that holds attachment temp files.
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    /// Creates a handle for the given directory. Nothing is created yet.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn ensure(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Returns a fresh temp file path, `<epoch-ms>-<random>.<ext>`, keeping
    /// the extension of the uploaded filename.
    #[must_use]
    pub fn unique_path(&self, original_name: &str) -> PathBuf {
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        let stem = format!("{}-{suffix}", Utc::now().timestamp_millis());
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()));
        match extension {
            Some(ext) => self.root.join(format!("{stem}.{ext}")),
            None => self.root.join(stem),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> AttachmentFile {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        AttachmentFile {
            original_name: name.to_string(),
            mime_type: "text/plain".to_string(),
            path,
            size_bytes: contents.len() as u64,
        }
    }

    #[tokio::test]
    async fn test_read_to_attachment_resolves_type_from_extension() {
        let dir = TempDir::new().unwrap();
        let mut file = write_file(&dir, "scan.pdf", b"%PDF-1.4");
        file.mime_type = "application/octet-stream".to_string();

        let attachment = file.read_to_attachment().await.unwrap();
        assert_eq!(attachment.filename, "scan.pdf");
        assert_eq!(attachment.content_type, "application/pdf");
        assert_eq!(attachment.data, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_read_to_attachment_falls_back_to_declared_type() {
        let dir = TempDir::new().unwrap();
        let mut file = write_file(&dir, "README", b"hi");
        file.mime_type = "text/plain".to_string();

        let attachment = file.read_to_attachment().await.unwrap();
        assert_eq!(attachment.content_type, "text/plain");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let file = write_file(&dir, "gone.txt", b"x");
        std::fs::remove_file(&file.path).unwrap();

        assert!(matches!(
            file.read_to_attachment().await,
            Err(SendError::AttachmentRead { .. })
        ));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let file = write_file(&dir, "a.txt", b"x");

        file.remove().unwrap();
        assert!(!file.path.exists());
        file.remove().unwrap();
    }

    #[test]
    fn test_cleanup_guard_removes_on_drop() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.txt", b"a");
        let b = write_file(&dir, "b.txt", b"b");

        {
            let mut guard = AttachmentCleanup::default();
            guard.push(a.clone());
            guard.push(b.clone());
            assert_eq!(guard.len(), 2);
        }

        assert!(!a.path.exists());
        assert!(!b.path.exists());
    }

    #[test]
    fn test_cleanup_guard_into_files_keeps_files() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.txt", b"a");

        let files = AttachmentCleanup::new(vec![a.clone()]).into_files();
        assert_eq!(files, vec![a.clone()]);
        assert!(a.path.exists());
    }

    #[test]
    fn test_policy_count() {
        let policy = UploadPolicy::default();
        assert!(policy.check_count(5).is_ok());
        assert!(matches!(
            policy.check_count(6),
            Err(SendError::AttachmentRejected(_))
        ));
    }

    #[test]
    fn test_policy_type() {
        let policy = UploadPolicy::default();
        assert!(policy.check_type("application/pdf").is_ok());
        assert!(policy.check_type("Text/Plain; charset=utf-8").is_ok());
        let err = policy.check_type("application/x-msdownload").unwrap_err();
        assert_eq!(
            err.to_string(),
            "File type application/x-msdownload is not allowed"
        );
    }

    #[test]
    fn test_policy_size() {
        let policy = UploadPolicy::new(5, 10);
        assert!(policy.check_size("a", 10).is_ok());
        assert!(matches!(
            policy.check_size("a", 11),
            Err(SendError::AttachmentTooLarge { limit: 10, .. })
        ));
    }

    #[test]
    fn test_unique_path_keeps_extension() {
        let dir = UploadDir::new("/tmp/uploads");
        let a = dir.unique_path("report.final.pdf");
        let b = dir.unique_path("report.final.pdf");

        assert_ne!(a, b);
        assert!(a.starts_with("/tmp/uploads"));
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("pdf"));
        assert!(dir.unique_path("../../etc/passwd").starts_with("/tmp/uploads"));
        assert!(dir.unique_path("noext").extension().is_none());
    }

    #[tokio::test]
    async fn test_ensure_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = UploadDir::new(tmp.path().join("uploads"));
        dir.ensure().await.unwrap();
        assert!(dir.root().is_dir());
    }
}
