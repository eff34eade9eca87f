//! Receipt photo storage on the local filesystem.
//!
//! Files live under `<root>/expenses/<folder>/<file>` and are served at
//! `/uploads/expenses/<folder>/<file>`. Writes are not coordinated with the
//! database: a file may exist without being referenced and a reference may
//! point at a file that is gone. Both are tolerated.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::UploadConfig;

/// URL prefix the upload root is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

const EXPENSES_DIR: &str = "expenses";

/// URL prefix expense attachment folders are served under.
pub const EXPENSES_PUBLIC_PREFIX: &str = "/uploads/expenses";

const ALLOWED_CONTENT_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Errors from attachment storage.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// Folder ID or public path is not acceptable.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// No files were supplied.
    #[error("no files uploaded")]
    NoFiles,

    /// Too many files in one upload.
    #[error("at most {max} files may be uploaded at once")]
    TooManyFiles {
        /// Configured limit.
        max: usize,
    },

    /// File is not a JPEG or PNG.
    #[error("file type not allowed: {0}. Only JPEG and PNG are allowed")]
    UnsupportedType(String),

    /// File exceeds the per-file size limit.
    #[error("file size exceeds {max_bytes} bytes for {name}")]
    TooLarge {
        /// Offending file name.
        name: String,
        /// Configured limit.
        max_bytes: usize,
    },

    /// Filesystem failure.
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

impl AttachmentError {
    /// Whether the error was caused by the request rather than the server.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// A file received from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name.
    pub file_name: String,
    /// Declared MIME type.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Outcome of removing a single attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The file was deleted.
    Removed,
    /// The file was already gone.
    Missing,
}

/// Filesystem-backed attachment store.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
    max_file_bytes: usize,
    max_files: usize,
}

impl AttachmentStore {
    /// Create a store from upload configuration.
    #[must_use]
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            root: config.root.clone(),
            max_file_bytes: config.max_file_bytes,
            max_files: config.max_files,
        }
    }

    /// Upload root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate and write `files` into the folder for `folder_id`.
    ///
    /// Every file is validated before anything is written, so a rejected
    /// upload leaves the disk untouched. Returns the public paths in input
    /// order.
    ///
    /// # Errors
    ///
    /// Returns a client error for a bad folder ID, file count, type or size,
    /// and `AttachmentError::Io` if writing fails.
    #[instrument(skip(self, files), fields(folder_id = %folder_id, count = files.len()))]
    pub async fn save(
        &self,
        folder_id: &str,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<String>, AttachmentError> {
        let folder_id = validate_segment(folder_id)?;
        if files.is_empty() {
            return Err(AttachmentError::NoFiles);
        }
        if files.len() > self.max_files {
            return Err(AttachmentError::TooManyFiles {
                max: self.max_files,
            });
        }

        let mut prepared = Vec::with_capacity(files.len());
        for file in files {
            let allowed = file
                .content_type
                .as_deref()
                .is_some_and(|ct| ALLOWED_CONTENT_TYPES.contains(&ct));
            if !allowed {
                return Err(AttachmentError::UnsupportedType(file.file_name));
            }
            if file.bytes.len() > self.max_file_bytes {
                return Err(AttachmentError::TooLarge {
                    name: file.file_name,
                    max_bytes: self.max_file_bytes,
                });
            }
            let name = sanitize_file_name(&file.file_name)
                .ok_or_else(|| AttachmentError::InvalidPath(file.file_name.clone()))?;
            prepared.push((name, file.bytes));
        }

        let dir = self.folder_path(folder_id);
        tokio::fs::create_dir_all(&dir).await?;

        let mut paths = Vec::with_capacity(prepared.len());
        for (name, bytes) in prepared {
            tokio::fs::write(dir.join(&name), bytes).await?;
            paths.push(format!("{PUBLIC_PREFIX}/{EXPENSES_DIR}/{folder_id}/{name}"));
        }

        info!(count = paths.len(), "Stored attachments");
        Ok(paths)
    }

    /// Delete the file behind a public attachment path.
    ///
    /// # Errors
    ///
    /// Returns `AttachmentError::InvalidPath` if the path is not an expense
    /// attachment, and `AttachmentError::Io` for failures other than the
    /// file already being gone.
    #[instrument(skip(self))]
    pub async fn remove(&self, public_path: &str) -> Result<Removal, AttachmentError> {
        let file = self.resolve_public_path(public_path)?;
        match tokio::fs::remove_file(&file).await {
            Ok(()) => Ok(Removal::Removed),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %file.display(), "Attachment already missing on disk");
                Ok(Removal::Missing)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the whole folder for `folder_id`. A missing folder is not an error.
    ///
    /// # Errors
    ///
    /// Returns `AttachmentError::InvalidPath` for a bad folder ID and
    /// `AttachmentError::Io` if removal fails.
    #[instrument(skip(self))]
    pub async fn remove_folder(&self, folder_id: &str) -> Result<(), AttachmentError> {
        let dir = self.folder_path(validate_segment(folder_id)?);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Directory holding every expense attachment folder.
    #[must_use]
    pub fn expenses_dir(&self) -> PathBuf {
        self.root.join(EXPENSES_DIR)
    }

    fn folder_path(&self, folder_id: &str) -> PathBuf {
        self.expenses_dir().join(folder_id)
    }

    fn resolve_public_path(&self, public_path: &str) -> Result<PathBuf, AttachmentError> {
        let invalid = || AttachmentError::InvalidPath(public_path.to_owned());
        let rest = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|p| p.strip_prefix('/'))
            .and_then(|p| p.strip_prefix(EXPENSES_DIR))
            .and_then(|p| p.strip_prefix('/'))
            .ok_or_else(invalid)?;
        let (folder, name) = rest.split_once('/').ok_or_else(invalid)?;
        let folder = validate_segment(folder).map_err(|_| invalid())?;
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(invalid());
        }
        Ok(self.folder_path(folder).join(name))
    }
}

/// Folder IDs must be a single safe path segment.
fn validate_segment(segment: &str) -> Result<&str, AttachmentError> {
    let ok = !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(segment)
    } else {
        Err(AttachmentError::InvalidPath(segment.to_owned()))
    }
}

/// Whitespace becomes `_`; path separators are dropped.
fn sanitize_file_name(raw: &str) -> Option<String> {
    let name: String = raw
        .chars()
        .filter(|c| !matches!(c, '/' | '\\'))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if name.is_empty() || name.chars().all(|c| c == '.') {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store(root: &Path) -> AttachmentStore {
        AttachmentStore::new(&UploadConfig {
            root: root.to_path_buf(),
            max_file_bytes: 8,
            max_files: 2,
        })
    }

    fn png(name: &str, len: usize) -> UploadedFile {
        UploadedFile {
            file_name: name.to_owned(),
            content_type: Some("image/png".to_owned()),
            bytes: vec![0; len],
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(
            sanitize_file_name("my receipt 1.png").as_deref(),
            Some("my_receipt_1.png")
        );
        assert_eq!(
            sanitize_file_name("../../etc/passwd").as_deref(),
            Some("....etcpasswd")
        );
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name(""), None);
    }

    #[tokio::test]
    async fn test_save_writes_files_and_returns_public_paths() {
        let dir = tempfile::tempdir().unwrap();
        let attachments = store(dir.path());
        let paths = attachments
            .save("abc-123", vec![png("nota 1.png", 4)])
            .await
            .unwrap();
        assert_eq!(paths, vec!["/uploads/expenses/abc-123/nota_1.png"]);
        assert!(dir.path().join("expenses/abc-123/nota_1.png").exists());
    }

    #[tokio::test]
    async fn test_save_validates_everything_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let attachments = store(dir.path());

        let err = attachments
            .save("f1", vec![png("ok.png", 4), png("big.png", 9)])
            .await
            .unwrap_err();
        assert!(matches!(err, AttachmentError::TooLarge { .. }));

        let mut gif = png("anim.gif", 1);
        gif.content_type = Some("image/gif".to_owned());
        let err = attachments.save("f1", vec![gif]).await.unwrap_err();
        assert!(matches!(err, AttachmentError::UnsupportedType(_)));

        let err = attachments
            .save("f1", vec![png("a.png", 1), png("b.png", 1), png("c.png", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, AttachmentError::TooManyFiles { max: 2 }));

        let err = attachments.save("f1", vec![]).await.unwrap_err();
        assert!(matches!(err, AttachmentError::NoFiles));

        let err = attachments
            .save("../escape", vec![png("a.png", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, AttachmentError::InvalidPath(_)));

        assert!(!dir.path().join("expenses").exists());
    }

    #[tokio::test]
    async fn test_remove_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let attachments = store(dir.path());
        let paths = attachments
            .save("f1", vec![png("a.png", 1)])
            .await
            .unwrap();

        assert_eq!(
            attachments.remove(&paths[0]).await.unwrap(),
            Removal::Removed
        );
        assert_eq!(
            attachments.remove(&paths[0]).await.unwrap(),
            Removal::Missing
        );
    }

    #[tokio::test]
    async fn test_remove_rejects_paths_outside_expense_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let attachments = store(dir.path());
        for path in [
            "/etc/passwd",
            "/uploads/other/f1/a.png",
            "/uploads/expenses/../../secret",
            "/uploads/expenses/f1/../a.png",
            "/uploads/expenses/f1",
        ] {
            let err = attachments.remove(path).await.unwrap_err();
            assert!(matches!(err, AttachmentError::InvalidPath(_)), "{path}");
        }
    }

    #[tokio::test]
    async fn test_remove_folder_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let attachments = store(dir.path());
        attachments
            .save("f1", vec![png("a.png", 1)])
            .await
            .unwrap();
        attachments.remove_folder("f1").await.unwrap();
        assert!(!dir.path().join("expenses/f1").exists());
        attachments.remove_folder("f1").await.unwrap();
    }
}
