//! Local-disk file storage for uploaded attachments.

use async_trait::async_trait;
use std::path::PathBuf;

use super::{FileStorage, StorageError};
use crate::intake::body::UploadedFile;

/// Writes objects to `<root>/<bucket>/<name>` and serves them under `public_base_url`.
pub struct LocalFileStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

fn check_segment(segment: &str) -> Result<(), StorageError> {
    let unsafe_segment = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0']);
    if unsafe_segment {
        return Err(StorageError::InvalidName(segment.to_string()));
    }
    Ok(())
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn upload(&self, bucket: &str, name: &str, file: &UploadedFile) -> Result<String, StorageError> {
        check_segment(bucket)?;
        check_segment(name)?;

        let dir = self.root.join(bucket);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(name), &file.bytes).await?;

        tracing::debug!(bucket, name, bytes = file.bytes.len(), "Stored upload");
        Ok(format!("{}/{}/{}", self.public_base_url, bucket, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    fn pdf() -> UploadedFile {
        UploadedFile {
            filename: "cv.pdf".into(),
            content_type: "application/pdf".into(),
            bytes: Bytes::from_static(b"%PDF-1.4"),
        }
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path(), "http://localhost:8080/files/");

        let url = storage.upload("resumes", "1-cv.pdf", &pdf()).await.unwrap();
        assert_eq!(url, "http://localhost:8080/files/resumes/1-cv.pdf");

        let written = std::fs::read(dir.path().join("resumes/1-cv.pdf")).unwrap();
        assert_eq!(written, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path(), "http://x");

        for name in ["..", "a/b.pdf", ""] {
            let err = storage.upload("resumes", name, &pdf()).await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidName(_)));
        }
    }
}
