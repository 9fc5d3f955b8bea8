use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::{validate_object_path, BlobStorage, UploadRequest};
use crate::auth::Session;
use crate::error::StorageError;

/// Stores objects under `<root>/<bucket>/<path>` on the local filesystem.
pub struct FilesystemStorage {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl FilesystemStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            public_base_url: None,
        }
    }

    /// Public URLs become `<base>/<bucket>/<path>` instead of `file://` URLs.
    pub fn with_public_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.public_base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn object_file(&self, bucket: &str, path: &str) -> PathBuf {
        let mut file = self.root.join(bucket);
        for segment in path.split('/') {
            file.push(segment);
        }
        file
    }
}

#[async_trait]
impl BlobStorage for FilesystemStorage {
    async fn upload(
        &self,
        _session: &Session,
        request: UploadRequest<'_>,
    ) -> Result<String, StorageError> {
        validate_object_path(request.path)?;
        let file_path = self.object_file(request.bucket, request.path);

        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        // create_new fails atomically if the object is already there.
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists {
                    bucket: request.bucket.to_string(),
                    path: request.path.to_string(),
                });
            }
            Err(e) => {
                return Err(StorageError::WriteFile {
                    path: file_path,
                    source: e,
                });
            }
        };

        file.write_all(request.bytes)
            .await
            .map_err(|e| StorageError::WriteFile {
                path: file_path.clone(),
                source: e,
            })?;
        file.flush().await.map_err(|e| StorageError::WriteFile {
            path: file_path.clone(),
            source: e,
        })?;

        log::debug!("Stored {} bytes at {}", request.bytes.len(), file_path.display());
        Ok(request.path.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}/{}", base, bucket, path),
            None => {
                let file = self.object_file(bucket, path);
                reqwest::Url::from_file_path(&file)
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| file.display().to_string())
            }
        }
    }
}
