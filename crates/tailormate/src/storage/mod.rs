//! Blob storage for uploaded documents.

pub mod filesystem;
pub mod supabase;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::Session;
use crate::error::StorageError;

pub use filesystem::FilesystemStorage;
pub use supabase::SupabaseStorage;

/// One object to store. Objects are never overwritten.
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    pub bucket: &'a str,
    pub path: &'a str,
    pub bytes: &'a [u8],
    pub content_type: &'a str,
}

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Stores the object and returns its path within the bucket.
    /// Fails with [`StorageError::AlreadyExists`] if the path is taken.
    async fn upload(
        &self,
        session: &Session,
        request: UploadRequest<'_>,
    ) -> Result<String, StorageError>;

    /// Publicly reachable URL of a stored object.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Builds `<prefix>/<id>-<filename>`. Path separators inside the filename
/// become `_` so the object stays directly under the prefix.
pub fn object_path(prefix: &str, id: Uuid, filename: &str) -> String {
    let safe_name: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{}/{}-{}", prefix.trim_end_matches('/'), id, safe_name)
}

/// Rejects paths that are empty, absolute or climb out of the bucket.
pub(crate) fn validate_object_path(path: &str) -> Result<(), StorageError> {
    let invalid = |reason: &str| StorageError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.is_empty() {
        return Err(invalid("empty path"));
    }
    if path.starts_with('/') || path.starts_with('\\') {
        return Err(invalid("absolute path"));
    }
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(invalid("parent directory segment"));
    }
    Ok(())
}
