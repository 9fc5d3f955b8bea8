use futures_util::future::try_join_all;
use uuid::Uuid;

use super::error::PipelineError;
use crate::auth::Session;
use crate::intake::UploadedDocument;
use crate::sanitize::redact_storage_path;
use crate::storage::{object_path, BlobStorage, UploadRequest};

/// Uploads every document concurrently under `prefix`.
///
/// All or nothing: the first failure is returned and no document gets a
/// storage path. Objects that did make it are left in storage. Each attempt
/// uses fresh object ids, so a retry never collides with them.
pub async fn upload_all(
    storage: &dyn BlobStorage,
    session: &Session,
    bucket: &str,
    prefix: &str,
    documents: &mut [UploadedDocument],
) -> Result<(), PipelineError> {
    let paths: Vec<String> = documents
        .iter()
        .map(|doc| object_path(prefix, Uuid::new_v4(), &doc.filename))
        .collect();

    let uploads = documents.iter().zip(&paths).map(|(doc, path)| async move {
        let stored = storage
            .upload(
                session,
                UploadRequest {
                    bucket,
                    path,
                    bytes: &doc.bytes,
                    content_type: &doc.media_type,
                },
            )
            .await
            .map_err(|source| PipelineError::Upload {
                file_name: doc.filename.clone(),
                source,
            })?;
        tracing::debug!(path = %redact_storage_path(&stored), "Uploaded document");
        Ok::<_, PipelineError>(stored)
    });

    let stored = try_join_all(uploads).await?;

    for (doc, path) in documents.iter_mut().zip(stored) {
        doc.storage_path = Some(path);
    }
    Ok(())
}
