//! Object storage on the hosted backend's storage API.

use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};

use super::{validate_object_path, BlobStorage, UploadRequest};
use crate::auth::Session;
use crate::error::StorageError;
use crate::sanitize::{redact_storage_path, truncate_error_body};

pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    anon_key: SecretString,
}

impl SupabaseStorage {
    pub fn new(client: Client, base_url: &str, anon_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        }
    }

    /// `{base}/storage/v1/object/{scope...}/{bucket}/{path}` with every
    /// segment percent-encoded.
    fn object_url(&self, scope: &[&str], bucket: &str, path: &str) -> Option<Url> {
        let mut url = Url::parse(&self.base_url).ok()?;
        {
            let mut segments = url.path_segments_mut().ok()?;
            segments
                .pop_if_empty()
                .extend(["storage", "v1", "object"])
                .extend(scope)
                .push(bucket)
                .extend(path.split('/'));
        }
        Some(url)
    }
}

#[async_trait]
impl BlobStorage for SupabaseStorage {
    async fn upload(
        &self,
        session: &Session,
        request: UploadRequest<'_>,
    ) -> Result<String, StorageError> {
        validate_object_path(request.path)?;
        let url = self
            .object_url(&[], request.bucket, request.path)
            .ok_or_else(|| StorageError::InvalidPath {
                path: request.path.to_string(),
                reason: format!("cannot be joined onto '{}'", self.base_url),
            })?;

        let response = self
            .client
            .post(url)
            .header("Authorization", session.bearer())
            .header("apikey", self.anon_key.expose_secret())
            .header("Content-Type", request.content_type)
            .header("x-upsert", "false")
            .body(request.bytes.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // The storage API reports an existing object as 409 (or 400 with
            // a "Duplicate" error on older deployments).
            if status.as_u16() == 409 || body.contains("Duplicate") {
                return Err(StorageError::AlreadyExists {
                    bucket: request.bucket.to_string(),
                    path: request.path.to_string(),
                });
            }
            return Err(StorageError::Rejected {
                path: redact_storage_path(request.path),
                status: status.as_u16(),
                body: truncate_error_body(&body),
            });
        }

        Ok(request.path.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        match self.object_url(&["public"], bucket, path) {
            Some(url) => url.to_string(),
            None => format!(
                "{}/storage/v1/object/public/{}/{}",
                self.base_url, bucket, path
            ),
        }
    }
}
