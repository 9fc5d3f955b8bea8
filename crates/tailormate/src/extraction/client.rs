//! HTTP client for the document extraction edge function.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use super::types::ExtractionResult;
use crate::auth::Session;
use crate::error::ExtractionError;
use crate::sanitize::truncate_error_body;

/// Message used when the service fails without a body.
pub const EMPTY_FAILURE_MESSAGE: &str = "Edge function failed";

#[async_trait]
pub trait Extractor: Send + Sync {
    /// Parses the stored documents at `paths`. One result per document, at
    /// most; missing results are tolerated.
    async fn extract(
        &self,
        session: &Session,
        paths: &[String],
    ) -> Result<Vec<ExtractionResult>, ExtractionError>;
}

#[derive(Serialize)]
struct ExtractionRequest<'a> {
    files: &'a [String],
}

#[derive(Deserialize)]
struct ExtractionResponse {
    #[serde(default)]
    results: Option<Vec<ExtractionResult>>,
}

pub struct ExtractionClient {
    client: Client,
    endpoint: reqwest::Url,
    anon_key: SecretString,
}

impl ExtractionClient {
    pub fn new(
        client: Client,
        endpoint: &str,
        anon_key: SecretString,
    ) -> Result<Self, ExtractionError> {
        let endpoint =
            reqwest::Url::parse(endpoint).map_err(|e| ExtractionError::InvalidEndpoint {
                url: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            endpoint,
            anon_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}

/// Builds the shared HTTP client. No request timeout unless one is given.
pub fn build_http_client(request_timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder();
    if let Some(timeout) = request_timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

#[async_trait]
impl Extractor for ExtractionClient {
    async fn extract(
        &self,
        session: &Session,
        paths: &[String],
    ) -> Result<Vec<ExtractionResult>, ExtractionError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Authorization", session.bearer())
            .header("apikey", self.anon_key.expose_secret())
            .json(&ExtractionRequest { files: paths })
            .send()
            .instrument(tracing::info_span!("extraction.request", files = paths.len()))
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                body = %truncate_error_body(&body),
                "Extraction service returned an error"
            );
            return Err(service_error(status.as_u16(), body));
        }

        let results = parse_response_body(&body)?;
        if results.len() < paths.len() {
            tracing::warn!(
                requested = paths.len(),
                received = results.len(),
                "Extraction returned fewer results than documents"
            );
        }
        Ok(results)
    }
}

fn service_error(status: u16, body: String) -> ExtractionError {
    let body = if body.trim().is_empty() {
        EMPTY_FAILURE_MESSAGE.to_string()
    } else {
        body
    };
    ExtractionError::Service { status, body }
}

/// Decodes a success body. A missing or `null` `results` is an empty list.
pub fn parse_response_body(body: &str) -> Result<Vec<ExtractionResult>, ExtractionError> {
    let response: ExtractionResponse =
        serde_json::from_str(body).map_err(|e| ExtractionError::Decode(e.to_string()))?;
    Ok(response.results.unwrap_or_default())
}
