use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::secrets::SecretSource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub backend: BackendConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
}

/// The hosted backend: project URL plus the public (anon) API key that is
/// sent as the `apikey` header on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    #[serde(default)]
    pub anon_key: SecretSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_client_prefix")]
    pub client_prefix: String,
    #[serde(default = "default_order_prefix")]
    pub order_prefix: String,
    /// When set, documents are written below this directory instead of
    /// the hosted storage service.
    #[serde(default)]
    pub local_root: Option<PathBuf>,
    /// Base URL used to build public URLs for locally stored documents.
    #[serde(default)]
    pub local_public_base_url: Option<String>,
}

fn default_bucket() -> String {
    "customers".to_string()
}

fn default_client_prefix() -> String {
    "client-intake".to_string()
}

fn default_order_prefix() -> String {
    "orders-intake".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            client_prefix: default_client_prefix(),
            order_prefix: default_order_prefix(),
            local_root: None,
            local_public_base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Edge function name, resolved against `<backend.url>/functions/v1/`.
    #[serde(default = "default_function_name")]
    pub function_name: String,
    /// Full endpoint URL; takes precedence over `function_name`.
    #[serde(default)]
    pub url: Option<String>,
    /// No timeout is applied unless configured.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_function_name() -> String {
    "customers-parse".to_string()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            function_name: default_function_name(),
            url: None,
            request_timeout_secs: None,
        }
    }
}

impl ExtractionConfig {
    pub fn endpoint(&self, backend_url: &str) -> String {
        match &self.url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!(
                "{}/functions/v1/{}",
                backend_url.trim_end_matches('/'),
                self.function_name
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Defaults to `~/.tailormate/data/tailormate.db`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default = "default_unit")]
    pub default_unit: String,
    #[serde(default = "default_order_number_prefix")]
    pub order_number_prefix: String,
    /// Link uploaded documents to the client in client-intake runs.
    #[serde(default)]
    pub attach_client_files: bool,
}

fn default_unit() -> String {
    "cm".to_string()
}

fn default_order_number_prefix() -> String {
    "ORD-".to_string()
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            default_unit: default_unit(),
            order_number_prefix: default_order_number_prefix(),
            attach_client_files: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_max_edge")]
    pub max_edge: u32,
}

fn default_max_edge() -> u32 {
    256
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_edge: default_max_edge(),
        }
    }
}
