use secrecy::SecretString;

use crate::config::{Config, ReconcileConfig};
use crate::error::ConfigError;
use crate::reconcile::IntakeKind;

/// The slice of [`Config`] the pipeline stages read.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub bucket: String,
    pub client_prefix: String,
    pub order_prefix: String,
    pub preview_max_edge: u32,
    pub reconcile: ReconcileConfig,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bucket: config.storage.bucket.clone(),
            client_prefix: config.storage.client_prefix.clone(),
            order_prefix: config.storage.order_prefix.clone(),
            preview_max_edge: config.preview.max_edge,
            reconcile: config.reconcile.clone(),
        }
    }

    /// Upload prefix for the given intake flow.
    pub fn prefix_for(&self, kind: IntakeKind) -> &str {
        match kind {
            IntakeKind::Client => &self.client_prefix,
            IntakeKind::Order => &self.order_prefix,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let storage = crate::config::StorageConfig::default();
        Self {
            bucket: storage.bucket,
            client_prefix: storage.client_prefix,
            order_prefix: storage.order_prefix,
            preview_max_edge: crate::config::PreviewConfig::default().max_edge,
            reconcile: ReconcileConfig::default(),
        }
    }
}

/// Resolves the backend's anon key.
pub fn resolve_anon_key(config: &Config) -> Result<SecretString, ConfigError> {
    config
        .backend
        .anon_key
        .resolve()
        .map_err(|source| ConfigError::Secret {
            name: "backend.anon_key".to_string(),
            source,
        })
}
