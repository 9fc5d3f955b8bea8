use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;
use crate::secrets::SecretSource;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

/// Overrides the backend project URL.
pub const ENV_BACKEND_URL: &str = "TAILORMATE_BACKEND_URL";
/// Overrides the anon key source; the key itself is read lazily.
pub const ENV_ANON_KEY: &str = "TAILORMATE_ANON_KEY";
/// Overrides the extraction endpoint URL.
pub const ENV_EXTRACTION_URL: &str = "TAILORMATE_EXTRACTION_URL";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut config = load_config_from_str(&content)?;
    apply_env_overrides(&mut config);
    validate_config(&config)?;

    log::info!("Loaded config from {}", path.display());
    Ok(config)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

/// Applies the `TAILORMATE_*` environment variables on top of a loaded
/// config. Unset or empty variables leave the config untouched.
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(url) = env_non_empty(ENV_BACKEND_URL) {
        config.backend.url = url;
    }
    if env_non_empty(ENV_ANON_KEY).is_some() {
        config.backend.anon_key = SecretSource::from_env_var(ENV_ANON_KEY);
    }
    if let Some(url) = env_non_empty(ENV_EXTRACTION_URL) {
        config.extraction.url = Some(url);
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    validate_url("backend.url", &config.backend.url)?;
    if let Some(url) = &config.extraction.url {
        validate_url("extraction.url", url)?;
    }
    if let Some(url) = &config.storage.local_public_base_url {
        validate_url("storage.local_public_base_url", url)?;
    }

    let storage = &config.storage;
    if storage.client_prefix == storage.order_prefix {
        return Err(ConfigError::Validation {
            message: format!(
                "Client and order upload prefixes must differ (both '{}')",
                storage.client_prefix
            ),
        });
    }
    for (field, prefix) in [
        ("storage.client_prefix", &storage.client_prefix),
        ("storage.order_prefix", &storage.order_prefix),
    ] {
        if prefix.is_empty() || prefix.starts_with('/') || prefix.contains("..") {
            return Err(ConfigError::Validation {
                message: format!("Invalid {}: '{}'", field, prefix),
            });
        }
    }

    Ok(())
}

fn validate_url(field: &str, url: &str) -> Result<(), ConfigError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
        field: field.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            field: field.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(())
}
