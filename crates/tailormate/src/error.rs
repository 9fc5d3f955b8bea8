use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TailorMateError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("{0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid URL for '{field}': {reason}")]
    InvalidUrl { field: String, reason: String },

    #[error("Failed to resolve secret '{name}': {source}")]
    Secret {
        name: String,
        #[source]
        source: crate::secrets::SecretError,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Object already exists: {bucket}/{path}")]
    AlreadyExists { bucket: String, path: String },

    #[error("Invalid object path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Storage request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Storage rejected upload of '{path}' ({status}): {body}")]
    Rejected {
        path: String,
        status: u16,
        body: String,
    },
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Extraction request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success response; the message is the raw response body.
    #[error("{body}")]
    Service { status: u16, body: String },

    #[error("Failed to decode extraction response: {0}")]
    Decode(String),

    #[error("Invalid extraction endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Auth request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Sign-in rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Failed to decode auth response: {0}")]
    Decode(String),

    #[error("Invalid auth endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

pub type Result<T> = std::result::Result<T, TailorMateError>;
