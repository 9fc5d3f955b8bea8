pub mod archive;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extraction;
pub mod intake;
pub mod matching;
pub mod pipeline;
pub mod reconcile;
pub mod sanitize;
pub mod secrets;
pub mod storage;
pub mod telemetry;

pub use archive::Archive;
pub use auth::{Actor, AuthProvider, Session, StaticAuth, SupabaseAuth};
pub use config::{load_config, Config};
pub use db::{Database, DatabaseError, RecordStore};
pub use error::{
    AuthError, ConfigError, ExtractionError, Result, StorageError, TailorMateError,
};
pub use extraction::{ExtractionClient, ExtractionResult, Extractor};
pub use intake::{IntakeBatch, SelectedFile, UploadedDocument};
pub use matching::{names_match, normalize_name};
pub use pipeline::{IntakeRun, Pipeline, PipelineConfig, PipelineError, RunStep};
pub use reconcile::{IntakeKind, ReconcileReport};
pub use secrets::{SecretError, SecretSource};
pub use storage::{BlobStorage, FilesystemStorage, SupabaseStorage};
