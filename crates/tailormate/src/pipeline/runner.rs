use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, info_span, Instrument};

use super::config::{resolve_anon_key, PipelineConfig};
use super::error::PipelineError;
use super::upload::upload_all;
use crate::auth::{Actor, AuthProvider, Session};
use crate::config::Config;
use crate::db::{default_database_path, Database, RecordStore};
use crate::error::{ConfigError, Result};
use crate::extraction::{build_http_client, ExtractionClient, ExtractionResult, Extractor};
use crate::intake::{IntakeBatch, UploadedDocument};
use crate::reconcile::{IntakeKind, ReconcileReport, Reconciler};
use crate::storage::{BlobStorage, FilesystemStorage, SupabaseStorage};

/// The stage services of the intake pipeline.
///
/// Stage methods take the session or actor explicitly; only
/// [`Pipeline::session`] and [`Pipeline::actor`] consult the auth provider.
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    auth: Arc<dyn AuthProvider>,
    storage: Arc<dyn BlobStorage>,
    extractor: Arc<dyn Extractor>,
    store: Arc<dyn RecordStore>,
    reconciler: Reconciler,
}

impl Pipeline {
    /// Production constructor: hosted storage (or a local directory when
    /// `storage.local_root` is set), the extraction endpoint and the
    /// SQLite database from `config`.
    pub fn from_config(config: &Config, auth: Arc<dyn AuthProvider>) -> Result<Self> {
        let anon_key = resolve_anon_key(config)?;
        let timeout = config.extraction.request_timeout_secs.map(Duration::from_secs);
        let http = build_http_client(timeout).map_err(crate::error::ExtractionError::from)?;

        let storage: Arc<dyn BlobStorage> = match &config.storage.local_root {
            Some(root) => {
                let mut local = FilesystemStorage::new(root);
                if let Some(base) = &config.storage.local_public_base_url {
                    local = local.with_public_base_url(base.clone());
                }
                Arc::new(local)
            }
            None => Arc::new(SupabaseStorage::new(
                http.clone(),
                &config.backend.url,
                SecretString::from(anon_key.expose_secret().to_string()),
            )),
        };

        let endpoint = config.extraction.endpoint(&config.backend.url);
        let extractor = Arc::new(ExtractionClient::new(http, &endpoint, anon_key)?);

        let db_path = match &config.database.path {
            Some(path) => path.clone(),
            None => default_database_path().ok_or_else(|| ConfigError::Validation {
                message: "Cannot determine home directory for the default database path"
                    .to_string(),
            })?,
        };
        let store = Arc::new(Database::open(&db_path)?);

        info!(endpoint = %endpoint, database = %db_path.display(), "Pipeline ready");

        Ok(Self::new(
            Arc::new(PipelineConfig::from_config(config)),
            auth,
            storage,
            extractor,
            store,
        ))
    }

    /// Constructor with injected services.
    pub fn new(
        config: Arc<PipelineConfig>,
        auth: Arc<dyn AuthProvider>,
        storage: Arc<dyn BlobStorage>,
        extractor: Arc<dyn Extractor>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        let reconciler = Reconciler::new(store.clone(), config.reconcile.clone());
        Self {
            config,
            auth,
            storage,
            extractor,
            store,
            reconciler,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn RecordStore> {
        self.store.clone()
    }

    pub fn storage(&self) -> Arc<dyn BlobStorage> {
        self.storage.clone()
    }

    /// The current session. Required before any upload.
    pub async fn session(&self) -> std::result::Result<Session, PipelineError> {
        self.auth.session().await.ok_or(PipelineError::NoSession)
    }

    /// The current actor. Required before any write.
    pub async fn actor(&self) -> std::result::Result<Actor, PipelineError> {
        self.auth.user().await.ok_or(PipelineError::NotAuthenticated)
    }

    /// Upload stage: every document of the batch, concurrently.
    pub async fn upload(
        &self,
        session: &Session,
        kind: IntakeKind,
        batch: &mut IntakeBatch,
    ) -> std::result::Result<(), PipelineError> {
        let documents = batch.len();
        upload_all(
            self.storage.as_ref(),
            session,
            &self.config.bucket,
            self.config.prefix_for(kind),
            batch.documents_mut(),
        )
        .instrument(info_span!("upload", documents))
        .await
    }

    /// Extraction stage: one request for all uploaded paths.
    pub async fn extract(
        &self,
        session: &Session,
        batch: &IntakeBatch,
    ) -> std::result::Result<Vec<ExtractionResult>, PipelineError> {
        let paths = batch.storage_paths();
        let results = self
            .extractor
            .extract(session, &paths)
            .instrument(info_span!("extract", paths = paths.len()))
            .await?;
        Ok(results)
    }

    /// Reconciliation stage.
    pub async fn reconcile(
        &self,
        actor: &Actor,
        kind: IntakeKind,
        results: &[ExtractionResult],
        documents: &[UploadedDocument],
    ) -> std::result::Result<ReconcileReport, PipelineError> {
        let report = self
            .reconciler
            .reconcile(actor, kind, results, documents)
            .instrument(info_span!("reconcile", results = results.len()))
            .await?;
        Ok(report)
    }
}
