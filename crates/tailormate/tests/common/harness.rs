//! Test harness wiring a `Pipeline` to fake services.

#![allow(dead_code)]

use std::sync::Arc;

use tailormate::auth::{Actor, AuthProvider, Session, StaticAuth};
use tailormate::db::{Database, RecordStore};
use tailormate::pipeline::{IntakeRun, Pipeline, PipelineConfig};
use tailormate::reconcile::IntakeKind;
use tailormate::storage::BlobStorage;
use tailormate::Archive;

use super::doubles::{FakeExtractor, RecordingStorage};

pub const TAILOR_ID: &str = "tailor-1";

/// The signed-in tailor every harness run acts as.
pub fn tailor() -> Actor {
    Actor {
        id: TAILOR_ID.to_string(),
        email: Some("atelier@example.com".to_string()),
    }
}

/// Services behind a pipeline. Swap any field before calling
/// [`TestHarness::pipeline`].
pub struct TestHarness {
    pub config: PipelineConfig,
    pub auth: Arc<dyn AuthProvider>,
    pub storage: Arc<RecordingStorage>,
    pub extractor: Arc<FakeExtractor>,
    pub db: Database,
    pub store: Arc<dyn RecordStore>,
}

impl TestHarness {
    pub fn new() -> Self {
        let db = Database::open_in_memory().expect("Failed to open test database");
        Self {
            config: PipelineConfig::default(),
            auth: Arc::new(StaticAuth::signed_in(Session::new("test-token", tailor()))),
            storage: Arc::new(RecordingStorage::new()),
            extractor: Arc::new(FakeExtractor::new()),
            store: Arc::new(db.clone()),
            db,
        }
    }

    pub fn signed_out(mut self) -> Self {
        self.auth = Arc::new(StaticAuth::signed_out());
        self
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(
            Arc::new(self.config.clone()),
            self.auth.clone(),
            self.storage.clone() as Arc<dyn BlobStorage>,
            self.extractor.clone(),
            self.store.clone(),
        )
    }

    pub fn run(&self, kind: IntakeKind) -> IntakeRun {
        IntakeRun::new(kind, self.config.preview_max_edge)
    }

    /// Read access to what the pipeline wrote, against the real database.
    pub fn archive(&self) -> Archive {
        Archive::new(
            Arc::new(self.db.clone()),
            self.storage.clone(),
            self.config.bucket.clone(),
        )
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
