//! Fake storage, extraction and record store services.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tailormate::auth::Session;
use tailormate::db::client_repo::ClientRow;
use tailormate::db::file_repo::{FileLinkRow, FileOwner};
use tailormate::db::measurement_repo::{MeasurementSessionRow, MeasurementValueRow};
use tailormate::db::note_repo::ClientNoteRow;
use tailormate::db::order_repo::{OrderItemRow, OrderRow, OrderSummaryRow};
use tailormate::db::{Database, DatabaseError, RecordStore};
use tailormate::error::{ExtractionError, StorageError};
use tailormate::extraction::{ExtractionResult, Extractor};
use tailormate::storage::{BlobStorage, UploadRequest};

/// In-memory object store that records every upload attempt.
#[derive(Default)]
pub struct RecordingStorage {
    attempts: Mutex<Vec<String>>,
    stored: Mutex<Vec<String>>,
    fail_name: Mutex<Option<String>>,
    failures_left: AtomicUsize,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the next `times` uploads whose path ends with `file_name`.
    pub fn fail_on(&self, file_name: &str, times: usize) {
        *self.fail_name.lock().unwrap() = Some(file_name.to_string());
        self.failures_left.store(times, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn stored(&self) -> Vec<String> {
        self.stored.lock().unwrap().clone()
    }

    fn should_fail(&self, path: &str) -> bool {
        let matches = self
            .fail_name
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|name| path.ends_with(name));
        matches
            && self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
    }
}

#[async_trait]
impl BlobStorage for RecordingStorage {
    async fn upload(
        &self,
        session: &Session,
        request: UploadRequest<'_>,
    ) -> Result<String, StorageError> {
        assert_eq!(session.bearer(), "Bearer test-token");
        self.attempts.lock().unwrap().push(request.path.to_string());

        if self.should_fail(request.path) {
            return Err(StorageError::Rejected {
                path: request.path.to_string(),
                status: 500,
                body: "storage unavailable".to_string(),
            });
        }

        let mut stored = self.stored.lock().unwrap();
        if stored.iter().any(|p| p == request.path) {
            return Err(StorageError::AlreadyExists {
                bucket: request.bucket.to_string(),
                path: request.path.to_string(),
            });
        }
        stored.push(request.path.to_string());
        Ok(request.path.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://files.test/{}/{}", bucket, path)
    }
}

/// Returns canned results, or a service failure, and records the paths it
/// was asked to parse.
#[derive(Default)]
pub struct FakeExtractor {
    results: Mutex<Vec<ExtractionResult>>,
    failure: Mutex<Option<(u16, String)>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(&self, results: Vec<ExtractionResult>) {
        *self.results.lock().unwrap() = results;
        *self.failure.lock().unwrap() = None;
    }

    pub fn fail_with(&self, status: u16, body: &str) {
        *self.failure.lock().unwrap() = Some((status, body.to_string()));
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    async fn extract(
        &self,
        _session: &Session,
        paths: &[String],
    ) -> Result<Vec<ExtractionResult>, ExtractionError> {
        self.calls.lock().unwrap().push(paths.to_vec());
        if let Some((status, body)) = self.failure.lock().unwrap().clone() {
            return Err(ExtractionError::Service { status, body });
        }
        Ok(self.results.lock().unwrap().clone())
    }
}

/// Delegates to a real database but rejects the Nth measurement session
/// insert (1-based).
pub struct FailingStore {
    inner: Database,
    fail_session_at: usize,
    sessions_seen: AtomicUsize,
}

impl FailingStore {
    pub fn new(inner: Database, fail_session_at: usize) -> Self {
        Self {
            inner,
            fail_session_at,
            sessions_seen: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn find_client_by_name_key(
        &self,
        tailor_id: &str,
        name_key: &str,
    ) -> Result<Option<ClientRow>, DatabaseError> {
        self.inner.find_client_by_name_key(tailor_id, name_key).await
    }

    async fn find_client(
        &self,
        tailor_id: &str,
        id: &str,
    ) -> Result<Option<ClientRow>, DatabaseError> {
        self.inner.find_client(tailor_id, id).await
    }

    async fn list_clients(&self, tailor_id: &str) -> Result<Vec<ClientRow>, DatabaseError> {
        self.inner.list_clients(tailor_id).await
    }

    async fn insert_client(&self, client: &ClientRow) -> Result<(), DatabaseError> {
        self.inner.insert_client(client).await
    }

    async fn insert_measurement_session(
        &self,
        session: &MeasurementSessionRow,
    ) -> Result<(), DatabaseError> {
        let seen = self.sessions_seen.fetch_add(1, Ordering::SeqCst) + 1;
        if seen == self.fail_session_at {
            return Err(DatabaseError::Insert {
                table: "measurements",
                reason: "connection reset".to_string(),
            });
        }
        self.inner.insert_measurement_session(session).await
    }

    async fn insert_measurement_values(
        &self,
        values: &[MeasurementValueRow],
    ) -> Result<(), DatabaseError> {
        self.inner.insert_measurement_values(values).await
    }

    async fn list_measurement_sessions(
        &self,
        tailor_id: &str,
        client_id: &str,
    ) -> Result<Vec<MeasurementSessionRow>, DatabaseError> {
        self.inner
            .list_measurement_sessions(tailor_id, client_id)
            .await
    }

    async fn list_measurement_values(
        &self,
        measurement_id: &str,
    ) -> Result<Vec<MeasurementValueRow>, DatabaseError> {
        self.inner.list_measurement_values(measurement_id).await
    }

    async fn insert_client_note(&self, note: &ClientNoteRow) -> Result<(), DatabaseError> {
        self.inner.insert_client_note(note).await
    }

    async fn list_client_notes(
        &self,
        tailor_id: &str,
        client_id: &str,
    ) -> Result<Vec<ClientNoteRow>, DatabaseError> {
        self.inner.list_client_notes(tailor_id, client_id).await
    }

    async fn insert_order(&self, order: &OrderRow) -> Result<(), DatabaseError> {
        self.inner.insert_order(order).await
    }

    async fn insert_order_items(&self, items: &[OrderItemRow]) -> Result<(), DatabaseError> {
        self.inner.insert_order_items(items).await
    }

    async fn find_order(
        &self,
        tailor_id: &str,
        id: &str,
    ) -> Result<Option<OrderRow>, DatabaseError> {
        self.inner.find_order(tailor_id, id).await
    }

    async fn list_orders(&self, tailor_id: &str) -> Result<Vec<OrderSummaryRow>, DatabaseError> {
        self.inner.list_orders(tailor_id).await
    }

    async fn list_order_items(&self, order_id: &str) -> Result<Vec<OrderItemRow>, DatabaseError> {
        self.inner.list_order_items(order_id).await
    }

    async fn update_order_status(
        &self,
        tailor_id: &str,
        id: &str,
        status: &str,
    ) -> Result<bool, DatabaseError> {
        self.inner.update_order_status(tailor_id, id, status).await
    }

    async fn insert_file_links(
        &self,
        owner: FileOwner,
        links: &[FileLinkRow],
    ) -> Result<(), DatabaseError> {
        self.inner.insert_file_links(owner, links).await
    }

    async fn list_file_links(
        &self,
        owner: FileOwner,
        owner_id: &str,
    ) -> Result<Vec<FileLinkRow>, DatabaseError> {
        self.inner.list_file_links(owner, owner_id).await
    }
}
