//! Writes extraction results into the record store.
//!
//! Each result is resolved to a client (reused by normalized name, or
//! created) and then gets a measurement session, its flattened values, an
//! optional AI note and, for order intake, a draft order with items and
//! document links. The first failed write aborts the pass. Rows written
//! before the failure stay; there is no transaction across writes.

pub mod flatten;
pub mod order;
pub mod report;

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, Instrument};

use crate::auth::Actor;
use crate::config::ReconcileConfig;
use crate::db::client_repo::ClientRow;
use crate::db::file_repo::{FileLinkRow, FileOwner};
use crate::db::measurement_repo::MeasurementSessionRow;
use crate::db::note_repo::{ClientNoteRow, NoteSource};
use crate::db::order_repo::{OrderItemRow, OrderRow, STATUS_DRAFT};
use crate::db::{new_id, now_timestamp, DatabaseError, RecordStore};
use crate::extraction::ExtractionResult;
use crate::intake::UploadedDocument;
use crate::matching::normalize_name;
use crate::sanitize::redact_storage_path;

pub use flatten::flatten_measurements;
pub use order::order_number;
pub use report::ReconcileReport;

/// Which intake flow the results came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntakeKind {
    /// Client documents: measurements and notes only.
    Client,
    /// Order forms: additionally a draft order per result.
    Order,
}

impl IntakeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeKind::Client => "client",
            IntakeKind::Order => "order",
        }
    }
}

/// A write that failed while saving one result.
#[derive(Error, Debug)]
#[error("Failed to save '{file_name}': {source}")]
pub struct ReconcileError {
    pub file_name: String,
    #[source]
    pub source: DatabaseError,
}

pub struct Reconciler {
    store: Arc<dyn RecordStore>,
    options: ReconcileConfig,
}

impl Reconciler {
    pub fn new(store: Arc<dyn RecordStore>, options: ReconcileConfig) -> Self {
        Self { store, options }
    }

    /// Saves every result in order. `documents` are the run's uploaded
    /// documents; their storage paths become file links.
    pub async fn reconcile(
        &self,
        actor: &Actor,
        kind: IntakeKind,
        results: &[ExtractionResult],
        documents: &[UploadedDocument],
    ) -> Result<ReconcileReport, ReconcileError> {
        let mut report = ReconcileReport::default();

        for result in results {
            let file_name = redact_storage_path(&result.file_name);
            let span = tracing::info_span!("reconcile_result", file = %file_name);
            self.save_result(actor, kind, result, documents, &mut report)
                .instrument(span)
                .await
                .map_err(|source| ReconcileError {
                    file_name: result.file_name.clone(),
                    source,
                })?;
        }

        info!(
            kind = kind.as_str(),
            processed = report.processed,
            skipped = report.skipped,
            clients_created = report.clients_created,
            "Reconciliation finished"
        );
        Ok(report)
    }

    async fn save_result(
        &self,
        actor: &Actor,
        kind: IntakeKind,
        result: &ExtractionResult,
        documents: &[UploadedDocument],
        report: &mut ReconcileReport,
    ) -> Result<(), DatabaseError> {
        let fields = &result.structured;
        let Some(name) = fields.client_name() else {
            debug!("No client name, skipping result");
            report.skipped += 1;
            return Ok(());
        };

        let client_id = self.resolve_client(actor, result, name, report).await?;

        if kind == IntakeKind::Order {
            self.save_order(actor, &client_id, result, documents, report)
                .await?;
        } else if self.options.attach_client_files {
            let links = file_links(&client_id, documents);
            self.store
                .insert_file_links(FileOwner::Client, &links)
                .await?;
            report.file_links += links.len();
        }

        let session = MeasurementSessionRow {
            id: new_id(),
            tailor_id: actor.id.clone(),
            client_id: client_id.clone(),
            raw_text: Some(result.raw_text.clone()),
            structured_data: fields.measurements.as_ref().map(|m| m.to_value()),
            created_at: now_timestamp(),
        };
        self.store.insert_measurement_session(&session).await?;
        report.sessions += 1;

        if let Some(notes) = fields.notes.as_ref().filter(|n| !n.is_empty()) {
            let note = ClientNoteRow {
                id: new_id(),
                tailor_id: actor.id.clone(),
                client_id: client_id.clone(),
                raw_text: result.raw_text.clone(),
                notes: notes.clone(),
                source: NoteSource::Ai,
                created_at: now_timestamp(),
            };
            self.store.insert_client_note(&note).await?;
            report.notes += 1;
        }

        if let Some(measurements) = &fields.measurements {
            let values =
                flatten_measurements(measurements, &session.id, &self.options.default_unit);
            if !values.is_empty() {
                self.store.insert_measurement_values(&values).await?;
                report.values += values.len();
            }
        }

        report.processed += 1;
        Ok(())
    }

    /// Reuses the newest client with the same normalized name, or creates one.
    async fn resolve_client(
        &self,
        actor: &Actor,
        result: &ExtractionResult,
        name: &str,
        report: &mut ReconcileReport,
    ) -> Result<String, DatabaseError> {
        let key = normalize_name(name);
        if let Some(existing) = self.store.find_client_by_name_key(&actor.id, &key).await? {
            debug!(client_id = %existing.id, "Reusing existing client");
            report.clients_reused += 1;
            return Ok(existing.id);
        }

        let client = ClientRow {
            id: new_id(),
            tailor_id: actor.id.clone(),
            full_name: name.to_string(),
            email: result.structured.email.clone(),
            phone: result.structured.phone.clone(),
            address: None,
            created_at: now_timestamp(),
        };
        self.store.insert_client(&client).await?;
        debug!(client_id = %client.id, "Created client");
        report.clients_created += 1;
        Ok(client.id)
    }

    async fn save_order(
        &self,
        actor: &Actor,
        client_id: &str,
        result: &ExtractionResult,
        documents: &[UploadedDocument],
        report: &mut ReconcileReport,
    ) -> Result<(), DatabaseError> {
        let order = OrderRow {
            id: new_id(),
            tailor_id: actor.id.clone(),
            client_id: Some(client_id.to_string()),
            order_number: order_number(&self.options.order_number_prefix, Utc::now()),
            status: STATUS_DRAFT.to_string(),
            order_date: None,
            delivery_date: None,
            total_amount: None,
            notes: Some(result.raw_text.clone()).filter(|t| !t.is_empty()),
            created_at: now_timestamp(),
        };
        self.store.insert_order(&order).await?;
        report.orders += 1;

        let items: Vec<OrderItemRow> = result
            .structured
            .order_items
            .iter()
            .flatten()
            .map(|item| OrderItemRow {
                id: new_id(),
                order_id: order.id.clone(),
                garment: item.garment.clone(),
                quantity: item.effective_quantity(),
            })
            .collect();
        if !items.is_empty() {
            self.store.insert_order_items(&items).await?;
            report.order_items += items.len();
        }

        let links = file_links(&order.id, documents);
        if !links.is_empty() {
            self.store
                .insert_file_links(FileOwner::Order, &links)
                .await?;
            report.file_links += links.len();
        }
        Ok(())
    }
}

fn file_links(owner_id: &str, documents: &[UploadedDocument]) -> Vec<FileLinkRow> {
    documents
        .iter()
        .filter_map(|doc| {
            doc.storage_path.as_ref().map(|path| FileLinkRow {
                id: new_id(),
                owner_id: owner_id.to_string(),
                storage_path: path.clone(),
                original_name: doc.filename.clone(),
                created_at: now_timestamp(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{client_repo, file_repo, measurement_repo, note_repo, order_repo, Database};
    use crate::extraction::StructuredFields;
    use crate::intake::{IntakeBatch, SelectedFile};
    use serde_json::json;

    fn actor() -> Actor {
        Actor {
            id: "tailor-1".to_string(),
            email: None,
        }
    }

    fn setup(options: ReconcileConfig) -> (Database, Reconciler) {
        let db = Database::open_in_memory().unwrap();
        let reconciler = Reconciler::new(Arc::new(db.clone()), options);
        (db, reconciler)
    }

    fn result(name: Option<&str>, structured: serde_json::Value) -> ExtractionResult {
        let mut fields: StructuredFields = serde_json::from_value(structured).unwrap();
        fields.full_name = name.map(str::to_string);
        ExtractionResult {
            file_name: "client-intake/abc-card.jpg".to_string(),
            raw_text: "Anna Bianchi chest 96".to_string(),
            structured: fields,
        }
    }

    fn uploaded_documents() -> Vec<UploadedDocument> {
        let mut batch = IntakeBatch::default();
        batch.add_files(vec![
            SelectedFile::new("front.jpg", Vec::new()),
            SelectedFile::new("back.jpg", Vec::new()),
        ]);
        let mut docs = batch.documents().to_vec();
        for doc in &mut docs {
            doc.storage_path = Some(format!("orders-intake/{}-{}", doc.id, doc.filename));
        }
        docs
    }

    #[tokio::test]
    async fn test_client_result_writes_session_note_and_values() {
        let (db, reconciler) = setup(ReconcileConfig::default());
        let r = result(
            Some("Anna Bianchi"),
            json!({"measurements": {"chest": {"circumference": "96 cm"}}, "notes": ["Slim fit"]}),
        );

        let report = reconciler
            .reconcile(&actor(), IntakeKind::Client, &[r], &[])
            .await
            .unwrap();

        assert_eq!(report.clients_created, 1);
        assert_eq!(report.sessions, 1);
        assert_eq!(report.notes, 1);
        assert_eq!(report.values, 1);
        assert_eq!(report.file_links, 0);

        let clients = client_repo::list_for_tailor(&db, "tailor-1").unwrap();
        let sessions =
            measurement_repo::list_sessions_for_client(&db, "tailor-1", &clients[0].id).unwrap();
        assert_eq!(
            sessions[0].structured_data,
            Some(json!({"chest": {"circumference": "96 cm"}}))
        );
        let notes = note_repo::list_for_client(&db, "tailor-1", &clients[0].id).unwrap();
        assert_eq!(notes[0].source, NoteSource::Ai);
        assert_eq!(notes[0].raw_text, "Anna Bianchi chest 96");
    }

    #[tokio::test]
    async fn test_blank_and_missing_names_are_skipped() {
        let (db, reconciler) = setup(ReconcileConfig::default());
        let results = vec![result(None, json!({})), result(Some("  "), json!({}))];

        let report = reconciler
            .reconcile(&actor(), IntakeKind::Order, &results, &uploaded_documents())
            .await
            .unwrap();

        assert_eq!(report.skipped, 2);
        assert_eq!(report, ReconcileReport { skipped: 2, ..Default::default() });
        assert_eq!(client_repo::count_for_tailor(&db, "tailor-1").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_existing_client_is_reused() {
        let (db, reconciler) = setup(ReconcileConfig::default());
        client_repo::insert(
            &db,
            &ClientRow {
                id: "mario".to_string(),
                tailor_id: "tailor-1".to_string(),
                full_name: "Mario Rossi".to_string(),
                email: None,
                phone: None,
                address: None,
                created_at: "2026-01-01T00:00:00Z".to_string(),
            },
        )
        .unwrap();

        let report = reconciler
            .reconcile(
                &actor(),
                IntakeKind::Client,
                &[result(Some("mario A. rossi"), json!({}))],
                &[],
            )
            .await
            .unwrap();

        assert_eq!(report.clients_reused, 1);
        assert_eq!(report.clients_created, 0);
        assert_eq!(client_repo::count_for_tailor(&db, "tailor-1").unwrap(), 1);
        assert_eq!(
            measurement_repo::list_sessions_for_client(&db, "tailor-1", "mario")
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_clients_of_other_tailors_are_not_reused() {
        let (db, reconciler) = setup(ReconcileConfig::default());
        client_repo::insert(
            &db,
            &ClientRow {
                id: "other".to_string(),
                tailor_id: "tailor-2".to_string(),
                full_name: "Mario Rossi".to_string(),
                email: None,
                phone: None,
                address: None,
                created_at: "2026-01-01T00:00:00Z".to_string(),
            },
        )
        .unwrap();

        let results = [result(Some("Mario Rossi"), json!({}))];
        let report = reconciler
            .reconcile(&actor(), IntakeKind::Client, &results, &[])
            .await
            .unwrap();
        assert_eq!(report.clients_created, 1);
    }

    #[tokio::test]
    async fn test_order_result_writes_order_items_and_links() {
        let (db, reconciler) = setup(ReconcileConfig::default());
        let r = result(
            Some("Anna Bianchi"),
            json!({"order_items": [{"garment": "Jacket", "quantity": 2}, {"garment": "Trousers"}]}),
        );
        let documents = uploaded_documents();

        let report = reconciler
            .reconcile(&actor(), IntakeKind::Order, &[r], &documents)
            .await
            .unwrap();
        assert_eq!(report.orders, 1);
        assert_eq!(report.order_items, 2);
        assert_eq!(report.file_links, 2);
        assert_eq!(report.values, 0);

        let orders = order_repo::list_for_tailor(&db, "tailor-1").unwrap();
        let order = &orders[0].order;
        assert_eq!(order.status, "draft");
        assert_eq!(order.notes.as_deref(), Some("Anna Bianchi chest 96"));
        assert!(order.order_number.starts_with("ORD-"));
        assert_eq!(orders[0].client_name.as_deref(), Some("Anna Bianchi"));

        let items = order_repo::list_items(&db, &order.id).unwrap();
        assert_eq!(
            items.iter().map(|i| i.quantity).collect::<Vec<_>>(),
            vec![2, 1]
        );
        let links = file_repo::list_links(&db, FileOwner::Order, &order.id).unwrap();
        assert_eq!(links[0].original_name, "front.jpg");
        assert_eq!(links[1].storage_path, documents[1].storage_path.clone().unwrap());
    }

    #[tokio::test]
    async fn test_empty_raw_text_gives_null_order_notes() {
        let (db, reconciler) = setup(ReconcileConfig::default());
        let mut r = result(Some("Anna Bianchi"), json!({}));
        r.raw_text = String::new();

        reconciler
            .reconcile(&actor(), IntakeKind::Order, &[r], &[])
            .await
            .unwrap();
        let orders = order_repo::list_for_tailor(&db, "tailor-1").unwrap();
        assert_eq!(orders[0].order.notes, None);
    }

    #[tokio::test]
    async fn test_client_files_only_when_enabled() {
        let documents = uploaded_documents();
        let results = [result(Some("Anna Bianchi"), json!({}))];

        let (db, reconciler) = setup(ReconcileConfig::default());
        reconciler
            .reconcile(&actor(), IntakeKind::Client, &results, &documents)
            .await
            .unwrap();
        let client = &client_repo::list_for_tailor(&db, "tailor-1").unwrap()[0];
        assert!(file_repo::list_links(&db, FileOwner::Client, &client.id)
            .unwrap()
            .is_empty());

        let (db, reconciler) = setup(ReconcileConfig {
            attach_client_files: true,
            ..Default::default()
        });
        let report = reconciler
            .reconcile(&actor(), IntakeKind::Client, &results, &documents)
            .await
            .unwrap();
        assert_eq!(report.file_links, 2);
        let client = &client_repo::list_for_tailor(&db, "tailor-1").unwrap()[0];
        assert_eq!(
            file_repo::list_links(&db, FileOwner::Client, &client.id).unwrap().len(),
            2
        );
    }
}
