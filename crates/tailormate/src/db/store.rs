//! The record store boundary the pipeline and archive write through.
//!
//! There is no transaction primitive on this trait. Callers that perform
//! several writes get per-call atomicity only.

use async_trait::async_trait;

use super::client_repo::{self, ClientRow};
use super::file_repo::{self, FileLinkRow, FileOwner};
use super::measurement_repo::{self, MeasurementSessionRow, MeasurementValueRow};
use super::note_repo::{self, ClientNoteRow};
use super::order_repo::{self, OrderItemRow, OrderRow, OrderSummaryRow};
use super::{Database, DatabaseError};

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_client_by_name_key(
        &self,
        tailor_id: &str,
        name_key: &str,
    ) -> Result<Option<ClientRow>, DatabaseError>;

    async fn find_client(&self, tailor_id: &str, id: &str)
        -> Result<Option<ClientRow>, DatabaseError>;

    async fn list_clients(&self, tailor_id: &str) -> Result<Vec<ClientRow>, DatabaseError>;

    async fn insert_client(&self, client: &ClientRow) -> Result<(), DatabaseError>;

    async fn insert_measurement_session(
        &self,
        session: &MeasurementSessionRow,
    ) -> Result<(), DatabaseError>;

    /// One bulk insert; all rows land or none do.
    async fn insert_measurement_values(
        &self,
        values: &[MeasurementValueRow],
    ) -> Result<(), DatabaseError>;

    async fn list_measurement_sessions(
        &self,
        tailor_id: &str,
        client_id: &str,
    ) -> Result<Vec<MeasurementSessionRow>, DatabaseError>;

    async fn list_measurement_values(
        &self,
        measurement_id: &str,
    ) -> Result<Vec<MeasurementValueRow>, DatabaseError>;

    async fn insert_client_note(&self, note: &ClientNoteRow) -> Result<(), DatabaseError>;

    async fn list_client_notes(
        &self,
        tailor_id: &str,
        client_id: &str,
    ) -> Result<Vec<ClientNoteRow>, DatabaseError>;

    async fn insert_order(&self, order: &OrderRow) -> Result<(), DatabaseError>;

    async fn insert_order_items(&self, items: &[OrderItemRow]) -> Result<(), DatabaseError>;

    async fn find_order(&self, tailor_id: &str, id: &str)
        -> Result<Option<OrderRow>, DatabaseError>;

    async fn list_orders(&self, tailor_id: &str) -> Result<Vec<OrderSummaryRow>, DatabaseError>;

    async fn list_order_items(&self, order_id: &str) -> Result<Vec<OrderItemRow>, DatabaseError>;

    async fn update_order_status(
        &self,
        tailor_id: &str,
        id: &str,
        status: &str,
    ) -> Result<bool, DatabaseError>;

    async fn insert_file_links(
        &self,
        owner: FileOwner,
        links: &[FileLinkRow],
    ) -> Result<(), DatabaseError>;

    async fn list_file_links(
        &self,
        owner: FileOwner,
        owner_id: &str,
    ) -> Result<Vec<FileLinkRow>, DatabaseError>;
}

#[async_trait]
impl RecordStore for Database {
    async fn find_client_by_name_key(
        &self,
        tailor_id: &str,
        name_key: &str,
    ) -> Result<Option<ClientRow>, DatabaseError> {
        client_repo::find_by_name_key(self, tailor_id, name_key)
    }

    async fn find_client(
        &self,
        tailor_id: &str,
        id: &str,
    ) -> Result<Option<ClientRow>, DatabaseError> {
        client_repo::find_by_id(self, tailor_id, id)
    }

    async fn list_clients(&self, tailor_id: &str) -> Result<Vec<ClientRow>, DatabaseError> {
        client_repo::list_for_tailor(self, tailor_id)
    }

    async fn insert_client(&self, client: &ClientRow) -> Result<(), DatabaseError> {
        client_repo::insert(self, client)?;
        log::debug!("Inserted client {}", client.id);
        Ok(())
    }

    async fn insert_measurement_session(
        &self,
        session: &MeasurementSessionRow,
    ) -> Result<(), DatabaseError> {
        measurement_repo::insert_session(self, session)
    }

    async fn insert_measurement_values(
        &self,
        values: &[MeasurementValueRow],
    ) -> Result<(), DatabaseError> {
        measurement_repo::insert_values(self, values)?;
        log::debug!("Inserted {} measurement values", values.len());
        Ok(())
    }

    async fn list_measurement_sessions(
        &self,
        tailor_id: &str,
        client_id: &str,
    ) -> Result<Vec<MeasurementSessionRow>, DatabaseError> {
        measurement_repo::list_sessions_for_client(self, tailor_id, client_id)
    }

    async fn list_measurement_values(
        &self,
        measurement_id: &str,
    ) -> Result<Vec<MeasurementValueRow>, DatabaseError> {
        measurement_repo::list_values_for_session(self, measurement_id)
    }

    async fn insert_client_note(&self, note: &ClientNoteRow) -> Result<(), DatabaseError> {
        note_repo::insert(self, note)
    }

    async fn list_client_notes(
        &self,
        tailor_id: &str,
        client_id: &str,
    ) -> Result<Vec<ClientNoteRow>, DatabaseError> {
        note_repo::list_for_client(self, tailor_id, client_id)
    }

    async fn insert_order(&self, order: &OrderRow) -> Result<(), DatabaseError> {
        order_repo::insert(self, order)?;
        log::debug!("Inserted order {} ({})", order.id, order.order_number);
        Ok(())
    }

    async fn insert_order_items(&self, items: &[OrderItemRow]) -> Result<(), DatabaseError> {
        order_repo::insert_items(self, items)
    }

    async fn find_order(
        &self,
        tailor_id: &str,
        id: &str,
    ) -> Result<Option<OrderRow>, DatabaseError> {
        order_repo::find_by_id(self, tailor_id, id)
    }

    async fn list_orders(&self, tailor_id: &str) -> Result<Vec<OrderSummaryRow>, DatabaseError> {
        order_repo::list_for_tailor(self, tailor_id)
    }

    async fn list_order_items(&self, order_id: &str) -> Result<Vec<OrderItemRow>, DatabaseError> {
        order_repo::list_items(self, order_id)
    }

    async fn update_order_status(
        &self,
        tailor_id: &str,
        id: &str,
        status: &str,
    ) -> Result<bool, DatabaseError> {
        let changed = order_repo::update_status(self, tailor_id, id, status)?;
        if changed {
            log::info!("Order {} moved to status '{}'", id, status);
        }
        Ok(changed)
    }

    async fn insert_file_links(
        &self,
        owner: FileOwner,
        links: &[FileLinkRow],
    ) -> Result<(), DatabaseError> {
        file_repo::insert_links(self, owner, links)
    }

    async fn list_file_links(
        &self,
        owner: FileOwner,
        owner_id: &str,
    ) -> Result<Vec<FileLinkRow>, DatabaseError> {
        file_repo::list_links(self, owner, owner_id)
    }
}
