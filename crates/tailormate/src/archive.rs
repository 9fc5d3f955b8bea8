//! Read side of the records the pipeline writes: client and order lists
//! and their detail views.

use std::sync::Arc;

use serde::Serialize;

use crate::auth::Actor;
use crate::db::client_repo::ClientRow;
use crate::db::file_repo::{FileLinkRow, FileOwner};
use crate::db::measurement_repo::{MeasurementSessionRow, MeasurementValueRow};
use crate::db::note_repo::ClientNoteRow;
use crate::db::order_repo::{OrderItemRow, OrderRow, OrderSummaryRow};
use crate::db::{DatabaseError, RecordStore};
use crate::matching::{group_clients, ClientGroup};
use crate::storage::BlobStorage;

#[derive(Debug, Clone, Serialize)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: MeasurementSessionRow,
    pub values: Vec<MeasurementValueRow>,
}

/// A file link plus the URL it can be fetched from.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    #[serde(flatten)]
    pub link: FileLinkRow,
    pub public_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientDetail {
    pub client: ClientRow,
    /// Newest first.
    pub sessions: Vec<SessionDetail>,
    pub notes: Vec<ClientNoteRow>,
    pub files: Vec<StoredFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: OrderRow,
    pub client: Option<ClientRow>,
    pub items: Vec<OrderItemRow>,
    pub files: Vec<StoredFile>,
}

pub struct Archive {
    store: Arc<dyn RecordStore>,
    storage: Arc<dyn BlobStorage>,
    bucket: String,
}

impl Archive {
    pub fn new(
        store: Arc<dyn RecordStore>,
        storage: Arc<dyn BlobStorage>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            store,
            storage,
            bucket: bucket.into(),
        }
    }

    /// The actor's clients, one entry per normalized name.
    pub async fn clients(&self, actor: &Actor) -> Result<Vec<ClientGroup>, DatabaseError> {
        let rows = self.store.list_clients(&actor.id).await?;
        Ok(group_clients(rows))
    }

    pub async fn client_detail(
        &self,
        actor: &Actor,
        client_id: &str,
    ) -> Result<Option<ClientDetail>, DatabaseError> {
        let Some(client) = self.store.find_client(&actor.id, client_id).await? else {
            return Ok(None);
        };

        let mut sessions = Vec::new();
        for session in self
            .store
            .list_measurement_sessions(&actor.id, client_id)
            .await?
        {
            let values = self.store.list_measurement_values(&session.id).await?;
            sessions.push(SessionDetail { session, values });
        }

        let notes = self.store.list_client_notes(&actor.id, client_id).await?;
        let files = self.stored_files(FileOwner::Client, client_id).await?;

        Ok(Some(ClientDetail {
            client,
            sessions,
            notes,
            files,
        }))
    }

    /// The actor's orders with client names, newest first.
    pub async fn orders(&self, actor: &Actor) -> Result<Vec<OrderSummaryRow>, DatabaseError> {
        self.store.list_orders(&actor.id).await
    }

    pub async fn order_detail(
        &self,
        actor: &Actor,
        order_id: &str,
    ) -> Result<Option<OrderDetail>, DatabaseError> {
        let Some(order) = self.store.find_order(&actor.id, order_id).await? else {
            return Ok(None);
        };

        let client = match &order.client_id {
            Some(id) => self.store.find_client(&actor.id, id).await?,
            None => None,
        };
        let items = self.store.list_order_items(order_id).await?;
        let files = self.stored_files(FileOwner::Order, order_id).await?;

        Ok(Some(OrderDetail {
            order,
            client,
            items,
            files,
        }))
    }

    /// Returns false when the actor has no such order.
    pub async fn update_order_status(
        &self,
        actor: &Actor,
        order_id: &str,
        status: &str,
    ) -> Result<bool, DatabaseError> {
        self.store
            .update_order_status(&actor.id, order_id, status)
            .await
    }

    async fn stored_files(
        &self,
        owner: FileOwner,
        owner_id: &str,
    ) -> Result<Vec<StoredFile>, DatabaseError> {
        let links = self.store.list_file_links(owner, owner_id).await?;
        Ok(links
            .into_iter()
            .map(|link| StoredFile {
                public_url: self.storage.public_url(&self.bucket, &link.storage_path),
                link,
            })
            .collect())
    }
}
