//! Client repository: CRUD operations for the `clients` table.
//!
//! `name_key` is always derived from `full_name` with
//! [`normalize_name`](crate::matching::normalize_name) on write, so lookups
//! by key agree with the archive's display grouping.

use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::{Database, DatabaseError};
use crate::matching::normalize_name;

/// A client row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientRow {
    pub id: String,
    pub tailor_id: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
}

impl ClientRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            tailor_id: row.get("tailor_id")?,
            full_name: row.get("full_name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            address: row.get("address")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Inserts a new client row.
pub fn insert(db: &Database, client: &ClientRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO clients
                 (id, tailor_id, full_name, name_key, email, phone, address, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                client.id,
                client.tailor_id,
                client.full_name,
                normalize_name(&client.full_name),
                client.email,
                client.phone,
                client.address,
                client.created_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a tailor's client by id.
pub fn find_by_id(
    db: &Database,
    tailor_id: &str,
    id: &str,
) -> Result<Option<ClientRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM clients WHERE tailor_id = ?1 AND id = ?2",
                params![tailor_id, id],
                ClientRow::from_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// Most recently created client of `tailor_id` whose normalized name is `name_key`.
pub fn find_by_name_key(
    db: &Database,
    tailor_id: &str,
    name_key: &str,
) -> Result<Option<ClientRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM clients WHERE tailor_id = ?1 AND name_key = ?2
                 ORDER BY created_at DESC, rowid DESC LIMIT 1",
                params![tailor_id, name_key],
                ClientRow::from_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// All clients of a tailor, newest first.
pub fn list_for_tailor(db: &Database, tailor_id: &str) -> Result<Vec<ClientRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM clients WHERE tailor_id = ?1 ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map(params![tailor_id], ClientRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts a tailor's clients.
pub fn count_for_tailor(db: &Database, tailor_id: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM clients WHERE tailor_id = ?1",
            params![tailor_id],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
