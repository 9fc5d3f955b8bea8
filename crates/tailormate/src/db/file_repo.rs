//! Links from orders and clients to uploaded documents
//! (`order_files`, `client_files`).

use rusqlite::{params, Row};
use serde::Serialize;

use super::{Database, DatabaseError};

/// Which owner table a file link belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOwner {
    Order,
    Client,
}

impl FileOwner {
    fn table(&self) -> &'static str {
        match self {
            FileOwner::Order => "order_files",
            FileOwner::Client => "client_files",
        }
    }

    fn owner_column(&self) -> &'static str {
        match self {
            FileOwner::Order => "order_id",
            FileOwner::Client => "client_id",
        }
    }
}

/// A stored document linked to an order or a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileLinkRow {
    pub id: String,
    pub owner_id: String,
    pub storage_path: String,
    pub original_name: String,
    pub created_at: String,
}

impl FileLinkRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            owner_id: row.get(1)?,
            storage_path: row.get("storage_path")?,
            original_name: row.get("original_name")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub fn insert_links(
    db: &Database,
    owner: FileOwner,
    links: &[FileLinkRow],
) -> Result<(), DatabaseError> {
    if links.is_empty() {
        return Ok(());
    }

    let sql = format!(
        "INSERT INTO {} (id, {}, storage_path, original_name, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        owner.table(),
        owner.owner_column()
    );

    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for link in links {
                stmt.execute(params![
                    link.id,
                    link.owner_id,
                    link.storage_path,
                    link.original_name,
                    link.created_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    })
}

pub fn list_links(
    db: &Database,
    owner: FileOwner,
    owner_id: &str,
) -> Result<Vec<FileLinkRow>, DatabaseError> {
    // Column order matters: `from_row` reads the owner id by index.
    let sql = format!(
        "SELECT id, {col}, storage_path, original_name, created_at FROM {table}
         WHERE {col} = ?1 ORDER BY rowid",
        col = owner.owner_column(),
        table = owner.table()
    );

    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![owner_id], FileLinkRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::client_repo::{self, ClientRow};
    use crate::db::order_repo::{self, OrderRow};

    fn test_db() -> Database {
        let db = Database::open_in_memory().expect("Failed to create test database");
        client_repo::insert(
            &db,
            &ClientRow {
                id: "c1".to_string(),
                tailor_id: "t1".to_string(),
                full_name: "Anna Bianchi".to_string(),
                email: None,
                phone: None,
                address: None,
                created_at: "2026-01-01T00:00:00Z".to_string(),
            },
        )
        .unwrap();
        order_repo::insert(
            &db,
            &OrderRow {
                id: "o1".to_string(),
                tailor_id: "t1".to_string(),
                client_id: Some("c1".to_string()),
                order_number: "ORD-000001".to_string(),
                status: "draft".to_string(),
                order_date: None,
                delivery_date: None,
                total_amount: None,
                notes: None,
                created_at: "2026-01-01T00:00:00Z".to_string(),
            },
        )
        .unwrap();
        db
    }

    fn link(id: &str, owner_id: &str, name: &str) -> FileLinkRow {
        FileLinkRow {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            storage_path: format!("orders-intake/x-{}", name),
            original_name: name.to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_order_links_round_trip() {
        let db = test_db();
        insert_links(
            &db,
            FileOwner::Order,
            &[link("f1", "o1", "front.jpg"), link("f2", "o1", "back.jpg")],
        )
        .unwrap();

        let rows = list_links(&db, FileOwner::Order, "o1").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].owner_id, "o1");
        assert_eq!(rows[1].original_name, "back.jpg");
        assert!(list_links(&db, FileOwner::Client, "o1").unwrap().is_empty());
    }

    #[test]
    fn test_client_links_round_trip() {
        let db = test_db();
        insert_links(&db, FileOwner::Client, &[link("f1", "c1", "card.jpg")]).unwrap();

        let rows = list_links(&db, FileOwner::Client, "c1").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].owner_id, "c1");
    }

    #[test]
    fn test_link_to_missing_owner_fails() {
        let db = test_db();
        let result = insert_links(&db, FileOwner::Order, &[link("f1", "nope", "a.jpg")]);
        assert!(result.is_err());
    }
}
