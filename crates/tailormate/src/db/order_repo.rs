//! Order repository for `orders` and `order_items`.

use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::{Database, DatabaseError};

/// Status every imported order starts in.
pub const STATUS_DRAFT: &str = "draft";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRow {
    pub id: String,
    pub tailor_id: String,
    pub client_id: Option<String>,
    pub order_number: String,
    pub status: String,
    pub order_date: Option<String>,
    pub delivery_date: Option<String>,
    pub total_amount: Option<f64>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl OrderRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            tailor_id: row.get("tailor_id")?,
            client_id: row.get("client_id")?,
            order_number: row.get("order_number")?,
            status: row.get("status")?,
            order_date: row.get("order_date")?,
            delivery_date: row.get("delivery_date")?,
            total_amount: row.get("total_amount")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItemRow {
    pub id: String,
    pub order_id: String,
    pub garment: String,
    pub quantity: u32,
}

impl OrderItemRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            order_id: row.get("order_id")?,
            garment: row.get("garment")?,
            quantity: row.get("quantity")?,
        })
    }
}

/// An order joined with its client's name, as the order list shows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSummaryRow {
    #[serde(flatten)]
    pub order: OrderRow,
    pub client_name: Option<String>,
}

pub fn insert(db: &Database, order: &OrderRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO orders (id, tailor_id, client_id, order_number, status, order_date,
             delivery_date, total_amount, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                order.id,
                order.tailor_id,
                order.client_id,
                order.order_number,
                order.status,
                order.order_date,
                order.delivery_date,
                order.total_amount,
                order.notes,
                order.created_at,
            ],
        )?;
        Ok(())
    })
}

pub fn insert_items(db: &Database, items: &[OrderItemRow]) -> Result<(), DatabaseError> {
    if items.is_empty() {
        return Ok(());
    }

    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO order_items (id, order_id, garment, quantity) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for item in items {
                stmt.execute(params![item.id, item.order_id, item.garment, item.quantity])?;
            }
        }
        tx.commit()?;
        Ok(())
    })
}

pub fn find_by_id(
    db: &Database,
    tailor_id: &str,
    id: &str,
) -> Result<Option<OrderRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM orders WHERE tailor_id = ?1 AND id = ?2",
                params![tailor_id, id],
                OrderRow::from_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// A tailor's orders with client names, newest first.
pub fn list_for_tailor(
    db: &Database,
    tailor_id: &str,
) -> Result<Vec<OrderSummaryRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT o.*, c.full_name AS client_name
             FROM orders o LEFT JOIN clients c ON c.id = o.client_id
             WHERE o.tailor_id = ?1
             ORDER BY o.created_at DESC, o.rowid DESC",
        )?;
        let rows = stmt
            .query_map(params![tailor_id], |row| {
                Ok(OrderSummaryRow {
                    order: OrderRow::from_row(row)?,
                    client_name: row.get("client_name")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn list_items(db: &Database, order_id: &str) -> Result<Vec<OrderItemRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM order_items WHERE order_id = ?1 ORDER BY rowid")?;
        let rows = stmt
            .query_map(params![order_id], OrderItemRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Updates an order's status. Returns false when no row matched.
pub fn update_status(
    db: &Database,
    tailor_id: &str,
    id: &str,
    status: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE orders SET status = ?3 WHERE tailor_id = ?1 AND id = ?2",
            params![tailor_id, id, status],
        )?;
        Ok(changed > 0)
    })
}
