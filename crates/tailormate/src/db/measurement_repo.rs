//! Measurement sessions (`client_measurements`) and their flattened values
//! (`client_measurement_values`).

use rusqlite::{params, Row};
use serde::Serialize;

use super::{Database, DatabaseError};

/// One measurement session: the raw transcription plus the nested
/// measurement blob exactly as extracted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementSessionRow {
    pub id: String,
    pub tailor_id: String,
    pub client_id: String,
    pub raw_text: Option<String>,
    pub structured_data: Option<serde_json::Value>,
    pub created_at: String,
}

impl MeasurementSessionRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let structured: Option<String> = row.get("structured_data")?;
        let structured_data = structured
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(Self {
            id: row.get("id")?,
            tailor_id: row.get("tailor_id")?,
            client_id: row.get("client_id")?,
            raw_text: row.get("raw_text")?,
            structured_data,
            created_at: row.get("created_at")?,
        })
    }
}

/// One leaf of a session's measurement blob.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementValueRow {
    pub id: String,
    pub measurement_id: String,
    pub garment: String,
    pub key: String,
    pub value: Option<f64>,
    pub unit: String,
}

impl MeasurementValueRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            measurement_id: row.get("measurement_id")?,
            garment: row.get("garment")?,
            key: row.get("key")?,
            value: row.get("value")?,
            unit: row.get("unit")?,
        })
    }
}

pub fn insert_session(db: &Database, session: &MeasurementSessionRow) -> Result<(), DatabaseError> {
    let structured = session
        .structured_data
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|source| DatabaseError::Json {
            column: "structured_data",
            source,
        })?;

    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO client_measurements
                 (id, tailor_id, client_id, raw_text, structured_data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.id,
                session.tailor_id,
                session.client_id,
                session.raw_text,
                structured,
                session.created_at,
            ],
        )?;
        Ok(())
    })
}

/// Inserts all rows in one statement batch; either every row lands or none.
pub fn insert_values(db: &Database, values: &[MeasurementValueRow]) -> Result<(), DatabaseError> {
    if values.is_empty() {
        return Ok(());
    }

    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO client_measurement_values
                     (id, measurement_id, garment, \"key\", value, unit)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for v in values {
                stmt.execute(params![v.id, v.measurement_id, v.garment, v.key, v.value, v.unit])?;
            }
        }
        tx.commit()?;
        Ok(())
    })
}

/// A client's sessions, newest first.
pub fn list_sessions_for_client(
    db: &Database,
    tailor_id: &str,
    client_id: &str,
) -> Result<Vec<MeasurementSessionRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM client_measurements WHERE tailor_id = ?1 AND client_id = ?2
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map(params![tailor_id, client_id], MeasurementSessionRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Values of one session in insertion order.
pub fn list_values_for_session(
    db: &Database,
    measurement_id: &str,
) -> Result<Vec<MeasurementValueRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM client_measurement_values WHERE measurement_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map(params![measurement_id], MeasurementValueRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::client_repo::{self, ClientRow};

    fn test_db_with_client() -> Database {
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
        db
    }

    fn sample_session(id: &str, created_at: &str) -> MeasurementSessionRow {
        MeasurementSessionRow {
            id: id.to_string(),
            tailor_id: "t1".to_string(),
            client_id: "c1".to_string(),
            raw_text: Some("Chest 108cm".to_string()),
            structured_data: Some(serde_json::json!({"chest": {"width": "108cm"}})),
            created_at: created_at.to_string(),
        }
    }

    fn value(id: &str, key: &str, v: Option<f64>) -> MeasurementValueRow {
        MeasurementValueRow {
            id: id.to_string(),
            measurement_id: "m1".to_string(),
            garment: "chest".to_string(),
            key: key.to_string(),
            value: v,
            unit: "cm".to_string(),
        }
    }

    #[test]
    fn test_session_round_trips_structured_blob() {
        let db = test_db_with_client();
        insert_session(&db, &sample_session("m1", "2026-01-02T00:00:00Z")).unwrap();

        let sessions = list_sessions_for_client(&db, "t1", "c1").unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(
            sessions[0].structured_data,
            Some(serde_json::json!({"chest": {"width": "108cm"}}))
        );
    }

    #[test]
    fn test_session_without_blob() {
        let db = test_db_with_client();
        let mut session = sample_session("m1", "2026-01-02T00:00:00Z");
        session.structured_data = None;
        insert_session(&db, &session).unwrap();

        let sessions = list_sessions_for_client(&db, "t1", "c1").unwrap();
        assert!(sessions[0].structured_data.is_none());
    }

    #[test]
    fn test_values_keep_insertion_order_and_nulls() {
        let db = test_db_with_client();
        insert_session(&db, &sample_session("m1", "2026-01-02T00:00:00Z")).unwrap();
        insert_values(
            &db,
            &[
                value("v1", "width", Some(108.0)),
                value("v2", "length", None),
                value("v3", "depth", Some(12.5)),
            ],
        )
        .unwrap();

        let rows = list_values_for_session(&db, "m1").unwrap();
        let keys: Vec<_> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["width", "length", "depth"]);
        assert_eq!(rows[1].value, None);
        assert_eq!(rows[2].value, Some(12.5));
    }

    #[test]
    fn test_bulk_insert_is_all_or_nothing() {
        let db = test_db_with_client();
        insert_session(&db, &sample_session("m1", "2026-01-02T00:00:00Z")).unwrap();

        // Duplicate primary key on the second row.
        let result = insert_values(
            &db,
            &[value("dup", "width", Some(1.0)), value("dup", "depth", Some(2.0))],
        );
        assert!(result.is_err());
        assert!(list_values_for_session(&db, "m1").unwrap().is_empty());
    }

    #[test]
    fn test_empty_values_is_noop() {
        let db = test_db_with_client();
        insert_values(&db, &[]).unwrap();
    }

    #[test]
    fn test_sessions_newest_first() {
        let db = test_db_with_client();
        insert_session(&db, &sample_session("older", "2026-01-02T00:00:00Z")).unwrap();
        insert_session(&db, &sample_session("newer", "2026-01-03T00:00:00Z")).unwrap();

        let sessions = list_sessions_for_client(&db, "t1", "c1").unwrap();
        assert_eq!(sessions[0].id, "newer");
        assert!(list_sessions_for_client(&db, "t2", "c1").unwrap().is_empty());
    }
}
