//! Client note repository for the `client_notes` table.

use std::fmt;
use std::str::FromStr;

use rusqlite::{params, Row};
use serde::Serialize;

use super::{Database, DatabaseError};

/// Where a note came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteSource {
    /// Derived from an extraction result.
    Ai,
    /// Typed in by the tailor.
    Manual,
}

impl NoteSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteSource::Ai => "ai",
            NoteSource::Manual => "manual",
        }
    }
}

impl fmt::Display for NoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ai" => Ok(NoteSource::Ai),
            "manual" => Ok(NoteSource::Manual),
            other => Err(format!("unknown note source '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientNoteRow {
    pub id: String,
    pub tailor_id: String,
    pub client_id: String,
    pub raw_text: String,
    pub notes: Vec<String>,
    pub source: NoteSource,
    pub created_at: String,
}

impl ClientNoteRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let notes: String = row.get("notes")?;
        let notes: Vec<String> = serde_json::from_str(&notes).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let source: String = row.get("source")?;
        let source = source.parse::<NoteSource>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, e.into())
        })?;

        Ok(Self {
            id: row.get("id")?,
            tailor_id: row.get("tailor_id")?,
            client_id: row.get("client_id")?,
            raw_text: row.get("raw_text")?,
            notes,
            source,
            created_at: row.get("created_at")?,
        })
    }
}

pub fn insert(db: &Database, note: &ClientNoteRow) -> Result<(), DatabaseError> {
    let notes = serde_json::to_string(&note.notes).map_err(|source| DatabaseError::Json {
        column: "notes",
        source,
    })?;

    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO client_notes
                 (id, tailor_id, client_id, raw_text, notes, source, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                note.id,
                note.tailor_id,
                note.client_id,
                note.raw_text,
                notes,
                note.source.as_str(),
                note.created_at,
            ],
        )?;
        Ok(())
    })
}

/// A client's notes, newest first.
pub fn list_for_client(
    db: &Database,
    tailor_id: &str,
    client_id: &str,
) -> Result<Vec<ClientNoteRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM client_notes WHERE tailor_id = ?1 AND client_id = ?2
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map(params![tailor_id, client_id], ClientNoteRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
