//! Versioned schema migrations.
//!
//! Every applied version is recorded in `_migrations`. Each pending
//! migration runs in its own transaction together with its bookkeeping row.

use rusqlite::{params, Connection};

use super::error::DatabaseError;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
    /// `(table, column)` this migration adds. Skipped when a database
    /// already carries the column.
    adds_column: Option<(&'static str, &'static str)>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_clients",
        sql: include_str!("sql/001_create_clients.sql"),
        adds_column: None,
    },
    Migration {
        version: 2,
        name: "create_measurements",
        sql: include_str!("sql/002_create_measurements.sql"),
        adds_column: None,
    },
    Migration {
        version: 3,
        name: "create_client_notes",
        sql: include_str!("sql/003_create_client_notes.sql"),
        adds_column: None,
    },
    Migration {
        version: 4,
        name: "create_orders",
        sql: include_str!("sql/004_create_orders.sql"),
        adds_column: None,
    },
    Migration {
        version: 5,
        name: "create_client_files",
        sql: include_str!("sql/005_create_client_files.sql"),
        adds_column: None,
    },
    Migration {
        version: 6,
        name: "add_client_address",
        sql: include_str!("sql/006_add_client_address.sql"),
        adds_column: Some(("clients", "address")),
    },
];

const TRACKING_TABLE: &str = "CREATE TABLE IF NOT EXISTS _migrations (
    version INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);";

/// Highest version this build knows about.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

/// Highest version recorded in the database, 0 for a fresh one.
pub fn current_version(conn: &Connection) -> Result<u32, DatabaseError> {
    conn.execute_batch(TRACKING_TABLE)?;
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Applies every migration newer than the recorded version.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    let from = current_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > from).collect();
    if pending.is_empty() {
        return Ok(());
    }

    for migration in pending {
        apply(conn, migration)?;
    }
    log::info!("Schema migrated from v{} to v{}", from, latest_version());
    Ok(())
}

fn apply(conn: &Connection, migration: &Migration) -> Result<(), DatabaseError> {
    let failed = |e: rusqlite::Error| DatabaseError::Migration {
        version: migration.version,
        reason: e.to_string(),
    };

    let tx = conn.unchecked_transaction().map_err(failed)?;

    let already_present = match migration.adds_column {
        Some((table, column)) => has_column(&tx, table, column)?,
        None => false,
    };
    if already_present {
        log::info!(
            "Migration {:03}_{} already reflected in schema, recording only",
            migration.version,
            migration.name
        );
    } else {
        log::info!("Applying migration {:03}_{}", migration.version, migration.name);
        tx.execute_batch(migration.sql).map_err(failed)?;
    }

    tx.execute(
        "INSERT INTO _migrations (version, name) VALUES (?1, ?2)",
        params![migration.version, migration.name],
    )
    .map_err(failed)?;
    tx.commit().map_err(failed)
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    let found = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
        params![table, column],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(found > 0)
}
