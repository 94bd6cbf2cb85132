//! Database schema migrations for studyflow.
//!
//! Migrations are versioned and applied automatically when opening the store.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (fresh database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version, assuming 0");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: namespaced key-value table.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv (
            namespace  TEXT NOT NULL,
            key        TEXT NOT NULL,
            value      TEXT NOT NULL,
            PRIMARY KEY (namespace, key)
        );",
    )?;
    set_schema_version(conn, 1)?;
    Ok(())
}

/// Migration v2: track when each value was last written.
///
/// Existing rows get the migration time as their timestamp.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let has_column: bool = conn
        .prepare("SELECT updated_at FROM kv LIMIT 0")
        .is_ok();
    if !has_column {
        conn.execute_batch(
            "ALTER TABLE kv ADD COLUMN updated_at TEXT NOT NULL DEFAULT '';
             UPDATE kv SET updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now');",
        )?;
    }
    set_schema_version(conn, 2)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
        conn.execute(
            "INSERT INTO kv (namespace, key, value, updated_at) VALUES ('a', 'b', '1', 'now')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn v1_database_gains_updated_at() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        conn.execute(
            "INSERT INTO kv (namespace, key, value) VALUES ('ns', 'streak', '3')",
            [],
        )
        .unwrap();

        migrate(&conn).unwrap();

        let stamp: String = conn
            .query_row("SELECT updated_at FROM kv WHERE key = 'streak'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert!(!stamp.is_empty());
    }
}
