//! Database migrations embedded at compile time.
//!
//! Migrations are sourced from `/migrations/` at the repo root and
//! embedded into the binary using `include_str!`, so the binary has no
//! runtime file dependencies.

use rusqlite::{Connection, Result};
use tracing::{info, warn};

/// A single migration with version identifier and SQL content.
struct Migration {
    version: &'static str,
    sql: &'static str,
}

/// All migrations in order, embedded at compile time.
///
/// Version names match the SQL filenames (without .sql extension).
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001_decision_embedding_metadata",
        sql: include_str!("../../migrations/001_decision_embedding_metadata.sql"),
    },
    Migration {
        version: "002_task_links",
        sql: include_str!("../../migrations/002_task_links.sql"),
    },
    Migration {
        version: "003_task_completed_at",
        sql: include_str!("../../migrations/003_task_completed_at.sql"),
    },
];

/// Run all pending migrations on the database.
///
/// Already-applied migrations (tracked in `schema_migrations`) are skipped,
/// so this is safe to call on every open.
///
/// # Errors
///
/// Returns an error if a migration fails to apply. ALTER TABLE failures for
/// duplicate columns are tolerated, since a fresh database already has
/// those columns from the base DDL.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let applied: std::collections::HashSet<String> = conn
        .prepare("SELECT version FROM schema_migrations")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    for migration in MIGRATIONS {
        if applied.contains(migration.version) {
            continue;
        }

        info!(version = migration.version, "Applying migration");

        if let Err(e) = conn.execute_batch(migration.sql) {
            if e.to_string().contains("duplicate column name") {
                warn!(
                    version = migration.version,
                    "Migration partially applied (columns exist), marking complete"
                );
            } else {
                return Err(e);
            }
        }

        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![migration.version, chrono::Utc::now().timestamp_millis()],
        )?;

        info!(version = migration.version, "Migration complete");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::SCHEMA_SQL;

    fn migration_count(conn: &Connection) -> i32 {
        conn.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version NOT LIKE 'v%'",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_run_migrations_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
        run_migrations(&conn).expect("Migrations should apply to fresh database");
        assert_eq!(migration_count(&conn), 3);
    }

    #[test]
    fn test_run_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();

        run_migrations(&conn).expect("First run should succeed");
        run_migrations(&conn).expect("Second run should succeed (idempotent)");
        assert_eq!(migration_count(&conn), 3);
    }

    #[test]
    fn test_upgrades_legacy_decisions_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE projects (id TEXT PRIMARY KEY, name TEXT NOT NULL UNIQUE, description TEXT,
                                    created_at INTEGER NOT NULL, updated_at INTEGER NOT NULL);
             CREATE TABLE decisions (id TEXT PRIMARY KEY, project_id TEXT NOT NULL, title TEXT NOT NULL,
                                     description TEXT, reason TEXT, consequences TEXT, embedding BLOB,
                                     created_at INTEGER NOT NULL, updated_at INTEGER NOT NULL);
             CREATE TABLE recordings (id TEXT PRIMARY KEY, project_id TEXT NOT NULL, title TEXT NOT NULL,
                                      kind TEXT NOT NULL DEFAULT 'voice', transcript TEXT NOT NULL,
                                      created_at INTEGER NOT NULL);
             CREATE TABLE tasks (id TEXT PRIMARY KEY, project_id TEXT, title TEXT NOT NULL,
                                 status TEXT NOT NULL DEFAULT 'pending', priority TEXT NOT NULL DEFAULT 'medium',
                                 created_at INTEGER NOT NULL, updated_at INTEGER NOT NULL);
             INSERT INTO tasks VALUES ('t1', NULL, 'old', 'done', 'low', 5, 7);",
        )
        .unwrap();

        run_migrations(&conn).unwrap();

        let model: Option<String> = conn
            .query_row("SELECT embedding_model FROM decisions LIMIT 1", [], |r| r.get(0))
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })
            .unwrap();
        assert!(model.is_none());

        let completed_at: Option<i64> = conn
            .query_row("SELECT completed_at FROM tasks WHERE id = 't1'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(completed_at, Some(7));
    }
}
