//! Initialize the projmem database.
//!
//! Creates `~/.projmem/data/projmem.db` (or the `--db` / `PROJMEM_DB`
//! path; `~/.projmem/test/projmem.db` when `PM_TEST_DB` is set) and applies
//! the schema. One database holds every project.

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    recreated: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `AlreadyInitialized` if the database exists and `force` is not
/// set, or an error if the directory or database cannot be created.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path))
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    let existed = db_path.exists();
    if existed && !force {
        return Err(Error::AlreadyInitialized { path: db_path });
    }

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    if existed {
        fs::remove_file(&db_path)?;
        for suffix in ["-wal", "-shm"] {
            let mut side = db_path.clone().into_os_string();
            side.push(suffix);
            let _ = fs::remove_file(side);
        }
    }

    // Opening applies the schema and migrations.
    SqliteStorage::open(&db_path)?;

    if json {
        let output = InitOutput {
            database: db_path,
            recreated: existed,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Initialized projmem database");
        println!("  Database: {}", db_path.display());
        println!();
        println!("Next: pm project create <name>");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("projmem.db");

        execute(Some(&path), false, true).unwrap();
        assert!(path.exists());

        let storage = SqliteStorage::open(&path).unwrap();
        assert!(storage.list_projects().unwrap().is_empty());
    }

    #[test]
    fn test_init_refuses_existing_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projmem.db");

        execute(Some(&path), false, true).unwrap();
        assert!(matches!(
            execute(Some(&path), false, true),
            Err(Error::AlreadyInitialized { .. })
        ));
    }

    #[test]
    fn test_force_recreates_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projmem.db");
        execute(Some(&path), false, true).unwrap();

        {
            let mut storage = SqliteStorage::open(&path).unwrap();
            let project = crate::model::Project::new("Backend".into(), None);
            storage.create_project(&project, "t").unwrap();
        }

        execute(Some(&path), true, true).unwrap();
        let storage = SqliteStorage::open(&path).unwrap();
        assert!(storage.list_projects().unwrap().is_empty());
    }
}
