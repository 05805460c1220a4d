//! Command implementations.

pub mod completions;
pub mod decision;
pub mod embeddings;
pub mod init;
pub mod project;
pub mod recording;
pub mod search;
pub mod task;
pub mod version;

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::config::{default_actor, process_env, resolve_db_path, ProjmemConfig};
use crate::embeddings::{create_embedding_provider, resolve_embeddings, BoxedProvider};
use crate::error::{Error, Result};
use crate::generation::{create_text_generator, resolve_generation, BoxedGenerator};
use crate::storage::SqliteStorage;

/// Open the database, failing with `NotInitialized` if it does not exist.
pub(crate) fn open_storage(db_path: Option<&PathBuf>) -> Result<SqliteStorage> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or(Error::NotInitialized)?;
    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }
    debug!(path = %db_path.display(), "Opening database");
    SqliteStorage::open(&db_path)
}

pub(crate) fn resolve_actor(actor: Option<&str>) -> String {
    actor.map_or_else(default_actor, String::from)
}

/// Runtime for provider calls; commands stay synchronous otherwise.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))
}

/// Build the embedding provider described by config and environment.
pub(crate) async fn embedding_provider(config: &ProjmemConfig) -> Option<BoxedProvider> {
    let resolved = resolve_embeddings(config.embeddings.as_ref(), &process_env);
    create_embedding_provider(&resolved).await
}

/// Build the text generator described by config and environment.
pub(crate) async fn text_generator(config: &ProjmemConfig) -> Option<BoxedGenerator> {
    let resolved = resolve_generation(config.generation.as_ref(), &process_env);
    create_text_generator(&resolved).await
}

/// Read a file, or stdin when the path is `-`.
pub(crate) fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidArgument(format!("cannot read {}: {e}", path.display()))
        })
    }
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts)
        .map_or_else(|| ts.to_string(), |dt| dt.format("%Y-%m-%d %H:%M").to_string())
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
