//! Configuration management.
//!
//! This module provides functions for discovering projmem directories,
//! resolving the database path, and loading `~/.projmem/config.json`.
//!
//! # Layout
//!
//! - **Database**: `~/.projmem/data/projmem.db`
//! - **Config**: `~/.projmem/config.json` with `embeddings`, `generation`
//!   and `search` sections
//!
//! Environment variables take precedence over file values. Resolution
//! functions take an [`EnvLookup`] so callers (and tests) decide where
//! variables come from; [`process_env`] reads the real environment.

use crate::embeddings::EmbeddingSettings;
use crate::error::{Error, Result};
use crate::generation::GenerationSettings;
use crate::search::SearchSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Source of environment variables.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Read a variable from the process environment, ignoring blank values.
#[must_use]
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// The projmem configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjmemConfig {
    pub embeddings: Option<EmbeddingSettings>,
    pub generation: Option<GenerationSettings>,
    pub search: Option<SearchConfig>,
}

/// `search` section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    pub threshold: Option<f32>,
    pub limit: Option<usize>,
}

/// Get the global projmem directory (`~/.projmem/`).
#[must_use]
pub fn global_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".projmem"))
}

/// Get the config file path.
///
/// # Errors
///
/// Returns `Config` if the home directory cannot be determined.
pub fn config_path() -> Result<PathBuf> {
    global_dir()
        .map(|dir| dir.join("config.json"))
        .ok_or_else(|| Error::Config("Could not determine home directory".into()))
}

/// Load the configuration file, or defaults when it does not exist.
///
/// # Errors
///
/// Returns `Config` if the file exists but cannot be read or parsed.
pub fn load_config() -> Result<ProjmemConfig> {
    load_config_from(&config_path()?)
}

/// Load a configuration file from an explicit path.
///
/// # Errors
///
/// Returns `Config` if the file exists but cannot be read or parsed.
pub fn load_config_from(path: &Path) -> Result<ProjmemConfig> {
    if !path.exists() {
        return Ok(ProjmemConfig::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file {}: {e}", path.display())))
}

/// Write a configuration file, creating its directory.
///
/// # Errors
///
/// Returns `Config` if the file cannot be written.
pub fn save_config_to(path: &Path, config: &ProjmemConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

    fs::write(path, content)
        .map_err(|e| Error::Config(format!("Failed to write config file: {e}")))
}

/// Resolve search defaults: env > config file > built-in (0.3 / 5).
///
/// # Errors
///
/// Returns `Config` if a value is unparseable or out of range.
pub fn resolve_search_settings(file: Option<&SearchConfig>, env: EnvLookup<'_>) -> Result<SearchSettings> {
    let defaults = SearchSettings::default();

    let threshold = match env("PM_SEARCH_THRESHOLD") {
        Some(raw) => raw
            .trim()
            .parse::<f32>()
            .map_err(|_| Error::Config(format!("PM_SEARCH_THRESHOLD is not a number: {raw}")))?,
        None => file.and_then(|s| s.threshold).unwrap_or(defaults.threshold),
    };
    if !(-1.0..=1.0).contains(&threshold) {
        return Err(Error::Config(format!(
            "search threshold must be within [-1, 1], got {threshold}"
        )));
    }

    let limit = match env("PM_SEARCH_LIMIT") {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| Error::Config(format!("PM_SEARCH_LIMIT is not a whole number: {raw}")))?,
        None => file.and_then(|s| s.limit).unwrap_or(defaults.limit),
    };
    if limit == 0 {
        return Err(Error::Config("search limit must be at least 1".into()));
    }

    Ok(SearchSettings { threshold, limit })
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `PM_TEST_DB=1` (or any non-empty value
/// other than `0`/`false`). It redirects the database to an isolated file.
#[must_use]
pub fn is_test_mode() -> bool {
    process_env("PM_TEST_DB").is_some_and(|v| is_truthy(&v))
}

fn is_truthy(v: &str) -> bool {
    v != "0" && !v.eq_ignore_ascii_case("false")
}

/// Get the test database path (`~/.projmem/test/projmem.db`).
#[must_use]
pub fn test_db_path() -> Option<PathBuf> {
    global_dir().map(|dir| dir.join("test").join("projmem.db"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `PM_TEST_DB` environment variable → uses test database
/// 3. `PROJMEM_DB` environment variable
/// 4. Global location: `~/.projmem/data/projmem.db`
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if is_test_mode() {
        return test_db_path();
    }

    if let Some(db_path) = process_env("PROJMEM_DB") {
        return Some(PathBuf::from(db_path));
    }

    global_dir().map(|dir| dir.join("data").join("projmem.db"))
}

/// Get the default actor name.
///
/// Priority:
/// 1. `PM_ACTOR` environment variable
/// 2. Git user name
/// 3. System username
/// 4. "unknown"
#[must_use]
pub fn default_actor() -> String {
    if let Some(actor) = process_env("PM_ACTOR") {
        return actor;
    }

    if let Ok(output) = std::process::Command::new("git")
        .args(["config", "user.name"])
        .output()
    {
        if output.status.success() {
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !name.is_empty() {
                return name;
            }
        }
    }

    process_env("USER").unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_actor() {
        assert!(!default_actor().is_empty());
    }

    #[test]
    fn test_resolve_db_path_with_explicit() {
        let explicit = PathBuf::from("/custom/path/db.sqlite");
        assert_eq!(resolve_db_path(Some(&explicit)), Some(explicit));
    }

    #[test]
    fn test_test_db_path_is_separate() {
        let test = test_db_path().unwrap();
        assert!(test.to_string_lossy().contains("/test/"));
        assert!(test.ends_with("projmem.db"));
    }

    #[test]
    fn test_truthy_parsing() {
        assert!(!is_truthy("0"));
        assert!(!is_truthy("FALSE"));
        assert!(is_truthy("1"));
        assert!(is_truthy("yes"));
    }

    #[test]
    fn test_search_settings_defaults() {
        let settings = resolve_search_settings(None, &env_from(&[])).unwrap();
        assert!((settings.threshold - 0.3).abs() < f32::EPSILON);
        assert_eq!(settings.limit, 5);
    }

    #[test]
    fn test_search_settings_env_beats_file() {
        let file = SearchConfig {
            threshold: Some(0.5),
            limit: Some(10),
        };
        let env = env_from(&[("PM_SEARCH_LIMIT", "3")]);
        let settings = resolve_search_settings(Some(&file), &env).unwrap();
        assert!((settings.threshold - 0.5).abs() < f32::EPSILON);
        assert_eq!(settings.limit, 3);
    }

    #[test]
    fn test_search_settings_reject_bad_values() {
        let env = env_from(&[("PM_SEARCH_THRESHOLD", "high")]);
        assert!(matches!(resolve_search_settings(None, &env), Err(Error::Config(_))));

        let file = SearchConfig {
            threshold: Some(1.5),
            limit: None,
        };
        assert!(resolve_search_settings(Some(&file), &env_from(&[])).is_err());

        let env = env_from(&[("PM_SEARCH_LIMIT", "0")]);
        assert!(resolve_search_settings(None, &env).is_err());
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        assert!(load_config_from(&path).unwrap().embeddings.is_none());

        let config = ProjmemConfig {
            search: Some(SearchConfig {
                threshold: Some(0.4),
                limit: None,
            }),
            ..Default::default()
        };
        save_config_to(&path, &config).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.search.and_then(|s| s.threshold), Some(0.4));
    }

    #[test]
    fn test_malformed_config_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_config_from(&path), Err(Error::Config(_))));
    }
}
