//! Embeddings command implementation.
//!
//! - `status` - Provider availability, configuration and coverage
//! - `configure` - Edit the `embeddings` section of the config file
//! - `test` - Embed a text with the active provider

use super::{embedding_provider, print_json, runtime};
use crate::cli::EmbeddingsCommands;
use crate::config::{config_path, load_config_from, process_env, resolve_db_path, save_config_to, ProjmemConfig};
use crate::embeddings::{
    detect_available_providers, resolve_embeddings, EmbeddingProviderType, EmbeddingSettings, ProviderInfo,
};
use crate::error::{Error, Result};
use crate::search::{embedding_status, EmbeddingStatus};
use crate::storage::SqliteStorage;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct StatusOutput {
    enabled: bool,
    configured_provider: Option<String>,
    available_providers: Vec<String>,
    active_provider: Option<ProviderInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    projects: Vec<EmbeddingStatus>,
}

#[derive(Serialize)]
struct TestOutput {
    provider: ProviderInfo,
    input_text: String,
    dimensions: usize,
    embedding_sample: Vec<f32>,
}

#[derive(Serialize)]
struct ConfigureOutput {
    path: PathBuf,
    settings: EmbeddingSettings,
}

/// Execute an embeddings command.
pub fn execute(command: &EmbeddingsCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let config_file = config_path()?;
    let config = load_config_from(&config_file)?;

    match command {
        EmbeddingsCommands::Status { project } => {
            runtime()?.block_on(execute_status(&config, db_path, project.as_deref(), json))
        }
        EmbeddingsCommands::Configure {
            provider,
            enable,
            disable,
            model,
            endpoint,
            token,
        } => {
            let changes = Changes {
                provider: provider.as_deref(),
                enabled: match (*enable, *disable) {
                    (true, true) => {
                        return Err(Error::InvalidArgument(
                            "cannot pass both --enable and --disable".into(),
                        ));
                    }
                    (true, false) => Some(true),
                    (false, true) => Some(false),
                    (false, false) => None,
                },
                model: model.as_deref(),
                endpoint: endpoint.as_deref(),
                token: token.as_deref(),
            };
            execute_configure(config, &config_file, &changes, json)
        }
        EmbeddingsCommands::Test { text } => runtime()?.block_on(execute_test(&config, text, json)),
    }
}

async fn execute_status(
    config: &ProjmemConfig,
    db_path: Option<&PathBuf>,
    project: Option<&str>,
    json: bool,
) -> Result<()> {
    let resolved = resolve_embeddings(config.embeddings.as_ref(), &process_env);
    let detection = detect_available_providers(&resolved).await;
    let active = embedding_provider(config).await;
    let active_info = active.as_ref().map(|p| p.info());

    // Coverage only when a database exists; status is useful before init too.
    let projects = match resolve_db_path(db_path.map(PathBuf::as_path)).filter(|p| p.exists()) {
        Some(path) => {
            let storage = SqliteStorage::open(&path)?;
            let project = project.map(|p| storage.resolve_project(p)).transpose()?;
            let active_model = active_info.as_ref().map(|i| i.model.as_str());
            embedding_status(&storage, project.as_ref(), active_model)?
        }
        None if project.is_some() => return Err(Error::NotInitialized),
        None => Vec::new(),
    };

    let output = StatusOutput {
        enabled: resolved.enabled,
        configured_provider: resolved.provider.map(|p| p.to_string()),
        available_providers: detection.available,
        active_provider: active_info,
        projects,
    };

    if json {
        return print_json(&output);
    }

    println!("{}", "Embeddings".bold());
    println!("  Enabled:   {}", if output.enabled { "yes".green() } else { "no".yellow() });
    if let Some(p) = &output.configured_provider {
        println!("  Configured provider: {p}");
    }
    for name in ["ollama", "huggingface"] {
        let mark = if output.available_providers.iter().any(|a| a == name) {
            "✓".green()
        } else {
            "✗".dimmed()
        };
        println!("  {mark} {name}");
    }
    println!();

    match &output.active_provider {
        Some(info) => {
            println!("Active provider: {} ({}, {} dims)", info.name.bold(), info.model, info.dimensions);
        }
        None if output.enabled => {
            println!("No embedding provider available; search falls back to text matching.");
            println!("  - Install Ollama: https://ollama.com");
            println!("  - Or set HF_TOKEN");
        }
        None => println!("Embeddings are disabled; search uses text matching."),
    }

    if !output.projects.is_empty() {
        println!();
        println!("{}", "Coverage".bold());
        for s in &output.projects {
            println!(
                "  {}: {}/{} embedded, {} missing, {} stale",
                s.project_name, s.embedded, s.total, s.missing, s.stale
            );
        }
        if output.projects.iter().any(|s| s.missing > 0 || s.stale > 0) {
            println!();
            println!("Run `pm decision embed --mode missing` (or `--mode stale`) to catch up.");
        }
    }
    Ok(())
}

struct Changes<'a> {
    provider: Option<&'a str>,
    enabled: Option<bool>,
    model: Option<&'a str>,
    endpoint: Option<&'a str>,
    token: Option<&'a str>,
}

/// Apply `changes` to the `embeddings` section.
///
/// `model` and `endpoint` apply to the chosen provider (or the configured
/// one, defaulting to Ollama).
fn apply_changes(settings: &mut EmbeddingSettings, changes: &Changes<'_>) -> Result<()> {
    if let Some(raw) = changes.provider {
        let provider = raw
            .parse::<EmbeddingProviderType>()
            .map_err(|_| Error::InvalidArgument(format!("unknown provider '{raw}' (ollama, huggingface)")))?;
        settings.provider = Some(provider);
    }
    if let Some(enabled) = changes.enabled {
        settings.enabled = Some(enabled);
    }

    let target = settings.provider.unwrap_or(EmbeddingProviderType::Ollama);
    let owned = |s: Option<&str>| s.map(String::from);
    match target {
        EmbeddingProviderType::Ollama => {
            if changes.model.is_some() {
                settings.OLLAMA_MODEL = owned(changes.model);
            }
            if changes.endpoint.is_some() {
                settings.OLLAMA_ENDPOINT = owned(changes.endpoint);
            }
        }
        EmbeddingProviderType::Huggingface => {
            if changes.model.is_some() {
                settings.HF_MODEL = owned(changes.model);
            }
            if changes.endpoint.is_some() {
                settings.HF_ENDPOINT = owned(changes.endpoint);
            }
        }
    }
    if changes.token.is_some() {
        settings.HF_TOKEN = owned(changes.token);
    }
    Ok(())
}

fn execute_configure(mut config: ProjmemConfig, path: &Path, changes: &Changes<'_>, json: bool) -> Result<()> {
    let mut settings = config.embeddings.take().unwrap_or_default();
    apply_changes(&mut settings, changes)?;
    config.embeddings = Some(settings.clone());
    save_config_to(path, &config)?;

    if json {
        // Never echo the token back.
        let mut shown = settings;
        shown.HF_TOKEN = shown.HF_TOKEN.map(|_| "***".to_string());
        return print_json(&ConfigureOutput { path: path.to_path_buf(), settings: shown });
    }

    println!("{} {}", "Saved".green(), path.display());
    Ok(())
}

async fn execute_test(config: &ProjmemConfig, text: &str, json: bool) -> Result<()> {
    let provider = embedding_provider(config)
        .await
        .ok_or(Error::ProviderNotConfigured("embedding"))?;
    let info = provider.info();
    let vector = provider.generate_embedding(text).await?;

    let output = TestOutput {
        input_text: text.to_string(),
        dimensions: vector.len(),
        embedding_sample: vector.iter().take(5).copied().collect(),
        provider: info,
    };

    if json {
        return print_json(&output);
    }

    println!("{} {} / {}", "✓".green(), output.provider.name, output.provider.model);
    println!("  Dimensions: {}", output.dimensions);
    println!("  Sample:     {:?}", output.embedding_sample);
    Ok(())
}
