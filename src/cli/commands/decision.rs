//! Decision commands.
//!
//! - `pm decision add <title> -p <project>` - Record a decision and embed it
//! - `pm decision list -p <project>` - List decisions
//! - `pm decision show <id>` - Show a decision and its embedding state
//! - `pm decision update <id>` - Edit a decision
//! - `pm decision delete <id>` - Delete a decision
//! - `pm decision embed` - Embed one decision or backfill many

use super::{embedding_provider, format_timestamp, open_storage, print_json, resolve_actor, runtime};
use crate::cli::{DecisionAddArgs, DecisionCommands, DecisionEmbedArgs, DecisionUpdateArgs};
use crate::config::{load_config, ProjmemConfig};
use crate::error::{Error, Result};
use crate::model::Decision;
use crate::search::{embed_decision, embed_pending};
use crate::storage::{DecisionUpdate, SqliteStorage};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

/// Embedding state shown next to a decision.
#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum EmbeddingState {
    Missing,
    Current,
    Stale,
}

impl EmbeddingState {
    fn of(decision: &Decision) -> Self {
        match &decision.embedding {
            None => Self::Missing,
            Some(_) if decision.is_stale(None) => Self::Stale,
            Some(_) => Self::Current,
        }
    }

    fn label(&self) -> colored::ColoredString {
        match self {
            Self::Missing => "not embedded".dimmed(),
            Self::Current => "embedded".green(),
            Self::Stale => "stale".yellow(),
        }
    }
}

#[derive(Serialize)]
struct DecisionOutput<'a> {
    #[serde(flatten)]
    decision: &'a Decision,
    embedding_state: EmbeddingState,
}

impl<'a> DecisionOutput<'a> {
    fn new(decision: &'a Decision) -> Self {
        Self {
            embedding_state: EmbeddingState::of(decision),
            decision,
        }
    }
}

#[derive(Serialize)]
struct AddOutput<'a> {
    #[serde(flatten)]
    decision: DecisionOutput<'a>,
    embedded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    embed_error: Option<String>,
}

#[derive(Serialize)]
struct ListOutput<'a> {
    project_id: &'a str,
    decisions: Vec<DecisionOutput<'a>>,
    count: usize,
}

/// Execute a decision command.
pub fn execute(
    command: &DecisionCommands,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut storage = open_storage(db_path)?;
    let actor = resolve_actor(actor);

    match command {
        DecisionCommands::Add(args) => execute_add(&mut storage, args, &actor, json),
        DecisionCommands::List { project, limit } => execute_list(&storage, project, *limit, json),
        DecisionCommands::Show { id } => execute_show(&storage, id, json),
        DecisionCommands::Update(args) => execute_update(&mut storage, args, &actor, json),
        DecisionCommands::Delete { id } => execute_delete(&mut storage, id, &actor, json),
        DecisionCommands::Embed(args) => execute_embed(&mut storage, args, &actor, json),
    }
}

fn non_blank(s: Option<&String>) -> Option<String> {
    s.map(|v| v.trim()).filter(|v| !v.is_empty()).map(String::from)
}

fn execute_add(storage: &mut SqliteStorage, args: &DecisionAddArgs, actor: &str, json: bool) -> Result<()> {
    let title = args.title.trim();
    if title.is_empty() {
        return Err(Error::RequiredField("title"));
    }
    let project = storage.resolve_project(&args.project)?;

    let decision = Decision::new(
        &project.id,
        title,
        non_blank(args.description.as_ref()),
        non_blank(args.reason.as_ref()),
        non_blank(args.consequences.as_ref()),
    );
    storage.create_decision(&decision, actor)?;

    // A failed embedding never fails the add; the decision is just missing
    // from semantic search until backfilled.
    let mut embed_error = None;
    let mut embedded = false;
    if !args.no_embed {
        let config = load_config()?;
        let rt = runtime()?;
        rt.block_on(async {
            if let Some(provider) = embedding_provider(&config).await {
                match embed_decision(storage, &provider, &decision, false, actor).await {
                    Ok(done) => embedded = done,
                    Err(e) => {
                        warn!(decision = %decision.id, error = %e, "Embedding failed; run `pm decision embed` later");
                        embed_error = Some(e.to_string());
                    }
                }
            }
        });
    }

    let stored = storage
        .get_decision(&decision.id)?
        .ok_or_else(|| Error::DecisionNotFound { id: decision.id.clone() })?;

    if json {
        return print_json(&AddOutput {
            decision: DecisionOutput::new(&stored),
            embedded,
            embed_error,
        });
    }

    println!("{} {}", "Recorded decision:".green(), stored.title.bold());
    println!("  ID: {}", stored.id);
    println!("  Embedding: {}", EmbeddingState::of(&stored).label());
    Ok(())
}

fn execute_list(storage: &SqliteStorage, project: &str, limit: Option<usize>, json: bool) -> Result<()> {
    let project = storage.resolve_project(project)?;
    let decisions = storage.list_decisions(&project.id, limit)?;

    if json {
        return print_json(&ListOutput {
            project_id: &project.id,
            count: decisions.len(),
            decisions: decisions.iter().map(DecisionOutput::new).collect(),
        });
    }

    if decisions.is_empty() {
        println!("No decisions in {}.", project.name);
        return Ok(());
    }

    println!("Decisions in {} ({}):", project.name.bold(), decisions.len());
    println!();
    for d in &decisions {
        println!(
            "  {} {} {}",
            d.id.dimmed(),
            d.title,
            format!("({})", EmbeddingState::of(d).label()).dimmed()
        );
    }
    Ok(())
}

fn execute_show(storage: &SqliteStorage, id: &str, json: bool) -> Result<()> {
    let decision = storage
        .get_decision(id)?
        .ok_or_else(|| Error::DecisionNotFound { id: id.to_string() })?;

    if json {
        return print_json(&DecisionOutput::new(&decision));
    }

    println!("{}", decision.title.bold());
    println!("  ID:      {}", decision.id);
    println!("  Project: {}", decision.project_id);
    println!("  Created: {}", format_timestamp(decision.created_at));
    println!("  Updated: {}", format_timestamp(decision.updated_at));
    if let Some(description) = &decision.description {
        println!("\n{description}");
    }
    if let Some(reason) = &decision.reason {
        println!("\n{} {reason}", "Reason:".bold());
    }
    if let Some(consequences) = &decision.consequences {
        println!("\n{} {consequences}", "Consequences:".bold());
    }
    println!();
    match &decision.embedding {
        Some(e) => println!(
            "Embedding: {} ({} / {}, {} dims, {})",
            EmbeddingState::of(&decision).label(),
            e.provider,
            e.model,
            e.dimensions,
            format_timestamp(e.embedded_at)
        ),
        None => println!("Embedding: {}", EmbeddingState::Missing.label()),
    }
    Ok(())
}

fn execute_update(storage: &mut SqliteStorage, args: &DecisionUpdateArgs, actor: &str, json: bool) -> Result<()> {
    if args.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(Error::InvalidArgument("title cannot be empty".into()));
    }

    let update = DecisionUpdate {
        title: args.title.as_deref().map(str::trim),
        description: args.description.as_deref(),
        reason: args.reason.as_deref(),
        consequences: args.consequences.as_deref(),
    };
    if update.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to update: pass --title, --description, --reason or --consequences".into(),
        ));
    }

    let decision = storage.update_decision(&args.id, &update, actor)?;

    if json {
        return print_json(&DecisionOutput::new(&decision));
    }

    println!("{} {}", "Updated decision:".green(), decision.title.bold());
    if decision.is_stale(None) {
        println!(
            "  {}",
            "Embedding is stale; run `pm decision embed --mode stale` to refresh".yellow()
        );
    }
    Ok(())
}

fn execute_delete(storage: &mut SqliteStorage, id: &str, actor: &str, json: bool) -> Result<()> {
    storage.delete_decision(id, actor)?;
    if json {
        print_json(&serde_json::json!({ "id": id, "deleted": true }))
    } else {
        println!("Deleted decision {id}");
        Ok(())
    }
}

fn execute_embed(storage: &mut SqliteStorage, args: &DecisionEmbedArgs, actor: &str, json: bool) -> Result<()> {
    let config = load_config()?;
    runtime()?.block_on(embed_async(storage, &config, args, actor, json))
}

async fn embed_async(
    storage: &mut SqliteStorage,
    config: &ProjmemConfig,
    args: &DecisionEmbedArgs,
    actor: &str,
    json: bool,
) -> Result<()> {
    let provider = embedding_provider(config)
        .await
        .ok_or(Error::ProviderNotConfigured("embedding"))?;

    if let Some(id) = &args.id {
        let decision = storage
            .get_decision(id)?
            .ok_or_else(|| Error::DecisionNotFound { id: id.clone() })?;
        embed_decision(storage, &provider, &decision, true, actor).await?;

        if json {
            let stored = storage.get_decision(id)?;
            return print_json(&serde_json::json!({ "id": id, "embedded": true, "decision": stored }));
        }
        println!("{} {}", "Embedded".green(), decision.title);
        return Ok(());
    }

    let project = args
        .project
        .as_deref()
        .map(|p| storage.resolve_project(p))
        .transpose()?;
    let mode = args.mode.unwrap_or_default();
    let stats = embed_pending(storage, &provider, project.as_ref(), args.limit, mode, actor).await?;

    if json {
        return print_json(&stats);
    }

    let info = provider.info();
    println!(
        "Embedded {} decision(s) with {} / {}",
        stats.embedded.to_string().green(),
        info.name,
        info.model
    );
    if stats.failed > 0 {
        println!("{} {} failed:", "Warning:".yellow(), stats.failed);
        for (id, message) in &stats.errors {
            println!("  {} {message}", id.dimmed());
        }
    }
    Ok(())
}
