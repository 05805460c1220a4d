//! Decision embedding: single, backfill, and status.
//!
//! A vector is computed first and stored in one write, so a provider
//! failure leaves the decision exactly as it was.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::embeddings::BoxedProvider;
use crate::error::{Error, Result};
use crate::model::{Decision, DecisionEmbedding, Project};
use crate::storage::SqliteStorage;

/// Which decisions a backfill touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EmbedMode {
    /// Decisions without an embedding.
    #[default]
    Missing,
    /// Decisions whose text or model changed since embedding.
    Stale,
    /// Every decision.
    All,
}

impl EmbedMode {
    fn selects(self, decision: &Decision, active_model: &str) -> bool {
        match self {
            Self::Missing => decision.embedding.is_none(),
            Self::Stale => decision.is_stale(Some(active_model)),
            Self::All => true,
        }
    }
}

/// Backfill counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BackfillStats {
    pub mode: Option<EmbedMode>,
    pub embedded: usize,
    pub failed: usize,
    /// Decisions examined but not selected by the mode.
    pub skipped: usize,
    /// Per-decision failures (id, message).
    pub errors: Vec<(String, String)>,
}

/// Embedding coverage of one project.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingStatus {
    pub project_id: String,
    pub project_name: String,
    pub total: usize,
    pub embedded: usize,
    pub missing: usize,
    pub stale: usize,
}

/// Compute and store the embedding of one decision.
///
/// Returns `false` without calling the provider if the decision already has
/// an embedding and `force` is not set.
///
/// # Errors
///
/// Returns `Embedding` if the provider fails or returns an empty vector,
/// or a storage error.
pub async fn embed_decision(
    storage: &mut SqliteStorage,
    provider: &BoxedProvider,
    decision: &Decision,
    force: bool,
    actor: &str,
) -> Result<bool> {
    if decision.embedding.is_some() && !force {
        debug!(decision = %decision.id, "Already embedded, skipping");
        return Ok(false);
    }

    let info = provider.info();
    let vector = provider.generate_embedding(&decision.embedding_text()).await?;
    if vector.is_empty() {
        return Err(Error::Embedding(format!(
            "{} returned an empty embedding",
            info.name
        )));
    }

    let embedding = DecisionEmbedding {
        dimensions: vector.len(),
        vector,
        provider: info.name,
        model: info.model,
        content_hash: decision.content_hash(),
        embedded_at: chrono::Utc::now().timestamp_millis(),
    };
    storage.store_decision_embedding(&decision.id, &embedding, actor)?;
    debug!(decision = %decision.id, dimensions = embedding.dimensions, "Stored embedding");
    Ok(true)
}

/// Embed the decisions selected by `mode`, across one project or all.
///
/// Failures are counted per decision and never abort the run.
///
/// # Errors
///
/// Returns an error only if decisions cannot be listed.
pub async fn embed_pending(
    storage: &mut SqliteStorage,
    provider: &BoxedProvider,
    project: Option<&Project>,
    limit: Option<usize>,
    mode: EmbedMode,
    actor: &str,
) -> Result<BackfillStats> {
    let active_model = provider.info().model;
    let projects = match project {
        Some(p) => vec![p.clone()],
        None => storage.list_projects()?,
    };

    let mut stats = BackfillStats {
        mode: Some(mode),
        ..Default::default()
    };
    let mut budget = limit.unwrap_or(usize::MAX);

    for project in &projects {
        for decision in storage.list_decisions(&project.id, None)? {
            if !mode.selects(&decision, &active_model) {
                stats.skipped += 1;
                continue;
            }
            if budget == 0 {
                break;
            }
            budget -= 1;

            match embed_decision(storage, provider, &decision, true, actor).await {
                Ok(_) => stats.embedded += 1,
                Err(e) => {
                    warn!(decision = %decision.id, error = %e, "Failed to embed decision");
                    stats.failed += 1;
                    stats.errors.push((decision.id.clone(), e.to_string()));
                }
            }
        }
    }

    info!(
        embedded = stats.embedded,
        failed = stats.failed,
        mode = ?mode,
        "Embedding backfill complete"
    );
    Ok(stats)
}

/// Embedding coverage per project.
///
/// `active_model` marks embeddings from other models as stale; `None`
/// checks content only.
///
/// # Errors
///
/// Returns an error if decisions cannot be listed.
pub fn embedding_status(
    storage: &SqliteStorage,
    project: Option<&Project>,
    active_model: Option<&str>,
) -> Result<Vec<EmbeddingStatus>> {
    let projects = match project {
        Some(p) => vec![p.clone()],
        None => storage.list_projects()?,
    };

    projects
        .into_iter()
        .map(|project| {
            let decisions = storage.list_decisions(&project.id, None)?;
            let embedded = decisions.iter().filter(|d| d.embedding.is_some()).count();
            let stale = decisions.iter().filter(|d| d.is_stale(active_model)).count();
            Ok(EmbeddingStatus {
                total: decisions.len(),
                embedded,
                missing: decisions.len() - embedded,
                stale,
                project_id: project.id,
                project_name: project.name,
            })
        })
        .collect()
}
