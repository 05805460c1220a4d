//! Decision search ranker.
//!
//! Semantic mode embeds the query, scores every decision embedded by the
//! active model with cosine similarity, keeps scores strictly above the
//! threshold, sorts descending (stable, so ties keep storage order) and
//! truncates to the limit. Vectors from any other model are skipped and
//! counted, never compared. When no embedding provider is configured at
//! all, a substring match over the decision text is used instead.

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::embeddings::BoxedProvider;
use crate::error::{Error, Result};
use crate::generation::BoxedGenerator;
use crate::model::Decision;
use crate::storage::SqliteStorage;

use super::answer::build_answer_prompt;
use super::similarity::cosine_similarity;
use super::snippet::best_snippet;

pub const DEFAULT_THRESHOLD: f32 = 0.3;
pub const DEFAULT_LIMIT: usize = 5;

/// Search defaults, resolved from config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSettings {
    pub threshold: f32,
    pub limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Per-call overrides.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub limit: Option<usize>,
    pub threshold: Option<f32>,
    /// Ask the generator for a short answer.
    pub answer: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: None,
            threshold: None,
            answer: true,
        }
    }
}

/// How results were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Semantic,
    Text,
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Semantic => write!(f, "semantic"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// A decision with its relevance.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub decision: Decision,
    pub score: f32,
    pub snippet: Option<String>,
}

/// Everything a search produced.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub project_id: String,
    pub query: String,
    pub mode: SearchMode,
    pub results: Vec<SearchResult>,
    pub answer: Option<String>,
    /// Embedded decisions skipped because another model produced them or
    /// their dimensionality differs from the query embedding.
    pub mismatched: usize,
}

/// Ranks a project's decisions against a query.
pub struct Ranker<'a> {
    storage: &'a SqliteStorage,
    provider: Option<&'a BoxedProvider>,
    generator: Option<&'a BoxedGenerator>,
    settings: SearchSettings,
}

impl<'a> Ranker<'a> {
    #[must_use]
    pub fn new(
        storage: &'a SqliteStorage,
        provider: Option<&'a BoxedProvider>,
        generator: Option<&'a BoxedGenerator>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            storage,
            provider,
            generator,
            settings,
        }
    }

    /// Search `project` (ID or name) for `query`.
    ///
    /// # Errors
    ///
    /// - `RequiredField` / `InvalidArgument` for an empty query, a zero
    ///   limit, or a threshold outside [-1, 1]
    /// - `ProjectNotFound` for an unknown project
    /// - `Embedding` if the provider fails to embed the query
    pub async fn search(&self, project: &str, query: &str, options: SearchOptions) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::RequiredField("query"));
        }

        let limit = options.limit.unwrap_or(self.settings.limit);
        if limit == 0 {
            return Err(Error::InvalidArgument("limit must be at least 1".into()));
        }

        let threshold = options.threshold.unwrap_or(self.settings.threshold);
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(Error::InvalidArgument(format!(
                "threshold must be within [-1, 1], got {threshold}"
            )));
        }

        let project = self.storage.resolve_project(project)?;

        let Some(provider) = self.provider else {
            debug!(project = %project.id, "No embedding provider, using text search");
            let results = self
                .storage
                .search_decisions_text(&project.id, query)?
                .into_iter()
                .map(|decision| SearchResult {
                    snippet: best_snippet(&decision, query),
                    decision,
                    score: 1.0,
                })
                .collect();

            return Ok(SearchOutcome {
                project_id: project.id,
                query: query.to_string(),
                mode: SearchMode::Text,
                results,
                answer: None,
                mismatched: 0,
            });
        };

        let query_embedding = provider.generate_embedding(query).await?;
        if query_embedding.is_empty() {
            return Err(Error::Embedding("provider returned an empty query embedding".into()));
        }

        let active_model = provider.info().model;
        let candidates = self.storage.get_decisions_with_embedding(&project.id)?;
        let ranked = rank(&query_embedding, &active_model, candidates, threshold, limit);

        if ranked.mismatched > 0 {
            warn!(
                mismatched = ranked.mismatched,
                model = %active_model,
                dimensions = query_embedding.len(),
                "Skipped decisions embedded with a different model; run `pm decision embed --mode stale`"
            );
        }
        info!(project = %project.id, results = ranked.results.len(), "Semantic search complete");

        let results: Vec<SearchResult> = ranked
            .results
            .into_iter()
            .map(|(decision, score)| SearchResult {
                snippet: best_snippet(&decision, query),
                decision,
                score,
            })
            .collect();

        let answer = if options.answer && !results.is_empty() {
            self.synthesize_answer(query, &results).await
        } else {
            None
        };

        Ok(SearchOutcome {
            project_id: project.id,
            query: query.to_string(),
            mode: SearchMode::Semantic,
            results,
            answer,
            mismatched: ranked.mismatched,
        })
    }

    /// Generation failures degrade to no answer.
    async fn synthesize_answer(&self, query: &str, results: &[SearchResult]) -> Option<String> {
        let generator = self.generator?;
        let prompt = build_answer_prompt(query, results);

        match generator.generate(&prompt).await {
            Ok(answer) if !answer.trim().is_empty() => Some(answer),
            Ok(_) => {
                warn!("Answer generation returned nothing");
                None
            }
            Err(e) => {
                warn!(error = %e, "Answer generation failed");
                None
            }
        }
    }
}

/// Output of [`rank`].
#[derive(Debug)]
pub struct Ranked {
    pub results: Vec<(Decision, f32)>,
    pub mismatched: usize,
}

/// Score, filter, sort and truncate candidates.
///
/// Candidates without an embedding are ignored. Candidates embedded by a
/// model other than `active_model`, or whose dimensionality differs from the
/// query, are not comparable and are counted in `mismatched`.
#[must_use]
pub fn rank(
    query: &[f32],
    active_model: &str,
    candidates: Vec<Decision>,
    threshold: f32,
    limit: usize,
) -> Ranked {
    let mut mismatched = 0;
    let mut scored = Vec::with_capacity(candidates.len());

    for decision in candidates {
        let Some(embedding) = decision.embedding.as_ref() else {
            continue;
        };
        if embedding.model != active_model || embedding.vector.len() != query.len() {
            mismatched += 1;
            continue;
        }

        let score = cosine_similarity(query, &embedding.vector);
        trace!(decision = %decision.id, score, "scored");
        if score > threshold {
            scored.push((decision, score));
        }
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);

    Ranked {
        results: scored,
        mismatched,
    }
}
