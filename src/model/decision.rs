//! Decision model.
//!
//! A decision is a recorded technical choice. Its embedding is cached on
//! the record together with the provider, model and dimensionality that
//! produced it, plus a hash of the text that was embedded. Editing a
//! decision does not re-embed it; the hash makes the drift detectable.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A recorded technical decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub reason: Option<String>,
    pub consequences: Option<String>,
    /// Cached embedding, if one has been computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<DecisionEmbedding>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// An embedding vector plus the metadata needed to trust it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEmbedding {
    /// The vector itself (not included in JSON output).
    #[serde(skip_serializing, default)]
    pub vector: Vec<f32>,
    /// Provider that generated it (e.g. "ollama").
    pub provider: String,
    /// Model identifier (e.g. "nomic-embed-text").
    pub model: String,
    pub dimensions: usize,
    /// SHA256 of the text that was embedded.
    pub content_hash: String,
    pub embedded_at: i64,
}

impl Decision {
    /// Create a new decision with a fresh ID.
    pub fn new(
        project_id: &str,
        title: &str,
        description: Option<String>,
        reason: Option<String>,
        consequences: Option<String>,
    ) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: format!("dec_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]),
            project_id: project_id.to_string(),
            title: title.to_string(),
            description,
            reason,
            consequences,
            embedding: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Text sent to the embedding provider.
    ///
    /// Empty parts are omitted so that a title-only decision embeds as
    /// just its title.
    #[must_use]
    pub fn embedding_text(&self) -> String {
        let mut parts = vec![self.title.trim().to_string()];

        if let Some(d) = non_empty(self.description.as_deref()) {
            parts.push(d.to_string());
        }
        if let Some(r) = non_empty(self.reason.as_deref()) {
            parts.push(format!("Reason: {r}"));
        }
        if let Some(c) = non_empty(self.consequences.as_deref()) {
            parts.push(format!("Consequences: {c}"));
        }

        parts.join("\n\n")
    }

    /// SHA256 (hex) of [`Self::embedding_text`].
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.embedding_text().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Whether the cached embedding no longer describes this decision.
    ///
    /// Stale means: the text changed since embedding, or the embedding was
    /// produced by a different model than `active_model` (when known).
    /// A decision without an embedding is missing, not stale.
    #[must_use]
    pub fn is_stale(&self, active_model: Option<&str>) -> bool {
        self.embedding.as_ref().is_some_and(|e| {
            e.content_hash != self.content_hash() || active_model.is_some_and(|m| m != e.model)
        })
    }

    /// All text fields, used for snippets and answer prompts.
    pub fn text_fields(&self) -> impl Iterator<Item = &str> {
        [
            Some(self.title.as_str()),
            self.description.as_deref(),
            self.reason.as_deref(),
            self.consequences.as_deref(),
        ]
        .into_iter()
        .flatten()
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
