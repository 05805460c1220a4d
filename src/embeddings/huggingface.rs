//! HuggingFace Inference API embedding provider.
//!
//! Uses HuggingFace's hosted inference API for embedding generation.
//! Requires a HuggingFace API token (`HF_TOKEN`).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

use super::ollama::truncate_chars;
use super::provider::EmbeddingProvider;
use super::types::{huggingface_models, ProviderInfo};

/// HuggingFace Inference API embedding provider.
pub struct HuggingFaceProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    token: String,
    dimensions: usize,
    max_chars: usize,
}

impl HuggingFaceProvider {
    /// Create a provider.
    ///
    /// Returns `None` if the token is blank.
    #[must_use]
    pub fn new(endpoint: &str, model: &str, token: &str) -> Option<Self> {
        if token.trim().is_empty() {
            return None;
        }
        let config = huggingface_models::get_config(model);

        Some(Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            token: token.to_string(),
            dimensions: config.dimensions,
            max_chars: config.max_chars,
        })
    }
}

/// HuggingFace API request for feature extraction.
#[derive(Debug, Serialize)]
struct HfEmbedRequest<'a> {
    inputs: &'a str,
    options: HfOptions,
}

#[derive(Debug, Serialize)]
struct HfOptions {
    wait_for_model: bool,
}

/// HuggingFace API response; the nesting depends on the model.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HfEmbedResponse {
    /// Direct embedding (most sentence-transformers models)
    Direct(Vec<f32>),
    /// Nested once (`[[...]]`)
    Single(Vec<Vec<f32>>),
    /// Nested twice (`[[[...]]]`)
    Batch(Vec<Vec<Vec<f32>>>),
}

impl HfEmbedResponse {
    fn into_embedding(self) -> Option<Vec<f32>> {
        match self {
            Self::Direct(embedding) => Some(embedding),
            Self::Single(nested) => nested.into_iter().next(),
            Self::Batch(batch) => batch.into_iter().next().and_then(|n| n.into_iter().next()),
        }
        .filter(|v| !v.is_empty())
    }
}

impl EmbeddingProvider for HuggingFaceProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "huggingface".to_string(),
            model: self.model.clone(),
            dimensions: self.dimensions,
            max_chars: self.max_chars,
        }
    }

    async fn is_available(&self) -> bool {
        // Pinging the API would spend rate-limit quota.
        !self.token.is_empty()
    }

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!(
            "{}/models/{}/pipeline/feature-extraction",
            self.endpoint, self.model
        );

        let request = HfEmbedRequest {
            inputs: truncate_chars(text, self.max_chars),
            options: HfOptions {
                wait_for_model: true,
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("HuggingFace request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "HuggingFace API error ({status}): {error}"
            )));
        }

        let data: HfEmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse HuggingFace response: {e}")))?;

        data.into_embedding()
            .ok_or_else(|| Error::Embedding("No embeddings in HuggingFace response".into()))
    }
}
