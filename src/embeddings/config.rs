//! Embedding configuration resolution.
//!
//! Priority for every value: environment variable > config file > default.

use crate::config::EnvLookup;

use super::types::{huggingface_models, ollama_models, EmbeddingSettings, ResolvedEmbeddings};

pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_HF_ENDPOINT: &str = "https://router.huggingface.co/hf-inference";

/// Resolve the embedding configuration.
#[must_use]
pub fn resolve_embeddings(file: Option<&EmbeddingSettings>, env: EnvLookup<'_>) -> ResolvedEmbeddings {
    let from_file = |pick: fn(&EmbeddingSettings) -> Option<String>| file.and_then(pick);

    let enabled = env("PM_EMBEDDINGS_ENABLED").map_or_else(
        || file.and_then(|s| s.enabled).unwrap_or(true),
        |v| v != "0" && !v.eq_ignore_ascii_case("false"),
    );

    ResolvedEmbeddings {
        enabled,
        provider: file.and_then(|s| s.provider),
        ollama_endpoint: env("OLLAMA_ENDPOINT")
            .or_else(|| from_file(|s| s.OLLAMA_ENDPOINT.clone()))
            .unwrap_or_else(|| DEFAULT_OLLAMA_ENDPOINT.to_string()),
        ollama_model: env("OLLAMA_MODEL")
            .or_else(|| from_file(|s| s.OLLAMA_MODEL.clone()))
            .unwrap_or_else(|| ollama_models::DEFAULT_MODEL.to_string()),
        hf_token: env("HF_TOKEN")
            .or_else(|| from_file(|s| s.HF_TOKEN.clone()))
            .filter(|t| !t.trim().is_empty()),
        hf_model: env("HF_MODEL")
            .or_else(|| from_file(|s| s.HF_MODEL.clone()))
            .unwrap_or_else(|| huggingface_models::DEFAULT_MODEL.to_string()),
        hf_endpoint: env("HF_ENDPOINT")
            .or_else(|| from_file(|s| s.HF_ENDPOINT.clone()))
            .unwrap_or_else(|| DEFAULT_HF_ENDPOINT.to_string()),
    }
}
