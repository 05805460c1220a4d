//! Generation configuration resolution.
//!
//! Priority for every value: environment variable > config file > default.

use crate::config::EnvLookup;
use crate::embeddings::config::DEFAULT_OLLAMA_ENDPOINT;
use tracing::warn;

use super::types::{
    GenerationProviderType, GenerationSettings, ResolvedGeneration, DEFAULT_OPENAI_BASE_URL,
};

/// Resolve the generation configuration.
///
/// An unrecognised `PM_GENERATION_PROVIDER` is ignored with a warning and
/// the file value (or auto-detection) applies.
#[must_use]
pub fn resolve_generation(file: Option<&GenerationSettings>, env: EnvLookup<'_>) -> ResolvedGeneration {
    let enabled = file.and_then(|s| s.enabled).unwrap_or(true);

    let provider = env("PM_GENERATION_PROVIDER")
        .and_then(|raw| {
            raw.parse::<GenerationProviderType>()
                .map_err(|e| warn!(value = %raw, "{e}"))
                .ok()
        })
        .or_else(|| file.and_then(|s| s.provider));

    ResolvedGeneration {
        enabled,
        provider,
        model: env("PM_GENERATION_MODEL").or_else(|| file.and_then(|s| s.model.clone())),
        ollama_endpoint: env("OLLAMA_ENDPOINT")
            .or_else(|| file.and_then(|s| s.OLLAMA_ENDPOINT.clone()))
            .unwrap_or_else(|| DEFAULT_OLLAMA_ENDPOINT.to_string()),
        openai_api_key: env("OPENAI_API_KEY")
            .or_else(|| file.and_then(|s| s.OPENAI_API_KEY.clone()))
            .filter(|k| !k.trim().is_empty()),
        openai_base_url: env("OPENAI_BASE_URL")
            .or_else(|| file.and_then(|s| s.OPENAI_BASE_URL.clone()))
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
    }
}
