//! Embedding provider factory.
//!
//! Handles provider detection and creation.

use tracing::{debug, info, warn};

use super::huggingface::HuggingFaceProvider;
use super::ollama::OllamaProvider;
use super::provider::{BoxedProvider, EmbeddingProvider};
use super::types::{EmbeddingProviderType, ResolvedEmbeddings};

/// Available provider detection result.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProviderDetection {
    /// List of available provider names.
    pub available: Vec<String>,
    /// Recommended provider (first available).
    pub recommended: Option<String>,
}

/// Detect which embedding providers are reachable.
pub async fn detect_available_providers(config: &ResolvedEmbeddings) -> ProviderDetection {
    let mut available = Vec::new();

    if ollama(config).is_available().await {
        available.push("ollama".to_string());
    }

    if let Some(hf) = huggingface(config) {
        if hf.is_available().await {
            available.push("huggingface".to_string());
        }
    }

    let recommended = available.first().cloned();

    ProviderDetection {
        available,
        recommended,
    }
}

/// Create an embedding provider based on configuration.
///
/// Priority:
/// 1. Explicit provider in config (constructed without probing, so an
///    unreachable server surfaces as an embedding error at call time)
/// 2. Auto-detect an available provider (Ollama preferred)
///
/// Returns `None` if embeddings are disabled or nothing was found; callers
/// then use text search.
pub async fn create_embedding_provider(config: &ResolvedEmbeddings) -> Option<BoxedProvider> {
    if !config.enabled {
        debug!("Embeddings disabled by configuration");
        return None;
    }

    if let Some(provider_type) = config.provider {
        let provider = create_provider_by_type(config, provider_type);
        match &provider {
            Some(p) => info!(provider = %provider_type, model = %p.info().model, "Using configured embedding provider"),
            None => warn!(provider = %provider_type, "Configured embedding provider is missing credentials"),
        }
        return provider;
    }

    let ollama = ollama(config);
    if ollama.is_available().await {
        info!(model = %config.ollama_model, "Auto-detected Ollama embedding provider");
        return Some(BoxedProvider::new(ollama));
    }

    if let Some(hf) = huggingface(config) {
        info!(model = %config.hf_model, "Using HuggingFace embedding provider");
        return Some(BoxedProvider::new(hf));
    }

    debug!("No embedding provider available");
    None
}

/// Create a specific provider by type.
#[must_use]
pub fn create_provider_by_type(
    config: &ResolvedEmbeddings,
    provider_type: EmbeddingProviderType,
) -> Option<BoxedProvider> {
    match provider_type {
        EmbeddingProviderType::Ollama => Some(BoxedProvider::new(ollama(config))),
        EmbeddingProviderType::Huggingface => huggingface(config).map(BoxedProvider::new),
    }
}

fn ollama(config: &ResolvedEmbeddings) -> OllamaProvider {
    OllamaProvider::new(&config.ollama_endpoint, &config.ollama_model)
}

fn huggingface(config: &ResolvedEmbeddings) -> Option<HuggingFaceProvider> {
    config
        .hf_token
        .as_deref()
        .and_then(|token| HuggingFaceProvider::new(&config.hf_endpoint, &config.hf_model, token))
}
