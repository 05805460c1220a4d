//! Text generator factory.

use tracing::{debug, info};

use super::ollama::OllamaGenerator;
use super::openai::OpenAiGenerator;
use super::provider::{BoxedGenerator, TextGenerator};
use super::types::{GenerationProviderType, ResolvedGeneration};

/// Create a text generator based on configuration.
///
/// Priority:
/// 1. Explicit provider (constructed without probing)
/// 2. Ollama, if it serves the generation model
/// 3. OpenAI-compatible API, if an API key is set
///
/// Returns `None` when generation is disabled or nothing is available.
pub async fn create_text_generator(config: &ResolvedGeneration) -> Option<BoxedGenerator> {
    if !config.enabled {
        debug!("Generation disabled by configuration");
        return None;
    }

    if let Some(provider_type) = config.provider {
        let generator = create_generator_by_type(config, provider_type);
        info!(provider = %provider_type, model = %generator.info().model, "Using configured text generator");
        return Some(generator);
    }

    let ollama = OllamaGenerator::new(
        &config.ollama_endpoint,
        &config.model_for(GenerationProviderType::Ollama),
    );
    if ollama.is_available().await {
        info!(model = %ollama.info().model, "Auto-detected Ollama text generator");
        return Some(BoxedGenerator::new(ollama));
    }

    if config.openai_api_key.is_some() {
        let generator = create_generator_by_type(config, GenerationProviderType::Openai);
        info!(model = %generator.info().model, "Using OpenAI-compatible text generator");
        return Some(generator);
    }

    debug!("No text generator available");
    None
}

/// Create a specific generator by type.
#[must_use]
pub fn create_generator_by_type(
    config: &ResolvedGeneration,
    provider_type: GenerationProviderType,
) -> BoxedGenerator {
    let model = config.model_for(provider_type);
    match provider_type {
        GenerationProviderType::Ollama => {
            BoxedGenerator::new(OllamaGenerator::new(&config.ollama_endpoint, &model))
        }
        GenerationProviderType::Openai => BoxedGenerator::new(OpenAiGenerator::new(
            &config.openai_base_url,
            &model,
            config.openai_api_key.clone(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::resolve_generation;

    fn offline_config() -> ResolvedGeneration {
        let mut config = resolve_generation(None, &|_: &str| None);
        config.ollama_endpoint = "http://127.0.0.1:9".to_string();
        config
    }

    #[tokio::test]
    async fn test_nothing_available() {
        assert!(create_text_generator(&offline_config()).await.is_none());
    }

    #[tokio::test]
    async fn test_disabled_beats_explicit() {
        let mut config = offline_config();
        config.enabled = false;
        config.provider = Some(GenerationProviderType::Ollama);
        assert!(create_text_generator(&config).await.is_none());
    }

    #[tokio::test]
    async fn test_api_key_selects_openai() {
        let mut config = offline_config();
        config.openai_api_key = Some("sk-test".to_string());
        let generator = create_text_generator(&config).await.unwrap();
        let info = generator.info();
        assert_eq!(info.name, "openai");
        assert_eq!(info.model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_explicit_provider_and_model() {
        let mut config = offline_config();
        config.provider = Some(GenerationProviderType::Ollama);
        config.model = Some("qwen2.5".to_string());
        let generator = create_text_generator(&config).await.unwrap();
        assert_eq!(generator.info().model, "qwen2.5");
    }
}
