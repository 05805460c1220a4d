//! Embedding types and configuration.
//!
//! `EmbeddingSettings` is the `embeddings` section of
//! `~/.projmem/config.json`; [`ResolvedEmbeddings`] is what remains after
//! environment overrides and defaults are applied.

use serde::{Deserialize, Serialize};

/// Embedding provider types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderType {
    Ollama,
    Huggingface,
}

impl std::fmt::Display for EmbeddingProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::Huggingface => write!(f, "huggingface"),
        }
    }
}

impl std::str::FromStr for EmbeddingProviderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "huggingface" | "hf" => Ok(Self::Huggingface),
            _ => Err(format!("Unknown embedding provider: {s}")),
        }
    }
}

/// Embedding settings stored in `~/.projmem/config.json`.
///
/// Key names follow the environment variables they mirror.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct EmbeddingSettings {
    pub enabled: Option<bool>,
    pub provider: Option<EmbeddingProviderType>,
    pub HF_TOKEN: Option<String>,
    pub HF_MODEL: Option<String>,
    pub HF_ENDPOINT: Option<String>,
    pub OLLAMA_ENDPOINT: Option<String>,
    pub OLLAMA_MODEL: Option<String>,
}

/// Embedding configuration after env overrides and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEmbeddings {
    pub enabled: bool,
    /// Explicitly configured provider; `None` means auto-detect.
    pub provider: Option<EmbeddingProviderType>,
    pub ollama_endpoint: String,
    pub ollama_model: String,
    pub hf_token: Option<String>,
    pub hf_model: String,
    pub hf_endpoint: String,
}

/// Provider metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
    pub dimensions: usize,
    pub max_chars: usize,
}

/// Model configuration with dimensions and max chars.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub name: String,
    pub dimensions: usize,
    pub max_chars: usize,
}

/// Ollama model configurations.
pub mod ollama_models {
    use super::ModelConfig;

    pub const DEFAULT_MODEL: &str = "nomic-embed-text";

    pub fn get_config(model: &str) -> ModelConfig {
        // Tags like "nomic-embed-text:latest" share the base model's shape.
        let base = model.split(':').next().unwrap_or(model);
        let (dimensions, max_chars) = match base {
            "mxbai-embed-large" => (1024, 1500),
            "all-minilm" => (384, 800),
            "snowflake-arctic-embed" => (1024, 1500),
            // nomic-embed-text and unknown models
            _ => (768, 5000),
        };
        ModelConfig {
            name: model.to_string(),
            dimensions,
            max_chars,
        }
    }
}

/// HuggingFace model configurations.
pub mod huggingface_models {
    use super::ModelConfig;

    pub const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

    pub fn get_config(model: &str) -> ModelConfig {
        let (dimensions, max_chars) = match model {
            "sentence-transformers/all-mpnet-base-v2" => (768, 1500),
            "BAAI/bge-large-en-v1.5" => (1024, 2000),
            // all-MiniLM-L6-v2 and unknown models
            _ => (384, 800),
        };
        ModelConfig {
            name: model.to_string(),
            dimensions,
            max_chars,
        }
    }
}
