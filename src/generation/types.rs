//! Text generation types and configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Text generation provider types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProviderType {
    Ollama,
    /// Any OpenAI-compatible chat completions API.
    Openai,
}

impl std::fmt::Display for GenerationProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::Openai => write!(f, "openai"),
        }
    }
}

impl std::str::FromStr for GenerationProviderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" | "openai-compatible" => Ok(Self::Openai),
            _ => Err(format!("Unknown generation provider: {s}")),
        }
    }
}

/// `generation` section of `~/.projmem/config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct GenerationSettings {
    pub enabled: Option<bool>,
    pub provider: Option<GenerationProviderType>,
    pub model: Option<String>,
    pub OLLAMA_ENDPOINT: Option<String>,
    pub OPENAI_API_KEY: Option<String>,
    pub OPENAI_BASE_URL: Option<String>,
}

/// Generation configuration after env overrides and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGeneration {
    pub enabled: bool,
    /// Explicitly configured provider; `None` means auto-detect.
    pub provider: Option<GenerationProviderType>,
    /// Explicit model; `None` means the provider default.
    pub model: Option<String>,
    pub ollama_endpoint: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
}

impl ResolvedGeneration {
    /// Model to use with `provider`.
    #[must_use]
    pub fn model_for(&self, provider: GenerationProviderType) -> String {
        self.model.clone().unwrap_or_else(|| {
            match provider {
                GenerationProviderType::Ollama => DEFAULT_OLLAMA_MODEL,
                GenerationProviderType::Openai => DEFAULT_OPENAI_MODEL,
            }
            .to_string()
        })
    }
}

/// Generator metadata.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratorInfo {
    pub name: String,
    pub model: String,
}
