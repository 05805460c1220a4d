//! In-process fakes for the embedding and generation seams.

use std::sync::{Arc, Mutex};

use crate::embeddings::{EmbeddingProvider, ProviderInfo};
use crate::error::{Error, Result};
use crate::generation::{GeneratorInfo, TextGenerator};

/// Embeds text by keyword: the first configured key contained in the text
/// (case-insensitive) picks the vector. Unmatched text gets a constant vector.
pub struct FakeEmbedder {
    vectors: Vec<(String, Vec<f32>)>,
    model: String,
    fail: bool,
}

impl FakeEmbedder {
    pub fn new(vectors: &[(&str, Vec<f32>)]) -> Self {
        Self {
            vectors: vectors
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.clone()))
                .collect(),
            model: "fake-embed".to_string(),
            fail: false,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn failing() -> Self {
        Self {
            vectors: Vec::new(),
            model: "fake-embed".to_string(),
            fail: true,
        }
    }

    fn dimensions(&self) -> usize {
        self.vectors.first().map_or(3, |(_, v)| v.len())
    }
}

impl EmbeddingProvider for FakeEmbedder {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "fake".to_string(),
            model: self.model.clone(),
            dimensions: self.dimensions(),
            max_chars: 10_000,
        }
    }

    async fn is_available(&self) -> bool {
        !self.fail
    }

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail {
            return Err(Error::Embedding("fake provider is down".into()));
        }
        let lower = text.to_lowercase();
        let vector = self
            .vectors
            .iter()
            .find(|(key, _)| lower.contains(key.as_str()))
            .map_or_else(|| vec![0.5; self.dimensions()], |(_, v)| v.clone());
        Ok(vector)
    }
}

/// Replies with a canned string (or fails) and records prompts.
pub struct FakeGenerator {
    reply: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Arc::default(),
        }
    }

    /// Shared handle to the prompts received, usable after boxing.
    pub fn prompt_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

impl TextGenerator for FakeGenerator {
    fn info(&self) -> GeneratorInfo {
        GeneratorInfo {
            name: "fake".to_string(),
            model: "fake-gen".to_string(),
        }
    }

    async fn is_available(&self) -> bool {
        self.reply.is_some()
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.reply
            .clone()
            .ok_or_else(|| Error::Generation("fake generator is down".into()))
    }
}
