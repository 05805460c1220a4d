//! OpenAI-compatible chat completions generator.
//!
//! Works against api.openai.com and any server exposing the same
//! `POST {base}/chat/completions` shape (vLLM, LM Studio, llama.cpp).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::provider::TextGenerator;
use super::types::GeneratorInfo;

const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);

/// OpenAI-compatible text generator.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiGenerator {
    /// Create a generator. `api_key` may be `None` for local servers that
    /// do not check it.
    #[must_use]
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

impl TextGenerator for OpenAiGenerator {
    fn info(&self) -> GeneratorInfo {
        GeneratorInfo {
            name: "openai".to_string(),
            model: self.model.clone(),
        }
    }

    async fn is_available(&self) -> bool {
        // Self-hosted servers usually skip auth.
        self.api_key.is_some() || !self.base_url.contains("api.openai.com")
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.2,
            stream: false,
        };

        let mut builder = self
            .client
            .post(self.url())
            .timeout(GENERATE_TIMEOUT)
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Generation(format!("Chat completion request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!(
                "Chat completion failed ({status}): {error}"
            )));
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("Failed to parse chat completion: {e}")))?;

        data.into_text()
            .ok_or_else(|| Error::Generation("Chat completion returned no content".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_base() {
        let g = OpenAiGenerator::new("http://localhost:8000/v1/", "m", None);
        assert_eq!(g.url(), "http://localhost:8000/v1/chat/completions");
    }

    #[test]
    fn test_response_parsing() {
        let data: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  Use SQLite. "}}]}"#,
        )
        .unwrap();
        assert_eq!(data.into_text().as_deref(), Some("Use SQLite."));

        let data: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(data.into_text().is_none());
    }

    #[tokio::test]
    async fn test_availability() {
        let hosted = OpenAiGenerator::new("https://api.openai.com/v1", "m", None);
        assert!(!hosted.is_available().await);
        let keyed = OpenAiGenerator::new("https://api.openai.com/v1", "m", Some("sk".into()));
        assert!(keyed.is_available().await);
        let local = OpenAiGenerator::new("http://localhost:1234/v1", "m", None);
        assert!(local.is_available().await);
    }
}
