//! Embedding module for semantic search.
//!
//! Provides embedding generation using HTTP-based providers:
//! - **Ollama** (local) - Recommended for development
//! - **HuggingFace** (cloud) - Requires API token
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  CLI Commands    │
//! │ (search/embed)   │
//! └────────┬─────────┘
//!          │ ResolvedEmbeddings
//!          ▼
//! ┌─────────────────┐
//! │    Factory      │  ← explicit provider, or auto-detect
//! └────────┬────────┘
//!          │
//!     ┌────┴────┐
//!     ▼         ▼
//! ┌───────┐ ┌───────────┐
//! │Ollama │ │HuggingFace│
//! └───────┘ └───────────┘
//! ```
//!
//! # Configuration
//!
//! The `embeddings` section of `~/.projmem/config.json`, overridden by:
//! - `OLLAMA_ENDPOINT` - Ollama server URL (default: `http://localhost:11434`)
//! - `OLLAMA_MODEL` - Embedding model (default: `nomic-embed-text`)
//! - `HF_TOKEN` - HuggingFace API token
//! - `HF_MODEL` - HuggingFace model (default: `sentence-transformers/all-MiniLM-L6-v2`)
//! - `HF_ENDPOINT` - HuggingFace inference endpoint
//! - `PM_EMBEDDINGS_ENABLED` - Enable/disable embeddings (default: `true`)
//!
//! The provider is built once per command and passed to whatever needs it.

pub mod config;
pub mod factory;
pub mod huggingface;
pub mod ollama;
pub mod provider;
pub mod types;

pub use config::resolve_embeddings;
pub use factory::{
    create_embedding_provider, create_provider_by_type, detect_available_providers,
    ProviderDetection,
};
pub use huggingface::HuggingFaceProvider;
pub use ollama::OllamaProvider;
pub use provider::{BoxedProvider, EmbeddingProvider};
pub use types::{
    EmbeddingProviderType, EmbeddingSettings, ModelConfig, ProviderInfo, ResolvedEmbeddings,
};
