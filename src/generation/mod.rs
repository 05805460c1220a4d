//! Text generation for answer synthesis and task extraction.
//!
//! Two backends:
//! - **Ollama** `POST /api/generate` with `stream: false`
//! - **OpenAI-compatible** `POST {base}/chat/completions`
//!
//! Configured by the `generation` section of `~/.projmem/config.json` and
//! `PM_GENERATION_PROVIDER`, `PM_GENERATION_MODEL`, `OLLAMA_ENDPOINT`,
//! `OPENAI_API_KEY`, `OPENAI_BASE_URL`.

pub mod config;
pub mod factory;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod types;

pub use config::resolve_generation;
pub use factory::{create_generator_by_type, create_text_generator};
pub use ollama::OllamaGenerator;
pub use openai::OpenAiGenerator;
pub use provider::{BoxedGenerator, TextGenerator};
pub use types::{GenerationProviderType, GenerationSettings, GeneratorInfo, ResolvedGeneration};
