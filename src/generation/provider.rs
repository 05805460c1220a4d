//! Text generator trait.
//!
//! Mirrors the embedding provider: an async trait with `impl Future`
//! methods plus a boxed wrapper for runtime selection.

use crate::error::Result;
use super::types::GeneratorInfo;
use std::future::Future;
use std::pin::Pin;

/// Trait for text generators.
pub trait TextGenerator: Send + Sync {
    /// Get generator metadata.
    fn info(&self) -> GeneratorInfo;

    /// Check if the generator can be reached.
    fn is_available(&self) -> impl Future<Output = bool> + Send;

    /// Complete a single prompt.
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Boxed generator for dynamic dispatch.
pub struct BoxedGenerator {
    inner: Box<dyn TextGeneratorBoxed>,
}

trait TextGeneratorBoxed: Send + Sync {
    fn info(&self) -> GeneratorInfo;
    fn is_available_boxed(&self) -> BoxFuture<'_, bool>;
    fn generate_boxed(&self, prompt: &str) -> BoxFuture<'_, Result<String>>;
}

impl BoxedGenerator {
    /// Create a new boxed generator.
    pub fn new<G: TextGenerator + 'static>(generator: G) -> Self {
        Self {
            inner: Box::new(BoxedGeneratorWrapper(generator)),
        }
    }

    /// Get generator metadata.
    #[must_use]
    pub fn info(&self) -> GeneratorInfo {
        self.inner.info()
    }

    /// Check if the generator can be reached.
    pub async fn is_available(&self) -> bool {
        self.inner.is_available_boxed().await
    }

    /// Complete a single prompt.
    ///
    /// # Errors
    ///
    /// Returns `Generation` if the call fails.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        self.inner.generate_boxed(prompt).await
    }
}

impl std::fmt::Debug for BoxedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let info = self.info();
        f.debug_struct("BoxedGenerator")
            .field("name", &info.name)
            .field("model", &info.model)
            .finish()
    }
}

struct BoxedGeneratorWrapper<G: TextGenerator + 'static>(G);

impl<G: TextGenerator + 'static> TextGeneratorBoxed for BoxedGeneratorWrapper<G> {
    fn info(&self) -> GeneratorInfo {
        self.0.info()
    }

    fn is_available_boxed(&self) -> BoxFuture<'_, bool> {
        Box::pin(self.0.is_available())
    }

    fn generate_boxed(&self, prompt: &str) -> BoxFuture<'_, Result<String>> {
        let prompt_owned = prompt.to_string();
        Box::pin(async move { self.0.generate(&prompt_owned).await })
    }
}
