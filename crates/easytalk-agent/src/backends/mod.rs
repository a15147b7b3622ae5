pub mod claude;
pub mod openai;

use crate::config::{LlmProvider, ModelConfig};
use async_trait::async_trait;
use easytalk_core::EasytalkResult;
use std::sync::Arc;

/// Trait for text-generation provider backends.
///
/// One prompt in, one raw completion out. Transport errors, non-success
/// responses and bodies without a completion all surface as
/// `EasytalkError::GenerationFailed`.
///
/// To add a new provider:
/// 1. Create a new module in `backends/`
/// 2. Implement `GenerationProvider` for your struct
/// 3. Add the variant to `LlmProvider` in `config.rs`
/// 4. Wire it up in [`build_provider`]
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> EasytalkResult<String>;
}

/// Pick the backend for the configured provider.
pub fn build_provider(config: ModelConfig) -> Arc<dyn GenerationProvider> {
    match config.provider {
        LlmProvider::OpenAi | LlmProvider::OpenRouter | LlmProvider::Groq => {
            Arc::new(openai::OpenAiBackend::new(config))
        }
        LlmProvider::Claude => Arc::new(claude::ClaudeBackend::new(config)),
    }
}
