pub mod google;
pub mod openai;

use crate::config::{SpeechConfig, SpeechProviderKind, VoiceConfig};
use async_trait::async_trait;
use easytalk_core::{EasytalkError, EasytalkResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Trait for speech-synthesis provider backends.
///
/// Returns encoded audio bytes. Transport errors, non-success responses and
/// empty or malformed audio payloads surface as `EasytalkError::SynthesisFailed`.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> EasytalkResult<Vec<u8>>;
}

/// Pick the backend for the configured provider.
pub fn build_provider(config: SpeechConfig) -> Arc<dyn SpeechProvider> {
    match config.provider {
        SpeechProviderKind::Google => Arc::new(google::GoogleTtsBackend::new(config)),
        SpeechProviderKind::OpenAi => Arc::new(openai::OpenAiTtsBackend::new(config)),
    }
}

/// Text-to-speech with a fixed voice. No caching: every call re-synthesizes.
pub struct SpeechSynthesizer {
    provider: Arc<dyn SpeechProvider>,
    voice: VoiceConfig,
}

impl SpeechSynthesizer {
    pub fn new(config: SpeechConfig) -> Self {
        let voice = config.voice.clone();
        Self {
            provider: build_provider(config),
            voice,
        }
    }

    /// Create from a pre-built provider (for custom providers and tests).
    pub fn from_provider(provider: Arc<dyn SpeechProvider>, voice: VoiceConfig) -> Self {
        Self { provider, voice }
    }

    pub fn voice(&self) -> &VoiceConfig {
        &self.voice
    }

    pub async fn synthesize(&self, text: &str) -> EasytalkResult<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(EasytalkError::SynthesisFailed(
                "nothing to synthesize".to_string(),
            ));
        }
        let audio = self
            .provider
            .synthesize(text, &self.voice)
            .await
            .map_err(|e| {
                warn!(error = %e, "Speech synthesis failed");
                e
            })?;
        if audio.is_empty() {
            return Err(EasytalkError::SynthesisFailed(
                "provider returned empty audio".to_string(),
            ));
        }
        debug!(bytes = audio.len(), "Speech synthesized");
        Ok(audio)
    }
}
