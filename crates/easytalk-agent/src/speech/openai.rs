use super::SpeechProvider;
use crate::config::{SpeechConfig, VoiceConfig};
use async_trait::async_trait;
use easytalk_core::{EasytalkError, EasytalkResult};

const DEFAULT_MODEL: &str = "tts-1";
const DEFAULT_VOICE: &str = "alloy";

/// OpenAI-compatible `/v1/audio/speech` backend; the response body is the audio.
pub struct OpenAiTtsBackend {
    config: SpeechConfig,
    http: reqwest::Client,
}

impl OpenAiTtsBackend {
    pub fn new(config: SpeechConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SpeechProvider for OpenAiTtsBackend {
    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> EasytalkResult<Vec<u8>> {
        let url = format!("{}/v1/audio/speech", self.config.base_url());

        let body = serde_json::json!({
            "model": self.config.model.as_deref().unwrap_or(DEFAULT_MODEL),
            "input": text,
            "voice": voice.voice_name.as_deref().unwrap_or(DEFAULT_VOICE),
            "response_format": voice.encoding.openai_format(),
        });

        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| EasytalkError::SynthesisFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let error_body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(EasytalkError::SynthesisFailed(format!(
                "TTS API error {status}: {error_body}"
            )));
        }

        let audio = resp
            .bytes()
            .await
            .map_err(|e| EasytalkError::SynthesisFailed(e.to_string()))?;
        if audio.is_empty() {
            return Err(EasytalkError::SynthesisFailed(
                "TTS API returned empty audio".to_string(),
            ));
        }
        Ok(audio.to_vec())
    }
}
