use super::SpeechProvider;
use crate::config::{SpeechConfig, VoiceConfig};
use async_trait::async_trait;
use base64::Engine;
use easytalk_core::{EasytalkError, EasytalkResult};

/// Google Cloud Text-to-Speech REST backend (`v1/text:synthesize`).
pub struct GoogleTtsBackend {
    config: SpeechConfig,
    http: reqwest::Client,
}

impl GoogleTtsBackend {
    pub fn new(config: SpeechConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

fn request_body(text: &str, voice: &VoiceConfig) -> serde_json::Value {
    let mut voice_json = serde_json::json!({
        "languageCode": voice.language_code,
        "ssmlGender": voice.gender.ssml_name(),
    });
    if let Some(name) = &voice.voice_name {
        voice_json["name"] = serde_json::json!(name);
    }
    serde_json::json!({
        "input": { "text": text },
        "voice": voice_json,
        "audioConfig": { "audioEncoding": voice.encoding.google_name() },
    })
}

#[async_trait]
impl SpeechProvider for GoogleTtsBackend {
    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> EasytalkResult<Vec<u8>> {
        let url = format!("{}/v1/text:synthesize", self.config.base_url());

        let resp = self
            .http
            .post(&url)
            .header("X-Goog-Api-Key", &self.config.api_key)
            .json(&request_body(text, voice))
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
                "Google TTS error {status}: {error_body}"
            )));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| EasytalkError::SynthesisFailed(format!("invalid response body: {e}")))?;

        decode_audio_content(&body)
    }
}

/// Decode the base64 `audioContent` field.
pub fn decode_audio_content(body: &serde_json::Value) -> EasytalkResult<Vec<u8>> {
    let encoded = body["audioContent"].as_str().ok_or_else(|| {
        EasytalkError::SynthesisFailed("response missing audioContent".to_string())
    })?;
    let audio = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| EasytalkError::SynthesisFailed(format!("audioContent is not base64: {e}")))?;
    if audio.is_empty() {
        return Err(EasytalkError::SynthesisFailed(
            "audioContent is empty".to_string(),
        ));
    }
    Ok(audio)
}
