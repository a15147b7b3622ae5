use super::GenerationProvider;
use crate::config::{LlmProvider, ModelConfig};
use async_trait::async_trait;
use easytalk_core::{EasytalkError, EasytalkResult};
use tracing::debug;

/// OpenAI-compatible chat completions backend.
///
/// Works with OpenAI, OpenRouter, Groq and any other provider that implements
/// the OpenAI chat completions API.
pub struct OpenAiBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn add_provider_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json");

        // OpenRouter requires extra headers
        if matches!(self.config.provider, LlmProvider::OpenRouter) {
            request
                .header("HTTP-Referer", "https://github.com/easytalk-app/easytalk")
                .header("X-Title", "EasyTalk")
        } else {
            request
        }
    }
}

#[async_trait]
impl GenerationProvider for OpenAiBackend {
    async fn complete(&self, prompt: &str) -> EasytalkResult<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());

        let body = serde_json::json!({
            "model": self.config.model_id,
            "messages": [{ "role": "user", "content": prompt }],
            "n": 1,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let resp = self
            .add_provider_headers(self.http.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| EasytalkError::GenerationFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let error_body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(EasytalkError::GenerationFailed(format!(
                "OpenAI API error {status}: {error_body}"
            )));
        }

        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| EasytalkError::GenerationFailed(format!("invalid response body: {e}")))?;

        let completion = parse_openai_completion(&resp_body)?;
        debug!(chars = completion.len(), "OpenAI completion received");
        Ok(completion)
    }
}

/// Extract `choices[0].message.content`.
pub fn parse_openai_completion(body: &serde_json::Value) -> EasytalkResult<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            EasytalkError::GenerationFailed(
                "response missing choices[0].message.content".to_string(),
            )
        })
}
