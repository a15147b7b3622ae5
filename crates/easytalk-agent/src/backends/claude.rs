use super::GenerationProvider;
use crate::config::ModelConfig;
use async_trait::async_trait;
use easytalk_core::{EasytalkError, EasytalkResult};

/// Claude (Anthropic) Messages API backend.
pub struct ClaudeBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl ClaudeBackend {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl GenerationProvider for ClaudeBackend {
    async fn complete(&self, prompt: &str) -> EasytalkResult<String> {
        let url = format!("{}/v1/messages", self.config.base_url());

        let body = serde_json::json!({
            "model": self.config.model_id,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let resp = self
            .http
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
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
                "Claude API error {status}: {error_body}"
            )));
        }

        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| EasytalkError::GenerationFailed(format!("invalid response body: {e}")))?;

        parse_claude_completion(&resp_body)
    }
}

/// Concatenate the text blocks of a Messages API response.
pub fn parse_claude_completion(body: &serde_json::Value) -> EasytalkResult<String> {
    let blocks = body["content"].as_array().ok_or_else(|| {
        EasytalkError::GenerationFailed("response missing content array".to_string())
    })?;

    let texts: Vec<&str> = blocks
        .iter()
        .filter(|b| b["type"] == "text")
        .filter_map(|b| b["text"].as_str())
        .collect();

    if texts.is_empty() {
        return Err(EasytalkError::GenerationFailed(
            "response has no text content".to_string(),
        ));
    }
    Ok(texts.join(""))
}
