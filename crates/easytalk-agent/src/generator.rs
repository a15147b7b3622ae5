use crate::backends::{build_provider, GenerationProvider};
use crate::config::ModelConfig;
use easytalk_core::EasytalkResult;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

/// Upper bound on suggestions handed back per turn.
pub const MAX_SUGGESTIONS: usize = 3;

/// Leading "1.", "2)", "- " or "* " list markers.
#[allow(clippy::unwrap_used)]
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d+\s*[.)]|[-*•]\s)\s*").unwrap());

/// Turns a prompt into at most [`MAX_SUGGESTIONS`] candidate replies.
pub struct SuggestionGenerator {
    provider: Arc<dyn GenerationProvider>,
}

impl SuggestionGenerator {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            provider: build_provider(config),
        }
    }

    /// Create from a pre-built provider (for custom providers and tests).
    pub fn from_provider(provider: Arc<dyn GenerationProvider>) -> Self {
        Self { provider }
    }

    pub async fn generate(&self, prompt: &str) -> EasytalkResult<Vec<String>> {
        let completion = self.provider.complete(prompt).await.map_err(|e| {
            warn!(error = %e, "Suggestion generation failed");
            e
        })?;
        let suggestions = parse_suggestions(&completion);
        info!(count = suggestions.len(), "Suggestions generated");
        Ok(suggestions)
    }
}

/// Split a completion into replies.
///
/// Blank lines are skipped, list markers are stripped, repeats are dropped, and
/// the result is truncated to the first [`MAX_SUGGESTIONS`]. Never pads.
pub fn parse_suggestions(completion: &str) -> Vec<String> {
    let mut suggestions: Vec<String> = Vec::with_capacity(MAX_SUGGESTIONS);
    for line in completion.lines() {
        let text = LIST_MARKER.replace(line, "");
        let text = text.trim();
        if text.is_empty() || suggestions.iter().any(|s| s == text) {
            continue;
        }
        suggestions.push(text.to_string());
        if suggestions.len() == MAX_SUGGESTIONS {
            break;
        }
    }
    suggestions
}
