use serde::{Deserialize, Serialize};

/// How disclaimer audio reaches the other party. Chosen once per deployment.
///
/// Under both policies the disclaimer is owed until the transcript holds an
/// agent reply, and `submit_turn` reports the disclaimer text while it is owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisclaimerPolicy {
    /// The first chosen reply is returned as disclaimer audio followed by reply audio.
    #[default]
    PrefixFirstReply,
    /// Disclaimer audio is returned once, with the first successful turn's
    /// suggestions; replies are never prefixed.
    WithSuggestions,
}

impl DisclaimerPolicy {
    pub fn audio_with_suggestions(&self) -> bool {
        matches!(self, DisclaimerPolicy::WithSuggestions)
    }

    pub fn prefixes_first_reply(&self) -> bool {
        matches!(self, DisclaimerPolicy::PrefixFirstReply)
    }
}
