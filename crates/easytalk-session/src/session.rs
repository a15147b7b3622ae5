use chrono::{DateTime, Utc};
use easytalk_core::{PersistedContext, Transcript, UserProfile};
use std::sync::Arc;

/// Where a live conversation stands with respect to the disclaimer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No agent reply has been spoken yet; the disclaimer is still owed.
    AwaitingDisclaimer,
    /// At least one reply was spoken; waiting for the next choice.
    AwaitingChoice,
}

/// Live, in-memory state of one ongoing call.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    pub caller_id: String,
    pub profile: Arc<UserProfile>,
    pub transcript: Transcript,
    pub historical_choices: Vec<String>,
    pub last_suggestions: Vec<String>,
    /// Set once disclaimer audio has been handed out with a turn's suggestions.
    pub disclaimer_audio_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationSession {
    /// Rebuild a session from its durable projection.
    pub fn new(
        caller_id: impl Into<String>,
        profile: Arc<UserProfile>,
        persisted: PersistedContext,
    ) -> Self {
        let now = Utc::now();
        Self {
            caller_id: caller_id.into(),
            profile,
            transcript: persisted.transcript(),
            historical_choices: persisted.historical_choices,
            last_suggestions: Vec::new(),
            disclaimer_audio_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.transcript.has_agent_reply() {
            SessionPhase::AwaitingChoice
        } else {
            SessionPhase::AwaitingDisclaimer
        }
    }

    pub fn disclaimer_pending(&self) -> bool {
        self.phase() == SessionPhase::AwaitingDisclaimer
    }

    pub fn append_utterance(&mut self, text: impl Into<String>) {
        self.updated_at = Utc::now();
        self.transcript.push_caller(text);
    }

    /// Record a spoken reply in both the transcript and the choice history.
    pub fn append_reply(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.updated_at = Utc::now();
        self.historical_choices.push(text.clone());
        self.transcript.push_agent(text);
    }

    pub fn set_suggestions(&mut self, suggestions: Vec<String>) {
        self.updated_at = Utc::now();
        self.last_suggestions = suggestions;
    }

    pub fn persisted(&self) -> PersistedContext {
        PersistedContext::new(&self.transcript, &self.historical_choices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ConversationSession {
        let profile = Arc::new(UserProfile::new("u1", "Alice", 34, "Toronto", "English"));
        ConversationSession::new("u1", profile, PersistedContext::default())
    }

    #[test]
    fn test_new_session_owes_disclaimer() {
        let s = session();
        assert_eq!(s.phase(), SessionPhase::AwaitingDisclaimer);
        assert!(s.transcript.is_empty());
    }

    #[test]
    fn test_utterance_keeps_disclaimer_pending() {
        let mut s = session();
        s.append_utterance("hello?");
        assert!(s.disclaimer_pending());
    }

    #[test]
    fn test_reply_moves_past_disclaimer() {
        let mut s = session();
        s.append_utterance("hello?");
        s.append_reply("Hi, this is Alice.");
        assert_eq!(s.phase(), SessionPhase::AwaitingChoice);
        assert_eq!(s.historical_choices, vec!["Hi, this is Alice."]);
    }

    #[test]
    fn test_persisted_projection() {
        let mut s = session();
        s.append_utterance("U");
        s.append_reply("R");
        let p = s.persisted();
        assert_eq!(p.context, "Caller: U\nAgent: R");
        assert_eq!(p.historical_choices, vec!["R"]);
    }

    #[test]
    fn test_rebuilt_from_persisted_reply_is_past_disclaimer() {
        let profile = Arc::new(UserProfile::new("u1", "Alice", 34, "Toronto", "English"));
        let persisted = PersistedContext {
            context: "Caller: hi\nAgent: hello".into(),
            historical_choices: vec!["hello".into()],
        };
        let s = ConversationSession::new("u1", profile, persisted);
        assert!(!s.disclaimer_pending());
        assert_eq!(s.transcript.len(), 2);
    }
}
