use crate::policy::DisclaimerPolicy;
use crate::registry::{SessionRegistry, Slot, SlotGuard};
use easytalk_agent::{AudioEncoding, PromptBuilder, PromptInput, SpeechSynthesizer, SuggestionGenerator};
use easytalk_core::{EasytalkError, EasytalkResult};
use easytalk_session::{ContextStore, ConversationSession, ProfileStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a submitted turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Up to three candidate replies, in provider order.
    pub suggestions: Vec<String>,
    /// Present while the disclaimer is still owed.
    pub disclaimer_text: Option<String>,
    /// Present only under [`DisclaimerPolicy::WithSuggestions`] while the disclaimer is owed.
    pub disclaimer_audio: Option<Vec<u8>>,
}

/// Audio for a chosen reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyAudio {
    pub audio: Vec<u8>,
    pub encoding: AudioEncoding,
    /// Whether the audio starts with the disclaimer.
    pub includes_disclaimer: bool,
}

/// Per-caller conversation state machine.
///
/// A caller has no session until its first turn, owes the disclaimer until a
/// reply has been chosen, and then waits for further choices until the call ends.
pub struct SessionOrchestrator {
    registry: SessionRegistry,
    profiles: Arc<dyn ProfileStore>,
    contexts: Arc<dyn ContextStore>,
    generator: Arc<SuggestionGenerator>,
    speech: Arc<SpeechSynthesizer>,
    policy: DisclaimerPolicy,
}

impl SessionOrchestrator {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        contexts: Arc<dyn ContextStore>,
        generator: Arc<SuggestionGenerator>,
        speech: Arc<SpeechSynthesizer>,
        policy: DisclaimerPolicy,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(),
            profiles,
            contexts,
            generator,
            speech,
            policy,
        }
    }

    pub fn policy(&self) -> DisclaimerPolicy {
        self.policy
    }

    pub fn audio_encoding(&self) -> AudioEncoding {
        self.speech.voice().encoding
    }

    pub fn profiles(&self) -> &Arc<dyn ProfileStore> {
        &self.profiles
    }

    /// Record the caller's utterance (if any) and produce reply suggestions.
    pub async fn submit_turn(
        &self,
        caller_id: &str,
        utterance: Option<&str>,
        keyword: Option<&str>,
    ) -> EasytalkResult<TurnOutcome> {
        let caller_id = require(caller_id, "userId")?;
        let utterance = non_blank(utterance);
        let keyword = non_blank(keyword);
        if utterance.is_none() && keyword.is_none() {
            return Err(EasytalkError::MissingInput(
                "callerInput or keywordInput".to_string(),
            ));
        }

        let mut guard = self.open_session(caller_id).await?;
        let Slot::Live(session) = &mut *guard else {
            return Err(EasytalkError::SessionNotFound(caller_id.to_string()));
        };

        let mut disclaimer_text = None;
        let mut disclaimer_audio = None;
        if session.disclaimer_pending() {
            let text = session.profile.disclaimer();
            if self.policy.audio_with_suggestions() && !session.disclaimer_audio_sent {
                disclaimer_audio = Some(self.speech.synthesize(&text).await?);
            }
            info!(caller_id = %caller_id, with_audio = disclaimer_audio.is_some(), "Disclaimer owed");
            disclaimer_text = Some(text);
        }

        if let Some(text) = utterance {
            let mut next = session.clone();
            next.append_utterance(text);
            self.contexts.save(caller_id, &next.persisted()).await?;
            *session = next;
            info!(caller_id = %caller_id, lines = session.transcript.len(), "Caller utterance recorded");
        }

        let prompt = PromptBuilder::build(&PromptInput {
            profile: &session.profile,
            transcript: &session.transcript,
            utterance,
            keyword,
        });
        let suggestions = self.generator.generate(&prompt).await?;
        session.set_suggestions(suggestions.clone());
        if disclaimer_audio.is_some() {
            session.disclaimer_audio_sent = true;
        }

        Ok(TurnOutcome {
            suggestions,
            disclaimer_text,
            disclaimer_audio,
        })
    }

    /// Record the chosen reply and return its audio.
    ///
    /// Audio is synthesized before anything is recorded, so a failed synthesis
    /// leaves the session untouched and the same choice can be retried.
    pub async fn choose_suggestion(
        &self,
        caller_id: &str,
        chosen: &str,
    ) -> EasytalkResult<ReplyAudio> {
        let caller_id = require(caller_id, "userId")?;
        let chosen = require(chosen, "chosenSuggestion")?;

        let mut guard = self
            .registry
            .acquire_existing(caller_id)
            .await
            .ok_or_else(|| EasytalkError::SessionNotFound(caller_id.to_string()))?;
        let Slot::Live(session) = &mut *guard else {
            return Err(EasytalkError::SessionNotFound(caller_id.to_string()));
        };

        let includes_disclaimer = session.disclaimer_pending() && self.policy.prefixes_first_reply();
        let audio = if includes_disclaimer {
            let disclaimer = session.profile.disclaimer();
            let (mut audio, reply) = tokio::try_join!(
                self.speech.synthesize(&disclaimer),
                self.speech.synthesize(chosen)
            )?;
            audio.extend_from_slice(&reply);
            audio
        } else {
            self.speech.synthesize(chosen).await?
        };

        let mut next = session.clone();
        next.append_reply(chosen);
        self.contexts.save(caller_id, &next.persisted()).await?;
        *session = next;

        info!(
            caller_id = %caller_id,
            includes_disclaimer,
            bytes = audio.len(),
            "Reply chosen"
        );
        Ok(ReplyAudio {
            audio,
            encoding: self.audio_encoding(),
            includes_disclaimer,
        })
    }

    /// Drop the caller's session and reset its stored context. Idempotent.
    pub async fn end_call(&self, caller_id: &str) -> EasytalkResult<()> {
        let caller_id = require(caller_id, "userId")?;

        let guard = self.registry.acquire(caller_id).await;
        let had_session = matches!(*guard, Slot::Live(_));
        let cleared = self.contexts.clear(caller_id).await;
        self.registry.discard(caller_id, guard).await;

        match &cleared {
            Ok(()) => info!(caller_id = %caller_id, had_session, "Call ended"),
            Err(e) => warn!(caller_id = %caller_id, error = %e, "Call ended but context reset failed"),
        }
        cleared
    }

    /// Copy of the caller's live session, if any.
    pub async fn snapshot(&self, caller_id: &str) -> Option<ConversationSession> {
        let guard = self.registry.acquire_existing(caller_id).await?;
        match &*guard {
            Slot::Live(session) => Some(session.clone()),
            _ => None,
        }
    }

    pub async fn active_sessions(&self) -> usize {
        self.registry.len().await
    }

    /// Lock the caller's slot, building the session on first use.
    async fn open_session(&self, caller_id: &str) -> EasytalkResult<SlotGuard> {
        let mut guard = self.registry.acquire(caller_id).await;
        if matches!(*guard, Slot::Live(_)) {
            return Ok(guard);
        }

        let profile = match self.profiles.get(caller_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                self.registry.discard(caller_id, guard).await;
                warn!(caller_id = %caller_id, "No profile for caller");
                return Err(EasytalkError::ProfileNotFound(caller_id.to_string()));
            }
            Err(e) => {
                self.registry.discard(caller_id, guard).await;
                return Err(e);
            }
        };

        let persisted = self.contexts.load(caller_id).await;
        let session = ConversationSession::new(caller_id, Arc::new(profile), persisted);
        info!(
            caller_id = %caller_id,
            restored_lines = session.transcript.len(),
            "Session created"
        );
        *guard = Slot::Live(session);
        Ok(guard)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn require<'a>(value: &'a str, field: &str) -> EasytalkResult<&'a str> {
    non_blank(Some(value)).ok_or_else(|| EasytalkError::MissingInput(field.to_string()))
}
