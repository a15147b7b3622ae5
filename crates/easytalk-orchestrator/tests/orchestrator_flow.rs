//! End-to-end conversation flow tests.
//!
//! Drives `SessionOrchestrator` through turns, choices and call endings with
//! in-process mock providers, checking disclaimer gating, transcript order,
//! audio concatenation and failure atomicity.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use easytalk_agent::{
    GenerationProvider, SpeechProvider, SpeechSynthesizer, SuggestionGenerator, VoiceConfig,
};
use easytalk_core::{EasytalkError, EasytalkResult, PersistedContext, UserProfile};
use easytalk_orchestrator::{DisclaimerPolicy, SessionOrchestrator};
use easytalk_session::{ContextStore, InMemoryContextStore, InMemoryProfileStore};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Mock providers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MockGeneration {
    fail: AtomicBool,
    delay_ms: u64,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl GenerationProvider for MockGeneration {
    async fn complete(&self, prompt: &str) -> EasytalkResult<String> {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(EasytalkError::GenerationFailed("provider down".into()));
        }
        Ok("1. Yes, that works.\n2. Could you repeat that?\n\n3. One moment please.\n4. Extra".into())
    }
}

/// Returns `<text>` as the "audio" so concatenation order is visible.
#[derive(Default)]
struct MockSpeech {
    fail: AtomicBool,
    calls: AtomicUsize,
}

#[async_trait]
impl SpeechProvider for MockSpeech {
    async fn synthesize(&self, text: &str, _voice: &VoiceConfig) -> EasytalkResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(EasytalkError::SynthesisFailed("tts down".into()));
        }
        Ok(format!("<{text}>").into_bytes())
    }
}

/// Context store whose writes can be switched off and whose loads can stall.
#[derive(Default)]
struct FlakyContextStore {
    inner: InMemoryContextStore,
    fail_writes: AtomicBool,
    load_delay_ms: AtomicU64,
}

#[async_trait]
impl ContextStore for FlakyContextStore {
    async fn load(&self, caller_id: &str) -> PersistedContext {
        let delay = self.load_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.inner.load(caller_id).await
    }

    async fn save(&self, caller_id: &str, context: &PersistedContext) -> EasytalkResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(EasytalkError::PersistenceFailed("disk full".into()));
        }
        self.inner.save(caller_id, context).await
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    orchestrator: Arc<SessionOrchestrator>,
    generation: Arc<MockGeneration>,
    speech: Arc<MockSpeech>,
    contexts: Arc<FlakyContextStore>,
}

fn alice() -> UserProfile {
    UserProfile::new("alice", "Alice", 34, "Toronto", "English")
}

fn bob() -> UserProfile {
    UserProfile::new("bob", "Bob", 71, "Leeds", "English")
}

fn harness_with(policy: DisclaimerPolicy, generation: MockGeneration) -> Harness {
    let generation = Arc::new(generation);
    let speech = Arc::new(MockSpeech::default());
    let contexts = Arc::new(FlakyContextStore::default());
    let profiles = Arc::new(InMemoryProfileStore::with_profiles([alice(), bob()]));

    let orchestrator = SessionOrchestrator::new(
        profiles,
        contexts.clone(),
        Arc::new(SuggestionGenerator::from_provider(generation.clone())),
        Arc::new(SpeechSynthesizer::from_provider(
            speech.clone(),
            VoiceConfig::default(),
        )),
        policy,
    );

    Harness {
        orchestrator: Arc::new(orchestrator),
        generation,
        speech,
        contexts,
    }
}

fn harness(policy: DisclaimerPolicy) -> Harness {
    harness_with(policy, MockGeneration::default())
}

fn disclaimer_audio(profile: &UserProfile) -> Vec<u8> {
    format!("<{}>", profile.disclaimer()).into_bytes()
}

// ---------------------------------------------------------------------------
// Disclaimer gating
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_first_turn_owes_disclaimer_text() {
    let h = harness(DisclaimerPolicy::PrefixFirstReply);

    let outcome = h
        .orchestrator
        .submit_turn("alice", Some("Hello, who is this?"), None)
        .await
        .unwrap();

    assert_eq!(
        outcome.suggestions,
        vec!["Yes, that works.", "Could you repeat that?", "One moment please."]
    );
    assert_eq!(outcome.disclaimer_text, Some(alice().disclaimer()));
    assert!(outcome.disclaimer_audio.is_none());
    assert_eq!(h.speech.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_disclaimer_cleared_after_first_reply() {
    let h = harness(DisclaimerPolicy::PrefixFirstReply);
    let o = &h.orchestrator;

    o.submit_turn("alice", Some("Hello?"), None).await.unwrap();
    // Still owed until a reply is actually spoken.
    let again = o.submit_turn("alice", Some("Anyone there?"), None).await.unwrap();
    assert!(again.disclaimer_text.is_some());

    o.choose_suggestion("alice", "Yes, that works.").await.unwrap();

    let later = o.submit_turn("alice", Some("Great."), None).await.unwrap();
    assert!(later.disclaimer_text.is_none());
    assert!(later.disclaimer_audio.is_none());
}

#[tokio::test]
async fn test_restored_context_with_reply_skips_disclaimer() {
    let h = harness(DisclaimerPolicy::PrefixFirstReply);
    h.contexts
        .save(
            "alice",
            &PersistedContext {
                context: "Caller: hi\nAgent: hello".into(),
                historical_choices: vec!["hello".into()],
            },
        )
        .await
        .unwrap();

    let outcome = h
        .orchestrator
        .submit_turn("alice", Some("How are you?"), None)
        .await
        .unwrap();
    assert!(outcome.disclaimer_text.is_none());

    let session = h.orchestrator.snapshot("alice").await.unwrap();
    assert_eq!(
        session.transcript.render(),
        "Caller: hi\nAgent: hello\nCaller: How are you?"
    );
}

// ---------------------------------------------------------------------------
// Choosing replies
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_choose_without_session_is_rejected() {
    let h = harness(DisclaimerPolicy::PrefixFirstReply);
    let err = h
        .orchestrator
        .choose_suggestion("alice", "Hello")
        .await
        .unwrap_err();
    assert!(matches!(err, EasytalkError::SessionNotFound(_)));
    assert_eq!(h.speech.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_transcript_order_and_persistence() {
    let h = harness(DisclaimerPolicy::PrefixFirstReply);
    let o = &h.orchestrator;

    o.submit_turn("alice", Some("  Is this Alice?  "), None)
        .await
        .unwrap();
    o.choose_suggestion("alice", "Yes, that works.").await.unwrap();

    let session = o.snapshot("alice").await.unwrap();
    assert!(session
        .transcript
        .render()
        .ends_with("Caller: Is this Alice?\nAgent: Yes, that works."));
    assert_eq!(session.historical_choices, vec!["Yes, that works."]);

    let stored = h.contexts.load("alice").await;
    assert_eq!(stored.context, "Caller: Is this Alice?\nAgent: Yes, that works.");
    assert_eq!(stored.historical_choices, vec!["Yes, that works."]);
}

#[tokio::test]
async fn test_first_reply_audio_is_disclaimer_then_reply() {
    let h = harness(DisclaimerPolicy::PrefixFirstReply);
    let o = &h.orchestrator;

    o.submit_turn("alice", Some("Hello?"), None).await.unwrap();
    let first = o.choose_suggestion("alice", "Hi!").await.unwrap();

    let mut expected = disclaimer_audio(&alice());
    expected.extend_from_slice(b"<Hi!>");
    assert_eq!(first.audio, expected);
    assert!(first.includes_disclaimer);

    o.submit_turn("alice", Some("What do you need?"), None)
        .await
        .unwrap();
    let second = o.choose_suggestion("alice", "A refill.").await.unwrap();
    assert_eq!(second.audio, b"<A refill.>".to_vec());
    assert!(!second.includes_disclaimer);
}

#[tokio::test]
async fn test_with_suggestions_policy_returns_audio_up_front() {
    let h = harness(DisclaimerPolicy::WithSuggestions);
    let o = &h.orchestrator;

    let outcome = o.submit_turn("alice", Some("Hello?"), None).await.unwrap();
    assert_eq!(outcome.disclaimer_audio, Some(disclaimer_audio(&alice())));
    assert!(outcome.disclaimer_text.is_some());

    let reply = o.choose_suggestion("alice", "Hi!").await.unwrap();
    assert_eq!(reply.audio, b"<Hi!>".to_vec());
    assert!(!reply.includes_disclaimer);
}

#[tokio::test]
async fn test_with_suggestions_audio_delivered_once_before_reply() {
    let h = harness(DisclaimerPolicy::WithSuggestions);
    let o = &h.orchestrator;

    let first = o.submit_turn("alice", Some("Hello?"), None).await.unwrap();
    assert!(first.disclaimer_audio.is_some());

    let second = o.submit_turn("alice", Some("Are you there?"), None).await.unwrap();
    assert!(second.disclaimer_audio.is_none());
    // Text keeps following the transcript until a reply is spoken.
    assert!(second.disclaimer_text.is_some());
    assert_eq!(h.speech.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_with_suggestions_audio_resent_after_failed_turn() {
    let h = harness(DisclaimerPolicy::WithSuggestions);
    let o = &h.orchestrator;

    h.generation.fail.store(true, Ordering::SeqCst);
    o.submit_turn("alice", Some("Hello?"), None).await.unwrap_err();

    h.generation.fail.store(false, Ordering::SeqCst);
    let retry = o.submit_turn("alice", None, Some("retry")).await.unwrap();
    assert_eq!(retry.disclaimer_audio, Some(disclaimer_audio(&alice())));
}

#[tokio::test]
async fn test_synthesis_failure_leaves_session_untouched() {
    let h = harness(DisclaimerPolicy::PrefixFirstReply);
    let o = &h.orchestrator;
    o.submit_turn("alice", Some("Hello?"), None).await.unwrap();

    h.speech.fail.store(true, Ordering::SeqCst);
    let err = o.choose_suggestion("alice", "Hi!").await.unwrap_err();
    assert!(matches!(err, EasytalkError::SynthesisFailed(_)));
    assert!(err.is_retryable());

    let session = o.snapshot("alice").await.unwrap();
    assert!(!session.transcript.has_agent_reply());
    assert!(session.historical_choices.is_empty());

    // Retrying the same choice still carries the disclaimer.
    h.speech.fail.store(false, Ordering::SeqCst);
    let reply = o.choose_suggestion("alice", "Hi!").await.unwrap();
    assert!(reply.includes_disclaimer);
    assert_eq!(o.snapshot("alice").await.unwrap().historical_choices, vec!["Hi!"]);
}

// ---------------------------------------------------------------------------
// Validation and failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_missing_input_rejected_before_state_change() {
    let h = harness(DisclaimerPolicy::PrefixFirstReply);
    let o = &h.orchestrator;

    for (caller, utterance, keyword) in [
        ("", Some("hi"), None),
        ("   ", Some("hi"), Some("kw")),
        ("alice", None, None),
        ("alice", Some("  "), Some("")),
    ] {
        let err = o.submit_turn(caller, utterance, keyword).await.unwrap_err();
        assert!(matches!(err, EasytalkError::MissingInput(_)), "got {err}");
    }
    assert!(matches!(
        o.choose_suggestion("alice", "   ").await.unwrap_err(),
        EasytalkError::MissingInput(_)
    ));
    assert_eq!(o.active_sessions().await, 0);
    assert!(h.generation.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelled_open_is_not_an_active_session() {
    let h = harness(DisclaimerPolicy::PrefixFirstReply);
    let o = &h.orchestrator;
    h.contexts.load_delay_ms.store(500, Ordering::SeqCst);

    let cancelled = tokio::time::timeout(
        Duration::from_millis(50),
        o.submit_turn("alice", Some("Hello?"), None),
    )
    .await;
    assert!(cancelled.is_err());
    assert_eq!(o.active_sessions().await, 0);
    assert!(o.snapshot("alice").await.is_none());

    h.contexts.load_delay_ms.store(0, Ordering::SeqCst);
    o.submit_turn("alice", Some("Hello?"), None).await.unwrap();
    assert_eq!(o.active_sessions().await, 1);
}

#[tokio::test]
async fn test_keyword_only_turn_does_not_touch_transcript() {
    let h = harness(DisclaimerPolicy::PrefixFirstReply);

    let outcome = h
        .orchestrator
        .submit_turn("alice", None, Some("pharmacy"))
        .await
        .unwrap();
    assert_eq!(outcome.suggestions.len(), 3);

    let session = h.orchestrator.snapshot("alice").await.unwrap();
    assert!(session.transcript.is_empty());
    assert!(h.generation.prompts.lock().unwrap()[0].contains("Keyword: pharmacy"));
}

#[tokio::test]
async fn test_unknown_profile_fails_without_session() {
    let h = harness(DisclaimerPolicy::PrefixFirstReply);
    let err = h
        .orchestrator
        .submit_turn("mallory", Some("hi"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EasytalkError::ProfileNotFound(_)));
    assert_eq!(h.orchestrator.active_sessions().await, 0);
}

#[tokio::test]
async fn test_generation_failure_keeps_persisted_utterance() {
    let h = harness(DisclaimerPolicy::PrefixFirstReply);
    let o = &h.orchestrator;
    o.submit_turn("alice", Some("First?"), None).await.unwrap();

    h.generation.fail.store(true, Ordering::SeqCst);
    let err = o.submit_turn("alice", Some("Second?"), None).await.unwrap_err();
    assert!(matches!(err, EasytalkError::GenerationFailed(_)));

    // The utterance append was already durable; suggestions are unchanged.
    let stored = h.contexts.load("alice").await;
    assert_eq!(stored.context, "Caller: First?\nCaller: Second?");
    let session = o.snapshot("alice").await.unwrap();
    assert_eq!(session.last_suggestions.len(), 3);

    // The next request regenerates from the persisted transcript.
    h.generation.fail.store(false, Ordering::SeqCst);
    o.submit_turn("alice", None, Some("retry")).await.unwrap();
    let prompts = h.generation.prompts.lock().unwrap();
    assert!(prompts
        .last()
        .unwrap()
        .contains("Caller: First?\nCaller: Second?"));
}

#[tokio::test]
async fn test_persistence_failure_is_surfaced_and_not_applied() {
    let h = harness(DisclaimerPolicy::PrefixFirstReply);
    let o = &h.orchestrator;
    o.submit_turn("alice", Some("Hello?"), None).await.unwrap();

    h.contexts.fail_writes.store(true, Ordering::SeqCst);
    let err = o.submit_turn("alice", Some("Lost?"), None).await.unwrap_err();
    assert!(matches!(err, EasytalkError::PersistenceFailed(_)));
    let err = o.choose_suggestion("alice", "Hi!").await.unwrap_err();
    assert!(matches!(err, EasytalkError::PersistenceFailed(_)));

    let session = o.snapshot("alice").await.unwrap();
    assert_eq!(session.transcript.render(), "Caller: Hello?");
}

// ---------------------------------------------------------------------------
// Ending calls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_end_call_starts_fresh_session() {
    let h = harness(DisclaimerPolicy::PrefixFirstReply);
    let o = &h.orchestrator;
    o.submit_turn("alice", Some("Hello?"), None).await.unwrap();
    o.choose_suggestion("alice", "Hi!").await.unwrap();

    o.end_call("alice").await.unwrap();
    assert!(o.snapshot("alice").await.is_none());
    assert!(h.contexts.load("alice").await.is_empty());

    let outcome = o.submit_turn("alice", Some("Hello again?"), None).await.unwrap();
    assert!(outcome.disclaimer_text.is_some());
    assert_eq!(
        o.snapshot("alice").await.unwrap().transcript.render(),
        "Caller: Hello again?"
    );
}

#[tokio::test]
async fn test_end_call_is_idempotent() {
    let h = harness(DisclaimerPolicy::PrefixFirstReply);
    let o = &h.orchestrator;
    o.submit_turn("alice", Some("Hello?"), None).await.unwrap();

    o.end_call("alice").await.unwrap();
    o.end_call("alice").await.unwrap();
    o.end_call("never-called").await.unwrap();
    assert_eq!(o.active_sessions().await, 0);
}

#[tokio::test]
async fn test_end_call_only_resets_that_caller() {
    let h = harness(DisclaimerPolicy::PrefixFirstReply);
    let o = &h.orchestrator;
    o.submit_turn("alice", Some("Hi Alice"), None).await.unwrap();
    o.submit_turn("bob", Some("Hi Bob"), None).await.unwrap();

    o.end_call("alice").await.unwrap();

    assert_eq!(h.contexts.load("bob").await.context, "Caller: Hi Bob");
    assert!(o.snapshot("bob").await.is_some());
    o.choose_suggestion("bob", "Hello!").await.unwrap();
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_concurrent_turns_for_same_caller_are_serialized() {
    let h = harness_with(
        DisclaimerPolicy::PrefixFirstReply,
        MockGeneration {
            delay_ms: 30,
            ..MockGeneration::default()
        },
    );

    let mut handles = Vec::new();
    for i in 0..5 {
        let o = h.orchestrator.clone();
        handles.push(tokio::spawn(async move {
            let text = format!("utterance {i}");
            o.submit_turn("alice", Some(&text), None).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let session = h.orchestrator.snapshot("alice").await.unwrap();
    assert_eq!(session.transcript.len(), 5);
    assert_eq!(h.contexts.load("alice").await.transcript().len(), 5);
}

#[tokio::test]
async fn test_different_callers_run_in_parallel() {
    let h = harness_with(
        DisclaimerPolicy::PrefixFirstReply,
        MockGeneration {
            delay_ms: 200,
            ..MockGeneration::default()
        },
    );

    let a = h.orchestrator.clone();
    let b = h.orchestrator.clone();
    let started = std::time::Instant::now();
    let (ra, rb) = tokio::join!(
        a.submit_turn("alice", Some("hi"), None),
        b.submit_turn("bob", Some("hi"), None)
    );
    ra.unwrap();
    rb.unwrap();
    assert!(started.elapsed() < Duration::from_millis(390));
}
