//! Conversation session orchestration.
//!
//! Owns per-caller conversation state, decides when the disclaimer is owed,
//! assembles prompts from the accumulated transcript and sequences synthesized
//! audio for delivery.
//!
//! # Main types
//!
//! - [`SessionOrchestrator`]: `submit_turn` / `choose_suggestion` / `end_call`.
//! - [`SessionRegistry`]: Live sessions keyed by caller id, one lock per caller.
//! - [`DisclaimerPolicy`]: How the one-time disclaimer audio is delivered.

/// Turn, choice and end-of-call transitions.
pub mod engine;
/// Disclaimer delivery policy.
pub mod policy;
/// Per-caller session slots.
pub mod registry;

pub use engine::{ReplyAudio, SessionOrchestrator, TurnOutcome};
pub use policy::DisclaimerPolicy;
pub use registry::SessionRegistry;
