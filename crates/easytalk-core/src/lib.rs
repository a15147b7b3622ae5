//! Core types and error definitions for EasyTalk.
//!
//! This crate provides the foundational types shared across all EasyTalk crates:
//! the error taxonomy, the caller profile, and the conversation transcript model.
//!
//! # Main types
//!
//! - [`EasytalkError`]: Unified error enum for every EasyTalk subsystem.
//! - [`EasytalkResult`]: Convenience alias for `Result<T, EasytalkError>`.
//! - [`UserProfile`]: The person being assisted during a call.
//! - [`TranscriptLine`]: One caller utterance or one agent reply.
//! - [`Transcript`]: Append-only, ordered log of transcript lines.
//! - [`PersistedContext`]: Durable projection of a conversation.

/// Error taxonomy.
pub mod error;
/// Caller profile and the personalised disclaimer.
pub mod profile;
/// Transcript lines and their newline-delimited serialization.
pub mod transcript;

pub use error::{EasytalkError, EasytalkResult};
pub use profile::UserProfile;
pub use transcript::{PersistedContext, Transcript, TranscriptLine};
