use thiserror::Error;

/// A convenience `Result` alias using [`EasytalkError`].
pub type EasytalkResult<T> = Result<T, EasytalkError>;

/// Top-level error type for EasyTalk.
///
/// Validation variants (`MissingInput`, `InvalidProfile`) are raised before any
/// state changes. Provider variants (`GenerationFailed`, `SynthesisFailed`) are
/// retryable: the caller may repeat the same request.
#[derive(Error, Debug)]
pub enum EasytalkError {
    /// The request lacked a caller id or any usable text.
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// No profile is stored for the given caller id.
    #[error("User profile not found: {0}")]
    ProfileNotFound(String),

    /// A suggestion was chosen without an active conversation.
    #[error("Active conversation not found: {0}")]
    SessionNotFound(String),

    /// The text-generation provider failed or returned an unusable body.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// The speech-synthesis provider failed or returned no audio.
    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    /// A durable write did not complete.
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    /// A profile failed validation on write.
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EasytalkError {
    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EasytalkError::GenerationFailed(_) | EasytalkError::SynthesisFailed(_)
        )
    }
}
