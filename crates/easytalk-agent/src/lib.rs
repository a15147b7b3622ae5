pub mod backends;
pub mod config;
pub mod generator;
pub mod prompt;
pub mod speech;

pub use backends::GenerationProvider;
pub use config::{
    AudioEncoding, LlmProvider, ModelConfig, SpeechConfig, SpeechProviderKind, VoiceConfig,
    VoiceGender,
};
pub use generator::{parse_suggestions, SuggestionGenerator, MAX_SUGGESTIONS};
pub use prompt::{PromptBuilder, PromptInput};
pub use speech::{SpeechProvider, SpeechSynthesizer};
