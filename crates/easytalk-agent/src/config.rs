use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Text generation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAi,
    OpenRouter,
    /// Groq cloud inference, OpenAI-compatible API.
    Groq,
    Claude,
}

impl LlmProvider {
    /// Environment variable consulted when no key is configured.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "OPENAI_API_KEY",
            LlmProvider::OpenRouter => "OPENROUTER_API_KEY",
            LlmProvider::Groq => "GROQ_API_KEY",
            LlmProvider::Claude => "ANTHROPIC_API_KEY",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: LlmProvider,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default)]
    pub api_key: String,
    pub api_base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model_id() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    256
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model_id: default_model_id(),
            api_key: String::new(),
            api_base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl ModelConfig {
    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.api_base_url {
            url
        } else {
            match self.provider {
                LlmProvider::OpenAi => "https://api.openai.com",
                LlmProvider::OpenRouter => "https://openrouter.ai/api",
                LlmProvider::Groq => "https://api.groq.com/openai",
                LlmProvider::Claude => "https://api.anthropic.com",
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Speech synthesis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechProviderKind {
    /// Google Cloud Text-to-Speech REST API.
    #[default]
    Google,
    /// OpenAI-compatible `/v1/audio/speech`.
    OpenAi,
}

impl SpeechProviderKind {
    pub fn api_key_env(&self) -> &'static str {
        match self {
            SpeechProviderKind::Google => "GOOGLE_TTS_API_KEY",
            SpeechProviderKind::OpenAi => "OPENAI_API_KEY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    Male,
    Female,
    #[default]
    Neutral,
}

impl VoiceGender {
    /// Google `ssmlGender` value.
    pub fn ssml_name(&self) -> &'static str {
        match self {
            VoiceGender::Male => "MALE",
            VoiceGender::Female => "FEMALE",
            VoiceGender::Neutral => "NEUTRAL",
        }
    }
}

/// Compressed encodings the providers can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoding {
    #[default]
    Mp3,
    OggOpus,
}

impl AudioEncoding {
    /// Google `audioEncoding` value.
    pub fn google_name(&self) -> &'static str {
        match self {
            AudioEncoding::Mp3 => "MP3",
            AudioEncoding::OggOpus => "OGG_OPUS",
        }
    }

    /// OpenAI `response_format` value.
    pub fn openai_format(&self) -> &'static str {
        match self {
            AudioEncoding::Mp3 => "mp3",
            AudioEncoding::OggOpus => "opus",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioEncoding::Mp3 => "audio/mpeg",
            AudioEncoding::OggOpus => "audio/ogg",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            AudioEncoding::Mp3 => "mp3",
            AudioEncoding::OggOpus => "ogg",
        }
    }
}

/// Fixed voice settings sent with every synthesis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default = "default_language_code")]
    pub language_code: String,
    #[serde(default)]
    pub gender: VoiceGender,
    /// Provider-specific voice name (Google voice id, or OpenAI voice like `alloy`).
    #[serde(default)]
    pub voice_name: Option<String>,
    #[serde(default)]
    pub encoding: AudioEncoding,
}

fn default_language_code() -> String {
    "en-US".to_string()
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language_code: default_language_code(),
            gender: VoiceGender::Neutral,
            voice_name: None,
            encoding: AudioEncoding::Mp3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    pub provider: SpeechProviderKind,
    #[serde(default)]
    pub api_key: String,
    pub api_base_url: Option<String>,
    /// Synthesis model, used by OpenAI-compatible providers (`tts-1` by default).
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub voice: VoiceConfig,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            provider: SpeechProviderKind::default(),
            api_key: String::new(),
            api_base_url: None,
            model: None,
            voice: VoiceConfig::default(),
        }
    }
}

impl SpeechConfig {
    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.api_base_url {
            url
        } else {
            match self.provider {
                SpeechProviderKind::Google => "https://texttospeech.googleapis.com",
                SpeechProviderKind::OpenAi => "https://api.openai.com",
            }
        }
    }
}
