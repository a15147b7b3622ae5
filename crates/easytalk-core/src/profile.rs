use crate::error::{EasytalkError, EasytalkResult};
use serde::{Deserialize, Serialize};

/// The person being assisted during a call.
///
/// Read-only to the orchestrator; created and edited through a profile store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Stable identifier, also used as the caller id of a conversation.
    pub id: String,
    pub name: String,
    pub age: u32,
    pub location: String,
    #[serde(alias = "language")]
    pub preferred_language: String,
}

impl UserProfile {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        age: u32,
        location: impl Into<String>,
        preferred_language: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            age,
            location: location.into(),
            preferred_language: preferred_language.into(),
        }
    }

    /// Check that every field is filled in and the age is positive.
    pub fn validate(&self) -> EasytalkResult<()> {
        let blank = [
            ("id", &self.id),
            ("name", &self.name),
            ("location", &self.location),
            ("preferredLanguage", &self.preferred_language),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());

        if let Some((field, _)) = blank {
            return Err(EasytalkError::InvalidProfile(format!(
                "field '{field}' must not be empty"
            )));
        }
        if self.age == 0 {
            return Err(EasytalkError::InvalidProfile(
                "age must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }

    /// The spoken notice telling the other party that this user talks through
    /// assisted text-to-speech.
    pub fn disclaimer(&self) -> String {
        format!(
            "Hello! I'm {}. I currently have difficulty communicating smoothly. \
             I'm using EasyTalk. Thanks for your understanding!",
            self.name
        )
    }
}
