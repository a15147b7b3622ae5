//! Prompt assembly for reply suggestions.
//!
//! Pure string building: the same inputs always produce the same prompt.

use easytalk_core::{Transcript, UserProfile};

/// Everything the prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub profile: &'a UserProfile,
    pub transcript: &'a Transcript,
    /// The caller's latest utterance, if any was supplied this turn.
    pub utterance: Option<&'a str>,
    /// Optional topic hint typed by the helper.
    pub keyword: Option<&'a str>,
}

pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(input: &PromptInput<'_>) -> String {
        let profile = input.profile;
        let transcript = if input.transcript.is_empty() {
            "(the call has just started)".to_string()
        } else {
            input.transcript.render()
        };
        let utterance = non_blank(input.utterance).unwrap_or("(nothing new)");
        let keyword_line = non_blank(input.keyword)
            .map(|k| format!("\nKeyword: {k}"))
            .unwrap_or_default();

        format!(
            "Given the following context:\n\
             User Profile: Name: {name}, Age: {age}, Location: {location}, Language: {language}\n\
             Call Context:\n{transcript}\n\
             Caller Input: {utterance}{keyword_line}\n\
             \n\
             Generate exactly 3 replies the user could say next. Write them from the \
             user's own perspective, tailored to their profile, the call so far and \
             the keyword if one is given. Each reply must be concise and easy to say \
             aloud. Put each reply on its own line with no extra commentary.",
            name = profile.name,
            age = profile.age,
            location = profile.location,
            language = profile.preferred_language,
        )
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
