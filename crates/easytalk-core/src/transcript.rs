use serde::{Deserialize, Serialize};
use std::fmt;

const CALLER_PREFIX: &str = "Caller:";
const AGENT_PREFIX: &str = "Agent:";

// ---------------------------------------------------------------------------
// TranscriptLine
// ---------------------------------------------------------------------------

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text")]
pub enum TranscriptLine {
    /// What the other party on the call said.
    CallerUtterance(String),
    /// The reply the helper chose and the user spoke.
    AgentReply(String),
}

impl TranscriptLine {
    pub fn text(&self) -> &str {
        match self {
            TranscriptLine::CallerUtterance(text) | TranscriptLine::AgentReply(text) => text,
        }
    }

    pub fn is_agent_reply(&self) -> bool {
        matches!(self, TranscriptLine::AgentReply(_))
    }

    fn text_mut(&mut self) -> &mut String {
        match self {
            TranscriptLine::CallerUtterance(text) | TranscriptLine::AgentReply(text) => text,
        }
    }
}

impl fmt::Display for TranscriptLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptLine::CallerUtterance(text) => write!(f, "{CALLER_PREFIX} {text}"),
            TranscriptLine::AgentReply(text) => write!(f, "{AGENT_PREFIX} {text}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// Append-only, ordered conversation log.
///
/// Serialized as newline-delimited `Caller: <text>` / `Agent: <text>` lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    lines: Vec<TranscriptLine>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the newline-delimited form back into lines.
    ///
    /// Blank lines are skipped. A line without a known prefix continues the
    /// text of the previous entry; leading unprefixed lines are dropped.
    pub fn parse(serialized: &str) -> Self {
        let mut lines: Vec<TranscriptLine> = Vec::new();
        for raw in serialized.lines() {
            if raw.trim().is_empty() {
                continue;
            }
            if let Some(rest) = raw.strip_prefix(CALLER_PREFIX) {
                lines.push(TranscriptLine::CallerUtterance(rest.trim_start().to_string()));
            } else if let Some(rest) = raw.strip_prefix(AGENT_PREFIX) {
                lines.push(TranscriptLine::AgentReply(rest.trim_start().to_string()));
            } else if let Some(last) = lines.last_mut() {
                let text = last.text_mut();
                text.push('\n');
                text.push_str(raw);
            }
        }
        Self { lines }
    }

    /// Append a line. Embedded line breaks are folded into spaces so the
    /// rendered form parses back to exactly the same lines.
    pub fn push(&mut self, line: TranscriptLine) {
        let line = match line {
            TranscriptLine::CallerUtterance(text) => {
                TranscriptLine::CallerUtterance(single_line(text))
            }
            TranscriptLine::AgentReply(text) => TranscriptLine::AgentReply(single_line(text)),
        };
        self.lines.push(line);
    }

    pub fn push_caller(&mut self, text: impl Into<String>) {
        self.push(TranscriptLine::CallerUtterance(text.into()));
    }

    pub fn push_agent(&mut self, text: impl Into<String>) {
        self.push(TranscriptLine::AgentReply(text.into()));
    }

    pub fn lines(&self) -> &[TranscriptLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True once at least one agent reply has been spoken.
    pub fn has_agent_reply(&self) -> bool {
        self.lines.iter().any(TranscriptLine::is_agent_reply)
    }

    /// Newline-delimited form fed to generation and persisted.
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn single_line(text: String) -> String {
    if !text.contains(['\n', '\r']) {
        return text;
    }
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// PersistedContext
// ---------------------------------------------------------------------------

/// Durable projection of a conversation: its serialized transcript plus the
/// replies chosen so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedContext {
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub historical_choices: Vec<String>,
}

impl PersistedContext {
    pub fn new(transcript: &Transcript, historical_choices: &[String]) -> Self {
        Self {
            context: transcript.render(),
            historical_choices: historical_choices.to_vec(),
        }
    }

    pub fn transcript(&self) -> Transcript {
        Transcript::parse(&self.context)
    }

    pub fn is_empty(&self) -> bool {
        self.context.trim().is_empty() && self.historical_choices.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_render_orders_lines() {
        let mut t = Transcript::new();
        t.push_caller("Is this the pharmacy?");
        t.push_agent("Yes, how can I help?");
        assert_eq!(
            t.render(),
            "Caller: Is this the pharmacy?\nAgent: Yes, how can I help?"
        );
    }

    #[test]
    fn test_parse_tolerates_leading_newline() {
        // Contexts written by the legacy service start with a newline.
        let t = Transcript::parse("\nCaller: hi\nAgent: hello");
        assert_eq!(t.len(), 2);
        assert_eq!(t.lines()[0], TranscriptLine::CallerUtterance("hi".into()));
        assert_eq!(t.lines()[1], TranscriptLine::AgentReply("hello".into()));
    }

    #[test]
    fn test_parse_joins_continuation_lines() {
        let t = Transcript::parse("Caller: my address is\n12 Main St\nAgent: thanks");
        assert_eq!(t.len(), 2);
        assert_eq!(t.lines()[0].text(), "my address is\n12 Main St");
    }

    #[test]
    fn test_parse_render_is_stable() {
        let text = "Caller: one\nAgent: two\nCaller: three";
        assert_eq!(Transcript::parse(text).render(), text);
    }

    #[test]
    fn test_push_folds_line_breaks() {
        let mut t = Transcript::new();
        t.push_caller("my order number is\nAgent: 42");
        t.push_agent("ok,\r\n  thanks\r");
        assert_eq!(t.lines()[0].text(), "my order number is Agent: 42");
        assert_eq!(t.lines()[1].text(), "ok, thanks");

        let reparsed = Transcript::parse(&t.render());
        assert_eq!(reparsed, t);
        assert_eq!(
            reparsed.lines().iter().filter(|l| l.is_agent_reply()).count(),
            1
        );
    }

    #[test]
    fn test_has_agent_reply() {
        let mut t = Transcript::new();
        assert!(!t.has_agent_reply());
        t.push_caller("hello?");
        assert!(!t.has_agent_reply());
        t.push_agent("hi");
        assert!(t.has_agent_reply());
    }

    #[test]
    fn test_caller_line_mentioning_agent_is_not_a_reply() {
        let t = Transcript::parse("Caller: Agent: are you there?");
        assert!(!t.has_agent_reply());
        assert_eq!(t.lines()[0].text(), "Agent: are you there?");
    }

    #[test]
    fn test_persisted_context_json_shape() {
        let mut t = Transcript::new();
        t.push_caller("hi");
        t.push_agent("hello");
        let ctx = PersistedContext::new(&t, &["hello".to_string()]);
        let v = serde_json::to_value(&ctx).unwrap();
        assert_eq!(v["context"], "Caller: hi\nAgent: hello");
        assert_eq!(v["historicalChoices"][0], "hello");
    }

    #[test]
    fn test_persisted_context_missing_fields_default() {
        let ctx: PersistedContext = serde_json::from_str("{}").unwrap();
        assert!(ctx.is_empty());
        assert!(ctx.transcript().is_empty());
    }
}
