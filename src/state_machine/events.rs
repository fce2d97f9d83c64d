use serde::{Deserialize, Serialize};

/// Events that drive a session forward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Answer to the current main question or follow-up
    SubmitAnswer(String),
    /// Skip the current question, bypassing any follow-up
    Skip,
}

impl SessionEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SubmitAnswer(_) => "submit_answer",
            Self::Skip => "skip",
        }
    }

    pub fn answer_text(&self) -> Option<&str> {
        match self {
            Self::SubmitAnswer(text) => Some(text),
            Self::Skip => None,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip)
    }
}
