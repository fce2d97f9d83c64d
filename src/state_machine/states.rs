use crate::models::{FinalEvaluation, Question};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a session is in the question → follow-up → next question cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStage {
    /// Waiting for the answer to the current main question
    #[default]
    Question,
    /// Waiting for the answer to the current question's follow-up
    FollowUp,
    /// Every question has been answered or skipped
    Completed,
}

impl SessionStage {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for SessionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Question => write!(f, "question"),
            Self::FollowUp => write!(f, "follow-up"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for SessionStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "question" => Ok(Self::Question),
            "follow-up" => Ok(Self::FollowUp),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Invalid session stage: {s}")),
        }
    }
}

/// What the candidate sees after a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NextAction {
    FollowUp { prompt: String },
    NextQuestion { question: Question },
    Completed { evaluation: FinalEvaluation },
}

impl NextAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::FollowUp { .. } => "follow-up",
            Self::NextQuestion { .. } => "next-question",
            Self::Completed { .. } => "completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_string_round_trip() {
        for stage in [SessionStage::Question, SessionStage::FollowUp, SessionStage::Completed] {
            assert_eq!(stage.to_string().parse::<SessionStage>().unwrap(), stage);
            assert_eq!(
                serde_json::to_value(stage).unwrap(),
                serde_json::Value::String(stage.to_string())
            );
        }
        assert!("done".parse::<SessionStage>().is_err());
        assert!(SessionStage::Completed.is_terminal());
    }
}
