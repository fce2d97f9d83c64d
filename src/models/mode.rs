//! Interview modes: named presets that bound how many questions a session
//! holds and which difficulties and categories it draws from.
//!
//! Every mode costs one credit. `Configured` follows
//! `session.questions_per_session` and keeps every question.

use super::question::{Question, QuestionCategory, QuestionDifficulty};
use crate::error::{InterviewError, InterviewResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::question::QuestionCategory::{Behavioral, Situational, Technical};
use super::question::QuestionDifficulty::{Easy, Hard, Medium};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewMode {
    #[default]
    Configured,
    QuickAssessment,
    Standard,
    Comprehensive,
    TechnicalDeep,
    BehavioralFocus,
    MixedChallenge,
}

/// Experience level used by [`InterviewMode::recommend`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Junior,
    Mid,
    Senior,
}

/// Focus used by [`InterviewMode::recommend`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewFocus {
    Technical,
    Behavioral,
    Mixed,
}

impl InterviewMode {
    pub const ALL: [InterviewMode; 7] = [
        InterviewMode::Configured,
        InterviewMode::QuickAssessment,
        InterviewMode::Standard,
        InterviewMode::Comprehensive,
        InterviewMode::TechnicalDeep,
        InterviewMode::BehavioralFocus,
        InterviewMode::MixedChallenge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewMode::Configured => "configured",
            InterviewMode::QuickAssessment => "quick_assessment",
            InterviewMode::Standard => "standard",
            InterviewMode::Comprehensive => "comprehensive",
            InterviewMode::TechnicalDeep => "technical_deep",
            InterviewMode::BehavioralFocus => "behavioral_focus",
            InterviewMode::MixedChallenge => "mixed_challenge",
        }
    }

    /// Upper bound on questions per session; `configured` is used by `Configured`
    pub fn question_count(&self, configured: usize) -> usize {
        match self {
            InterviewMode::Configured => configured,
            InterviewMode::QuickAssessment => 3,
            InterviewMode::Standard => 5,
            InterviewMode::Comprehensive => 8,
            InterviewMode::TechnicalDeep => 10,
            InterviewMode::BehavioralFocus => 6,
            InterviewMode::MixedChallenge => 12,
        }
    }

    pub fn estimated_minutes(&self) -> Option<u32> {
        match self {
            InterviewMode::Configured => None,
            InterviewMode::QuickAssessment => Some(5),
            InterviewMode::Standard => Some(15),
            InterviewMode::Comprehensive => Some(25),
            InterviewMode::TechnicalDeep => Some(35),
            InterviewMode::BehavioralFocus => Some(20),
            InterviewMode::MixedChallenge => Some(45),
        }
    }

    pub fn difficulties(&self) -> &'static [QuestionDifficulty] {
        match self {
            InterviewMode::QuickAssessment | InterviewMode::Standard => &[Easy, Medium],
            InterviewMode::Comprehensive => &[Medium, Hard],
            InterviewMode::TechnicalDeep => &[Hard],
            InterviewMode::BehavioralFocus => &[Medium],
            InterviewMode::Configured | InterviewMode::MixedChallenge => &[Easy, Medium, Hard],
        }
    }

    pub fn categories(&self) -> &'static [QuestionCategory] {
        match self {
            InterviewMode::QuickAssessment => &[Behavioral],
            InterviewMode::TechnicalDeep => &[Technical],
            InterviewMode::BehavioralFocus => &[Behavioral, Situational],
            InterviewMode::Configured
            | InterviewMode::Standard
            | InterviewMode::Comprehensive
            | InterviewMode::MixedChallenge => &QuestionCategory::ALL,
        }
    }

    pub fn allows(&self, question: &Question) -> bool {
        self.difficulties().contains(&question.difficulty)
            && self.categories().contains(&question.category)
    }

    /// Pick a mode from the time a candidate has and what they want to practise
    pub fn recommend(
        available_minutes: u32,
        experience: ExperienceLevel,
        focus: InterviewFocus,
    ) -> InterviewMode {
        if available_minutes <= 10 {
            return InterviewMode::QuickAssessment;
        }
        let senior = experience == ExperienceLevel::Senior;
        match focus {
            InterviewFocus::Technical if senior => InterviewMode::TechnicalDeep,
            InterviewFocus::Technical => InterviewMode::Comprehensive,
            InterviewFocus::Behavioral => InterviewMode::BehavioralFocus,
            InterviewFocus::Mixed if available_minutes >= 40 && senior => InterviewMode::MixedChallenge,
            InterviewFocus::Mixed if available_minutes >= 25 => InterviewMode::Comprehensive,
            InterviewFocus::Mixed => InterviewMode::Standard,
        }
    }
}

impl fmt::Display for InterviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterviewMode {
    type Err = InterviewError;

    fn from_str(s: &str) -> InterviewResult<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        InterviewMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| {
                InterviewError::validation("mode", format!("Unknown interview mode '{}'", s.trim()))
            })
    }
}
