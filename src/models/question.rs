use crate::error::{InterviewError, InterviewResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Question category, also the unit of the per-category score breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionCategory {
    Behavioral,
    Technical,
    Situational,
}

impl QuestionCategory {
    pub const ALL: [QuestionCategory; 3] = [
        QuestionCategory::Behavioral,
        QuestionCategory::Technical,
        QuestionCategory::Situational,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionCategory::Behavioral => "behavioral",
            QuestionCategory::Technical => "technical",
            QuestionCategory::Situational => "situational",
        }
    }
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionDifficulty {
    Easy,
    Medium,
    Hard,
}

impl QuestionDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionDifficulty::Easy => "easy",
            QuestionDifficulty::Medium => "medium",
            QuestionDifficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for QuestionDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionDifficulty {
    type Err = InterviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(QuestionDifficulty::Easy),
            "medium" => Ok(QuestionDifficulty::Medium),
            "hard" => Ok(QuestionDifficulty::Hard),
            other => Err(InterviewError::validation(
                "difficulty",
                format!("Unknown difficulty '{other}', expected easy, medium, hard or mixed"),
            )),
        }
    }
}

/// Difficulty selection for a new session; `Mixed` keeps every question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyFilter {
    #[default]
    Mixed,
    Easy,
    Medium,
    Hard,
}

impl DifficultyFilter {
    pub fn difficulty(&self) -> Option<QuestionDifficulty> {
        match self {
            DifficultyFilter::Mixed => None,
            DifficultyFilter::Easy => Some(QuestionDifficulty::Easy),
            DifficultyFilter::Medium => Some(QuestionDifficulty::Medium),
            DifficultyFilter::Hard => Some(QuestionDifficulty::Hard),
        }
    }

    pub fn matches(&self, question: &Question) -> bool {
        self.difficulty()
            .map_or(true, |difficulty| question.difficulty == difficulty)
    }

    pub fn as_str(&self) -> &'static str {
        match self.difficulty() {
            Some(difficulty) => difficulty.as_str(),
            None => crate::constants::MIXED_DIFFICULTY,
        }
    }
}

impl fmt::Display for DifficultyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyFilter {
    type Err = InterviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(crate::constants::MIXED_DIFFICULTY) {
            return Ok(DifficultyFilter::Mixed);
        }
        Ok(match s.parse::<QuestionDifficulty>()? {
            QuestionDifficulty::Easy => DifficultyFilter::Easy,
            QuestionDifficulty::Medium => DifficultyFilter::Medium,
            QuestionDifficulty::Hard => DifficultyFilter::Hard,
        })
    }
}

/// A single interview question. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub prompt: String,
    /// Empty when the question has no follow-up
    pub follow_up: String,
    pub category: QuestionCategory,
    pub difficulty: QuestionDifficulty,
    pub expected_duration_minutes: u32,
}

impl Question {
    pub fn new(
        prompt: impl Into<String>,
        follow_up: impl Into<String>,
        category: QuestionCategory,
        difficulty: QuestionDifficulty,
        expected_duration_minutes: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: prompt.into(),
            follow_up: follow_up.into(),
            category,
            difficulty,
            expected_duration_minutes,
        }
    }

    pub fn has_follow_up(&self) -> bool {
        !self.follow_up.trim().is_empty()
    }
}

/// Question as produced by a generator, before ids are assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub question: String,
    #[serde(default)]
    pub follow_up: String,
    pub difficulty: QuestionDifficulty,
    pub category: QuestionCategory,
    pub expected_duration: u32,
}

impl From<GeneratedQuestion> for Question {
    fn from(generated: GeneratedQuestion) -> Self {
        Question::new(
            generated.question,
            generated.follow_up,
            generated.category,
            generated.difficulty,
            generated.expected_duration,
        )
    }
}

/// Questions for one position, grouped by category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSet {
    pub job_title: String,
    pub behavioral: Vec<GeneratedQuestion>,
    pub technical: Vec<GeneratedQuestion>,
    pub situational: Vec<GeneratedQuestion>,
}

impl QuestionSet {
    /// Parse a generator's JSON reply, tolerating a surrounding markdown fence
    pub fn from_llm_response(raw: &str) -> InterviewResult<Self> {
        let cleaned = strip_code_fence(raw);
        let set: QuestionSet = serde_json::from_str(cleaned).map_err(|e| {
            InterviewError::upstream(
                crate::constants::operations::QUESTION_GENERATION,
                format!("Invalid question set payload: {e}"),
            )
        })?;
        set.validate()?;
        Ok(set)
    }

    /// Every category must be present and every prompt non-empty
    pub fn validate(&self) -> InterviewResult<()> {
        for category in QuestionCategory::ALL {
            let questions = self.category(category);
            if questions.is_empty() {
                return Err(InterviewError::upstream(
                    crate::constants::operations::QUESTION_GENERATION,
                    format!("Question set has no {category} questions"),
                ));
            }
            if questions.iter().any(|q| q.question.trim().is_empty()) {
                return Err(InterviewError::upstream(
                    crate::constants::operations::QUESTION_GENERATION,
                    format!("Question set has an empty {category} prompt"),
                ));
            }
        }
        Ok(())
    }

    pub fn category(&self, category: QuestionCategory) -> &[GeneratedQuestion] {
        match category {
            QuestionCategory::Behavioral => &self.behavioral,
            QuestionCategory::Technical => &self.technical,
            QuestionCategory::Situational => &self.situational,
        }
    }

    pub fn len(&self) -> usize {
        self.behavioral.len() + self.technical.len() + self.situational.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into questions, behavioral first, then technical, then situational
    pub fn into_questions(self) -> Vec<Question> {
        self.behavioral
            .into_iter()
            .chain(self.technical)
            .chain(self.situational)
            .map(Question::from)
            .collect()
    }
}

pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .trim_end()
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"```json
{
  "jobTitle": "Data Engineer",
  "behavioral": [{"question": "Tell me about a time...", "followUp": "What changed?", "difficulty": "medium", "category": "behavioral", "expectedDuration": 3}],
  "technical": [{"question": "Explain partitioning", "followUp": "", "difficulty": "hard", "category": "technical", "expectedDuration": 5}],
  "situational": [{"question": "How would you handle...", "difficulty": "easy", "category": "situational", "expectedDuration": 4}]
}
```"#;

    #[test]
    fn test_parse_fenced_payload() {
        let set = QuestionSet::from_llm_response(PAYLOAD).unwrap();
        assert_eq!(set.job_title, "Data Engineer");
        assert_eq!(set.len(), 3);

        let questions = set.into_questions();
        assert_eq!(questions[0].category, QuestionCategory::Behavioral);
        assert!(questions[0].has_follow_up());
        assert!(!questions[1].has_follow_up());
        assert!(!questions[2].has_follow_up());
    }

    #[test]
    fn test_missing_category_is_upstream_failure() {
        let raw = r#"{"jobTitle": "x", "behavioral": [], "technical": [], "situational": []}"#;
        let err = QuestionSet::from_llm_response(raw).unwrap_err();
        assert!(err.is_upstream());
    }

    #[test]
    fn test_garbage_is_upstream_failure() {
        assert!(QuestionSet::from_llm_response("I cannot help with that")
            .unwrap_err()
            .is_upstream());
    }

    #[test]
    fn test_difficulty_filter_parsing() {
        assert_eq!("mixed".parse::<DifficultyFilter>().unwrap(), DifficultyFilter::Mixed);
        assert_eq!(" Hard ".parse::<DifficultyFilter>().unwrap(), DifficultyFilter::Hard);
        assert!("extreme".parse::<DifficultyFilter>().is_err());

        let easy = Question::new("q", "", QuestionCategory::Technical, QuestionDifficulty::Easy, 2);
        assert!(DifficultyFilter::Mixed.matches(&easy));
        assert!(DifficultyFilter::Easy.matches(&easy));
        assert!(!DifficultyFilter::Hard.matches(&easy));
    }
}
