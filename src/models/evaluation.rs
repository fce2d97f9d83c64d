use super::question::QuestionCategory;
use crate::config::ScoringMethod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Score roll-up for one question category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: QuestionCategory,
    /// Mean overall score of the scored answers; `None` when there are none
    pub average_score: Option<f64>,
    pub answered: usize,
    pub skipped: usize,
}

/// Evaluation attached to a session when it completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalEvaluation {
    pub overall_score: f64,
    pub method: ScoringMethod,
    pub categories: Vec<CategoryBreakdown>,
    pub total_questions: usize,
    pub answered: usize,
    pub skipped: usize,
    pub evaluated_at: DateTime<Utc>,
}

impl FinalEvaluation {
    pub fn category(&self, category: QuestionCategory) -> Option<&CategoryBreakdown> {
        self.categories.iter().find(|c| c.category == category)
    }
}

/// 1-based position of the current question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}
