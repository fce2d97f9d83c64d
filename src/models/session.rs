use super::answer::{Answer, AnswerKind};
use super::evaluation::{FinalEvaluation, Progress};
use super::question::Question;
use super::user::InterviewSummary;
use crate::error::{InterviewError, InterviewResult};
use crate::state_machine::SessionStage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One candidate's run through an ordered list of questions.
///
/// While the stage is not `completed`, `current_question_index` points at a
/// valid question. On completion the index stays on the last question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: String,
    pub position: String,
    pub questions: Vec<Question>,
    pub current_question_index: usize,
    pub stage: SessionStage,
    pub answers: Vec<Answer>,
    pub overall_score: Option<f64>,
    pub final_evaluation: Option<FinalEvaluation>,
    pub follow_ups_asked: usize,
    /// Bumped on every successful save
    pub version: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(
        user_id: impl Into<String>,
        position: impl Into<String>,
        questions: Vec<Question>,
    ) -> InterviewResult<Self> {
        if questions.is_empty() {
            return Err(InterviewError::validation(
                "questions",
                "A session needs at least one question",
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            position: position.into(),
            questions,
            current_question_index: 0,
            stage: SessionStage::Question,
            answers: Vec::new(),
            overall_score: None,
            final_evaluation: None,
            follow_ups_asked: 0,
            version: 0,
            started_at: Utc::now(),
            completed_at: None,
        })
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    pub fn is_completed(&self) -> bool {
        self.stage == SessionStage::Completed
    }

    pub fn is_last_question(&self) -> bool {
        self.current_question_index + 1 >= self.questions.len()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            current: self.current_question_index + 1,
            total: self.questions.len(),
        }
    }

    /// Main answer recorded for `question_id`, if any
    pub fn main_answer_for(&self, question_id: Uuid) -> Option<&Answer> {
        self.answers
            .iter()
            .rev()
            .find(|a| a.question_id == question_id && a.kind == AnswerKind::Main)
    }

    pub fn question(&self, question_id: Uuid) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    pub fn summary(&self) -> InterviewSummary {
        InterviewSummary {
            session_id: self.id,
            position: self.position.clone(),
            stage: self.stage,
            overall_score: self.overall_score,
            question_count: self.questions.len(),
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }
}
