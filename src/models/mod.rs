//! # Domain Models
//!
//! Plain serde types for sessions, questions, answers and evaluations. Storage
//! lives behind [`SessionStore`](crate::state_machine::SessionStore), so these
//! carry no persistence code.

pub mod answer;
pub mod evaluation;
pub mod mode;
pub mod question;
pub mod session;
pub mod user;

pub use answer::{Answer, AnswerKind, AnswerScore};
pub use evaluation::{CategoryBreakdown, FinalEvaluation, Progress};
pub use mode::{ExperienceLevel, InterviewFocus, InterviewMode};
pub use question::{
    DifficultyFilter, GeneratedQuestion, Question, QuestionCategory, QuestionDifficulty,
    QuestionSet,
};
pub use session::Session;
pub use user::{validate_user_id, InterviewSummary, UserAccount};
