pub mod answer_scorer;
pub mod credit_ledger;
pub mod interview_service;
pub mod llm;
pub mod question_generator;
pub mod usage_service;

pub use answer_scorer::{AnswerScorer, HeuristicScorer};
pub use credit_ledger::{CreditLedger, InMemoryCreditLedger};
pub use interview_service::{Collaborators, InterviewService, ResilienceStatus, SubmitOutcome};
pub use llm::{CompletionClient, CompletionRequest, LlmAnswerScorer, LlmQuestionGenerator};
pub use question_generator::{QuestionBank, QuestionGenerator};
pub use usage_service::{UpgradePrompt, UsageReport, UsageService};
