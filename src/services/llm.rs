//! Prompt-driven generator and scorer over any chat-completion backend.
//!
//! The transport is a [`CompletionClient`]; this module owns the prompts and
//! the validation of the JSON replies. A reply that does not parse or fails
//! validation is reported as an upstream error so the resilience layer can
//! retry it and eventually degrade to the built-in implementations.

use super::answer_scorer::AnswerScorer;
use super::question_generator::QuestionGenerator;
use crate::constants::operations;
use crate::error::{InterviewError, InterviewResult};
use crate::models::{AnswerScore, QuestionSet};
use crate::state_machine::ScoringRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Chat-completion backend returning the raw text of the first choice
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> InterviewResult<String>;
}

pub struct LlmQuestionGenerator {
    client: Arc<dyn CompletionClient>,
}

impl LlmQuestionGenerator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    pub fn build_request(position: &str) -> CompletionRequest {
        let prompt = format!(
            r#"Generate a comprehensive set of interview questions for a {position} role.

Return ONLY a valid JSON object with this exact structure:
{{
  "jobTitle": "{position}",
  "behavioral": [{{"question": "...", "followUp": "...", "difficulty": "medium", "category": "behavioral", "expectedDuration": 3}}],
  "technical": [{{"question": "...", "followUp": "...", "difficulty": "hard", "category": "technical", "expectedDuration": 5}}],
  "situational": [{{"question": "...", "followUp": "...", "difficulty": "medium", "category": "situational", "expectedDuration": 4}}]
}}

Requirements:
- 4 behavioral questions (leadership, teamwork, problem-solving, communication)
- 5 technical questions (tools, processes and practices of a {position})
- 3 situational questions (realistic workplace scenarios)
- Mix difficulty levels: 30% easy, 50% medium, 20% hard
- Each question has a meaningful follow-up
- Expected duration between 2 and 8 minutes"#
        );

        CompletionRequest {
            system: "You are an expert interview coach. Return only valid JSON with no additional text."
                .to_string(),
            prompt,
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

#[async_trait]
impl QuestionGenerator for LlmQuestionGenerator {
    async fn generate(&self, position: &str) -> InterviewResult<QuestionSet> {
        let raw = self.client.complete(Self::build_request(position)).await?;
        if raw.trim().is_empty() {
            return Err(InterviewError::upstream(
                operations::QUESTION_GENERATION,
                "No content received from completion backend",
            ));
        }
        debug!(position = position, bytes = raw.len(), "Received question set payload");
        QuestionSet::from_llm_response(&raw)
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

pub struct LlmAnswerScorer {
    client: Arc<dyn CompletionClient>,
}

impl LlmAnswerScorer {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    pub fn build_request(request: &ScoringRequest) -> CompletionRequest {
        let follow_up = match (&request.follow_up_prompt, &request.follow_up_answer) {
            (Some(prompt), Some(answer)) => {
                format!("\nFollow-up: \"{prompt}\"\nCandidate follow-up answer: \"{answer}\"\n")
            }
            _ => String::new(),
        };

        let prompt = format!(
            r#"You are an expert interview assessor for {position} positions.

Rate this interview answer on a scale of 0-10 for each criterion.

Question ({category}): "{question}"
Candidate answer: "{answer}"
{follow_up}
Return JSON:
{{"technicalAccuracy": 8, "communicationClarity": 7, "problemSolvingApproach": 9, "overallScore": 8, "feedback": "..."}}

Be constructive and specific in feedback."#,
            position = request.position,
            category = request.question.category,
            question = request.question.prompt,
            answer = request.main_answer,
        );

        CompletionRequest {
            system: "You are an expert interview assessor. Return only valid JSON.".to_string(),
            prompt,
            temperature: 0.3,
            max_tokens: 500,
        }
    }
}

#[async_trait]
impl AnswerScorer for LlmAnswerScorer {
    async fn score(&self, request: &ScoringRequest) -> InterviewResult<AnswerScore> {
        let raw = self.client.complete(Self::build_request(request)).await?;
        AnswerScore::from_llm_response(&raw)
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}
