//! Question generation collaborators.
//!
//! [`QuestionBank`] is the built-in generator: 4 behavioral, 5 technical and
//! 3 situational templates with the job title substituted. It never fails and
//! serves as the fallback when the primary generator is degraded.

use crate::error::{InterviewError, InterviewResult};
use crate::models::{GeneratedQuestion, QuestionCategory, QuestionDifficulty, QuestionSet};
use async_trait::async_trait;

#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Produce a validated question set for `position`
    async fn generate(&self, position: &str) -> InterviewResult<QuestionSet>;

    fn name(&self) -> &'static str;
}

struct Template {
    question: &'static str,
    follow_up: &'static str,
    difficulty: QuestionDifficulty,
    minutes: u32,
}

const BEHAVIORAL: [Template; 4] = [
    Template {
        question: "Tell me about a time when you overcame a significant challenge in your role as a {role}.",
        follow_up: "What would you do differently if you faced a similar situation again?",
        difficulty: QuestionDifficulty::Medium,
        minutes: 4,
    },
    Template {
        question: "Describe a situation where you had to work with a difficult team member on a {role} project.",
        follow_up: "How did you ensure the project's success despite the interpersonal challenges?",
        difficulty: QuestionDifficulty::Medium,
        minutes: 3,
    },
    Template {
        question: "Give me an example of when you had to learn something new quickly for your {role} position.",
        follow_up: "What resources did you use to accelerate your learning process?",
        difficulty: QuestionDifficulty::Easy,
        minutes: 3,
    },
    Template {
        question: "Tell me about a time when you took initiative beyond your regular {role} responsibilities.",
        follow_up: "What was the impact of your initiative on the team or project?",
        difficulty: QuestionDifficulty::Hard,
        minutes: 4,
    },
];

const TECHNICAL: [Template; 5] = [
    Template {
        question: "What are the key technical skills required for a {role} and how do you stay current with them?",
        follow_up: "Can you give me an example of how you've recently applied one of these skills?",
        difficulty: QuestionDifficulty::Medium,
        minutes: 5,
    },
    Template {
        question: "Walk me through your approach to problem-solving as a {role}.",
        follow_up: "What tools or methodologies do you typically use in this process?",
        difficulty: QuestionDifficulty::Medium,
        minutes: 6,
    },
    Template {
        question: "Describe a complex project you worked on as a {role}. What made it challenging?",
        follow_up: "How did you break down the complexity to make it manageable?",
        difficulty: QuestionDifficulty::Hard,
        minutes: 7,
    },
    Template {
        question: "What development or work practices do you follow as a {role}?",
        follow_up: "How do these practices improve your productivity and the quality of your work?",
        difficulty: QuestionDifficulty::Easy,
        minutes: 4,
    },
    Template {
        question: "How do you ensure quality in your work as a {role}?",
        follow_up: "What metrics or indicators do you use to measure quality?",
        difficulty: QuestionDifficulty::Hard,
        minutes: 5,
    },
];

const SITUATIONAL: [Template; 3] = [
    Template {
        question: "If you were assigned a {role} project with an unrealistic deadline, how would you handle it?",
        follow_up: "How would you communicate the timeline concerns to stakeholders?",
        difficulty: QuestionDifficulty::Medium,
        minutes: 4,
    },
    Template {
        question: "How would you handle a stakeholder who keeps changing requirements for your {role} work?",
        follow_up: "What processes would you put in place to manage scope creep?",
        difficulty: QuestionDifficulty::Hard,
        minutes: 5,
    },
    Template {
        question: "If you discovered a critical issue in production as a {role}, what would be your immediate steps?",
        follow_up: "How would you prevent similar issues from occurring in the future?",
        difficulty: QuestionDifficulty::Medium,
        minutes: 4,
    },
];

/// Built-in question templates
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionBank;

impl QuestionBank {
    pub fn new() -> Self {
        Self
    }

    /// Fill every template with `position`
    pub fn question_set(position: &str) -> QuestionSet {
        let role = position.trim();
        let render = |templates: &[Template], category: QuestionCategory| -> Vec<GeneratedQuestion> {
            templates
                .iter()
                .map(|template| GeneratedQuestion {
                    question: template.question.replace("{role}", role),
                    follow_up: template.follow_up.to_string(),
                    difficulty: template.difficulty,
                    category,
                    expected_duration: template.minutes,
                })
                .collect()
        };

        QuestionSet {
            job_title: role.to_string(),
            behavioral: render(&BEHAVIORAL, QuestionCategory::Behavioral),
            technical: render(&TECHNICAL, QuestionCategory::Technical),
            situational: render(&SITUATIONAL, QuestionCategory::Situational),
        }
    }
}

#[async_trait]
impl QuestionGenerator for QuestionBank {
    async fn generate(&self, position: &str) -> InterviewResult<QuestionSet> {
        if position.trim().is_empty() {
            return Err(InterviewError::validation("position", "Position must not be empty"));
        }
        Ok(Self::question_set(position))
    }

    fn name(&self) -> &'static str {
        "question_bank"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bank_fills_every_category() {
        let set = QuestionBank.generate("Site Reliability Engineer").await.unwrap();
        assert_eq!(set.behavioral.len(), 4);
        assert_eq!(set.technical.len(), 5);
        assert_eq!(set.situational.len(), 3);
        assert!(set.validate().is_ok());
        assert!(set.behavioral[0]
            .question
            .contains("as a Site Reliability Engineer."));
        assert!(set
            .into_questions()
            .iter()
            .all(|q| q.has_follow_up() && !q.prompt.contains("{role}")));
    }

    #[tokio::test]
    async fn test_bank_rejects_blank_position() {
        assert!(QuestionBank.generate("   ").await.is_err());
    }

    #[test]
    fn test_bank_difficulty_mix() {
        let questions = QuestionBank::question_set("Analyst").into_questions();
        let hard = questions
            .iter()
            .filter(|q| q.difficulty == QuestionDifficulty::Hard)
            .count();
        let easy = questions
            .iter()
            .filter(|q| q.difficulty == QuestionDifficulty::Easy)
            .count();
        assert_eq!(hard, 4);
        assert_eq!(easy, 2);
    }
}
