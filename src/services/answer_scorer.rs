use crate::constants::MAX_SCORE;
use crate::error::InterviewResult;
use crate::models::AnswerScore;
use crate::state_machine::{round_to_tenth, ScoringRequest};
use async_trait::async_trait;

#[async_trait]
pub trait AnswerScorer: Send + Sync {
    /// Score one question's exchange on a 0-10 scale
    async fn score(&self, request: &ScoringRequest) -> InterviewResult<AnswerScore>;

    fn name(&self) -> &'static str;
}

const STRUCTURE_MARKERS: [&str; 8] = [
    "first", "then", "finally", "because", "result", "so that", "therefore", "as a result",
];

const EXAMPLE_MARKERS: [&str; 6] = [
    "for example", "for instance", "when i", "i led", "i built", "we shipped",
];

/// Offline scorer based on answer length and structure.
///
/// Deterministic and infallible; used when the primary scorer is degraded.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer;

impl HeuristicScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, request: &ScoringRequest) -> AnswerScore {
        let text = request.combined_answer();
        let lowered = text.to_lowercase();
        let words = text.split_whitespace().count();
        let sentences = text
            .split(['.', '!', '?'])
            .filter(|sentence| !sentence.trim().is_empty())
            .count();

        let length_score = match words {
            0..=4 => 2.0,
            5..=19 => 4.0,
            20..=59 => 6.0,
            60..=199 => 7.0,
            _ => 6.5,
        };

        let structure_hits = STRUCTURE_MARKERS
            .iter()
            .filter(|marker| lowered.contains(*marker))
            .count();
        let example_hits = EXAMPLE_MARKERS
            .iter()
            .filter(|marker| lowered.contains(*marker))
            .count();
        let has_numbers = text.chars().any(|c| c.is_ascii_digit());

        let problem_solving = clamp(length_score + 0.5 * structure_hits.min(4) as f64);
        let technical_accuracy = clamp(
            length_score + if has_numbers { 1.0 } else { 0.0 } + 0.5 * example_hits.min(2) as f64,
        );
        let communication_clarity = clamp(
            length_score
                + match sentences {
                    0 | 1 => 0.0,
                    2..=8 => 1.5,
                    _ => 1.0,
                },
        );
        let follow_up_bonus = if request
            .follow_up_answer
            .as_deref()
            .is_some_and(|answer| !answer.trim().is_empty())
        {
            0.5
        } else {
            0.0
        };
        let overall = clamp(
            (technical_accuracy + communication_clarity + problem_solving) / 3.0 + follow_up_bonus,
        );

        let feedback = if words < 20 {
            "Your answer is quite brief. Expand with a concrete example and the outcome."
        } else if example_hits == 0 {
            "Good detail. Anchor your answer in a specific example from your experience."
        } else if structure_hits == 0 {
            "Solid example. Structure it as situation, action and result to make it easier to follow."
        } else {
            "Well-structured answer with a concrete example."
        };

        AnswerScore {
            technical_accuracy: round_to_tenth(technical_accuracy),
            communication_clarity: round_to_tenth(communication_clarity),
            problem_solving: round_to_tenth(problem_solving),
            overall: round_to_tenth(overall),
            feedback: feedback.to_string(),
        }
    }
}

fn clamp(score: f64) -> f64 {
    score.clamp(0.0, MAX_SCORE)
}

#[async_trait]
impl AnswerScorer for HeuristicScorer {
    async fn score(&self, request: &ScoringRequest) -> InterviewResult<AnswerScore> {
        Ok(self.evaluate(request))
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}
