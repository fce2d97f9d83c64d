//! Score aggregation for completed sessions.
//!
//! Every recorded answer that carries a score counts once, skipped answers
//! included (they score zero). Results are rounded to one decimal.

use crate::config::{CategoryWeightsConfig, ScoringConfig, ScoringMethod};
use crate::models::{
    CategoryBreakdown, FinalEvaluation, QuestionCategory, Session,
};
use chrono::Utc;
use std::collections::HashMap;

/// Relative weight of each category in a category-weighted average
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryWeights {
    pub behavioral: f64,
    pub technical: f64,
    pub situational: f64,
}

impl CategoryWeights {
    pub fn weight(&self, category: QuestionCategory) -> f64 {
        match category {
            QuestionCategory::Behavioral => self.behavioral,
            QuestionCategory::Technical => self.technical,
            QuestionCategory::Situational => self.situational,
        }
    }
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self::from(&CategoryWeightsConfig::default())
    }
}

impl From<&CategoryWeightsConfig> for CategoryWeights {
    fn from(config: &CategoryWeightsConfig) -> Self {
        Self {
            behavioral: config.behavioral,
            technical: config.technical,
            situational: config.situational,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ScoringStrategy {
    #[default]
    SimpleAverage,
    CategoryWeighted(CategoryWeights),
}

impl From<&ScoringConfig> for ScoringStrategy {
    fn from(config: &ScoringConfig) -> Self {
        match config.method {
            ScoringMethod::SimpleAverage => Self::SimpleAverage,
            ScoringMethod::CategoryWeighted => Self::CategoryWeighted((&config.weights).into()),
        }
    }
}

pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

impl ScoringStrategy {
    pub fn method(&self) -> ScoringMethod {
        match self {
            Self::SimpleAverage => ScoringMethod::SimpleAverage,
            Self::CategoryWeighted(_) => ScoringMethod::CategoryWeighted,
        }
    }

    /// Overall session score; 0.0 when nothing has been scored
    pub fn aggregate(&self, session: &Session) -> f64 {
        let by_category = scores_by_category(session);
        let all: Vec<f64> = by_category.values().flatten().copied().collect();
        let simple = mean(&all).unwrap_or(0.0);

        let score = match self {
            Self::SimpleAverage => simple,
            Self::CategoryWeighted(weights) => {
                let (weighted_sum, weight_total) = QuestionCategory::ALL
                    .iter()
                    .filter_map(|category| {
                        let average = mean(by_category.get(category)?)?;
                        Some((average, weights.weight(*category).max(0.0)))
                    })
                    .fold((0.0, 0.0), |(sum, total), (average, weight)| {
                        (sum + average * weight, total + weight)
                    });

                if weight_total > 0.0 {
                    weighted_sum / weight_total
                } else {
                    simple
                }
            }
        };

        round_to_tenth(score)
    }

    /// Final evaluation with per-category breakdown
    pub fn evaluate(&self, session: &Session) -> FinalEvaluation {
        let by_category = scores_by_category(session);

        let mut categories = Vec::new();
        let mut answered_total = 0;
        let mut skipped_total = 0;

        for category in QuestionCategory::ALL {
            let (answered, skipped) = exchange_counts(session, category);
            let asked = session.questions.iter().any(|q| q.category == category);
            if !asked {
                continue;
            }
            answered_total += answered;
            skipped_total += skipped;
            categories.push(CategoryBreakdown {
                category,
                average_score: by_category
                    .get(&category)
                    .and_then(|scores| mean(scores))
                    .map(round_to_tenth),
                answered,
                skipped,
            });
        }

        FinalEvaluation {
            overall_score: self.aggregate(session),
            method: self.method(),
            categories,
            total_questions: session.questions.len(),
            answered: answered_total,
            skipped: skipped_total,
            evaluated_at: Utc::now(),
        }
    }
}

fn scores_by_category(session: &Session) -> HashMap<QuestionCategory, Vec<f64>> {
    let mut scores: HashMap<QuestionCategory, Vec<f64>> = HashMap::new();
    for answer in &session.answers {
        let Some(score) = &answer.score else { continue };
        let Some(question) = session.question(answer.question_id) else {
            continue;
        };
        scores.entry(question.category).or_default().push(score.overall);
    }
    scores
}

/// (answered, skipped) exchanges for `category`, judged by each question's scored answer
fn exchange_counts(session: &Session, category: QuestionCategory) -> (usize, usize) {
    session
        .answers
        .iter()
        .filter(|answer| answer.score.is_some())
        .filter(|answer| {
            session
                .question(answer.question_id)
                .is_some_and(|q| q.category == category)
        })
        .fold((0, 0), |(answered, skipped), answer| {
            if answer.is_skipped() {
                (answered, skipped + 1)
            } else {
                (answered + 1, skipped)
            }
        })
}
