use interview_core::cache::wildcard_matches;
use interview_core::config::RetryConfig;
use interview_core::models::{
    AnswerScore, Question, QuestionCategory, QuestionDifficulty, Session,
};
use interview_core::resilience::RetryOptions;
use interview_core::services::HeuristicScorer;
use interview_core::state_machine::{
    CategoryWeights, ScoringRequest, ScoringStrategy, SessionEvent, SessionStage,
    SessionStateMachine,
};
use proptest::prelude::*;
use std::time::Duration;

/// Cache-key-like strings without wildcards
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_:\\-]{0,24}"
}

fn category_strategy() -> impl Strategy<Value = QuestionCategory> {
    prop_oneof![
        Just(QuestionCategory::Behavioral),
        Just(QuestionCategory::Technical),
        Just(QuestionCategory::Situational),
    ]
}

/// One exchange: the question's category and either a score or a skip
fn exchange_strategy() -> impl Strategy<Value = (QuestionCategory, Option<f64>)> {
    (
        category_strategy(),
        prop::option::weighted(0.8, (0u32..=100).prop_map(|tenths| f64::from(tenths) / 10.0)),
    )
}

/// Run a complete session where every answer gets the scripted score
fn run_session(
    exchanges: &[(QuestionCategory, Option<f64>)],
    strategy: ScoringStrategy,
) -> Session {
    let questions = exchanges
        .iter()
        .map(|(category, _)| {
            Question::new("Prompt", "", *category, QuestionDifficulty::Medium, 3)
        })
        .collect();
    let mut session = Session::new("prop_user", "Tester", questions).unwrap();
    let machine = SessionStateMachine::new(None, strategy);

    for (_, score) in exchanges {
        let event = match score {
            Some(_) => SessionEvent::SubmitAnswer("answer".to_string()),
            None => SessionEvent::Skip,
        };
        let value = score.unwrap_or(0.0);
        machine
            .process(&mut session, &event, |_| AnswerScore::uniform(value, "scripted"))
            .unwrap();
    }
    session
}

proptest! {
    /// Property: a key without wildcards matches itself and nothing longer
    #[test]
    fn literal_keys_match_only_themselves(key in key_strategy(), extra in "[a-z]{1,4}") {
        prop_assert!(wildcard_matches(&key, &key));
        let longer = format!("{key}{extra}");
        prop_assert!(!wildcard_matches(&key, &longer));
    }

    /// Property: a lone star matches every key
    #[test]
    fn star_matches_everything(key in key_strategy()) {
        prop_assert!(wildcard_matches("*", &key));
        prop_assert!(wildcard_matches("**", &key));
    }

    /// Property: replacing any substring of a key with `*` still matches it
    #[test]
    fn starred_substring_still_matches(key in "[a-z0-9:]{1,24}", a in 0usize..24, b in 0usize..24) {
        let (start, end) = (a.min(b).min(key.len()), a.max(b).min(key.len()));
        let pattern = format!("{}*{}", &key[..start], &key[end..]);
        prop_assert!(wildcard_matches(&pattern, &key));
    }

    /// Property: prefix and suffix patterns agree with `starts_with`/`ends_with`
    #[test]
    fn prefix_and_suffix_patterns(key in key_strategy(), probe in "[a-z:]{0,6}") {
        prop_assert_eq!(wildcard_matches(&format!("{probe}*"), &key), key.starts_with(&probe));
        prop_assert_eq!(wildcard_matches(&format!("*{probe}"), &key), key.ends_with(&probe));
    }

    /// Property: retry delays never exceed the cap and never shrink
    #[test]
    fn retry_delay_is_capped_and_monotonic(
        base_ms in 1u64..2_000,
        cap_ms in 2_000u64..60_000,
        multiplier in 1.0f64..4.0,
        attempts in 1u32..40,
    ) {
        let options = RetryOptions::<()>::from_config(&RetryConfig {
            max_attempts: attempts,
            base_delay_ms: base_ms,
            max_delay_ms: cap_ms,
            backoff_multiplier: multiplier,
            jitter_enabled: false,
            jitter_max_percentage: 0.0,
        });

        let mut previous = Duration::ZERO;
        for attempt in 1..=attempts {
            let delay = options.delay_for_attempt(attempt);
            prop_assert!(delay <= Duration::from_millis(cap_ms));
            prop_assert!(delay >= previous);
            previous = delay;
        }
    }

    /// Property: a jittered delay lies between the exponential delay
    /// (capped) and that delay stretched by the jitter fraction
    #[test]
    fn jittered_delay_is_bounded(
        base_ms in 1u64..2_000,
        cap_ms in 2_000u64..60_000,
        multiplier in 1.0f64..4.0,
        jitter in 0.0f64..=1.0,
        attempt in 1u32..20,
    ) {
        let options = RetryOptions::<()>::from_config(&RetryConfig {
            max_attempts: attempt,
            base_delay_ms: base_ms,
            max_delay_ms: cap_ms,
            backoff_multiplier: multiplier,
            jitter_enabled: true,
            jitter_max_percentage: jitter,
        });

        let exponential = base_ms as f64 / 1000.0 * multiplier.powi(attempt as i32 - 1);
        let floor = exponential.min(cap_ms as f64 / 1000.0);
        let ceiling = floor * (1.0 + jitter);

        let delay = options.jittered_delay(attempt).as_secs_f64();
        prop_assert!(delay >= floor - 1e-6, "{delay} below {floor}");
        prop_assert!(delay <= ceiling + 1e-6, "{delay} above {ceiling}");
        prop_assert!(delay <= cap_ms as f64 / 1000.0 * (1.0 + jitter) + 1e-6);
    }

    /// Property: the simple average lies between the lowest and highest
    /// per-answer score (skips count as zero) and matches the mean to one decimal
    #[test]
    fn simple_average_is_bounded(exchanges in prop::collection::vec(exchange_strategy(), 1..12)) {
        let session = run_session(&exchanges, ScoringStrategy::SimpleAverage);
        prop_assert_eq!(session.stage, SessionStage::Completed);

        let scores: Vec<f64> = exchanges.iter().map(|(_, s)| s.unwrap_or(0.0)).collect();
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;

        let overall = session.overall_score.unwrap();
        prop_assert!(overall >= min - 0.05 && overall <= max + 0.05);
        prop_assert!((overall - mean).abs() <= 0.05 + 1e-9);
        prop_assert!((0.0..=10.0).contains(&overall));

        let evaluation = session.final_evaluation.unwrap();
        prop_assert_eq!(evaluation.answered + evaluation.skipped, exchanges.len());
        prop_assert_eq!(
            evaluation.skipped,
            exchanges.iter().filter(|(_, s)| s.is_none()).count()
        );
    }

    /// Property: any non-negative category weighting stays within the score range
    #[test]
    fn category_weighted_is_bounded(
        exchanges in prop::collection::vec(exchange_strategy(), 1..12),
        behavioral in 0.0f64..5.0,
        technical in 0.0f64..5.0,
        situational in 0.0f64..5.0,
    ) {
        let weights = CategoryWeights { behavioral, technical, situational };
        let session = run_session(&exchanges, ScoringStrategy::CategoryWeighted(weights));

        let scores: Vec<f64> = exchanges.iter().map(|(_, s)| s.unwrap_or(0.0)).collect();
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let overall = session.overall_score.unwrap();
        prop_assert!(overall >= min - 0.05 && overall <= max + 0.05);
    }

    /// Property: heuristic scores stay on the 0-10 scale for any text
    #[test]
    fn heuristic_scores_are_in_range(answer in ".{0,400}", follow_up in prop::option::of(".{0,200}")) {
        let request = ScoringRequest {
            position: "Engineer".to_string(),
            question: Question::new(
                "Tell me about a project",
                "What would you change?",
                QuestionCategory::Behavioral,
                QuestionDifficulty::Easy,
                3,
            ),
            main_answer: answer,
            follow_up_prompt: follow_up.as_ref().map(|_| "What would you change?".to_string()),
            follow_up_answer: follow_up,
        };
        let score = HeuristicScorer::new().evaluate(&request);
        prop_assert!(score.validate().is_ok(), "out of range: {:?}", score);
    }
}
