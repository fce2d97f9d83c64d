//! Upstream and storage failures through the interview service: retries,
//! circuit breakers and fallbacks.

mod common;

use async_trait::async_trait;
use common::*;
use interview_core::error::{InterviewError, InterviewResult};
use interview_core::models::{DifficultyFilter, InterviewMode, QuestionSet};
use interview_core::resilience::{CircuitState, ErrorCategory};
use interview_core::services::{CreditLedger, HeuristicScorer, QuestionBank, QuestionGenerator};
use interview_core::state_machine::{InMemorySessionStore, NextAction};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Fails the first `failures` calls, then serves the question bank
struct RecoveringGenerator {
    failures: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl QuestionGenerator for RecoveringGenerator {
    async fn generate(&self, position: &str) -> InterviewResult<QuestionSet> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(InterviewError::upstream("question_generation", "503 from model"));
        }
        Ok(QuestionBank::question_set(position))
    }

    fn name(&self) -> &'static str {
        "recovering"
    }
}

#[tokio::test]
async fn test_failing_generator_below_threshold_refunds_credit() {
    let generator = Arc::new(FailingGenerator::default());
    let h = harness_with(
        &fast_config(),
        Arc::new(InMemorySessionStore::new()),
        generator.clone(),
        Arc::new(HeuristicScorer::new()),
        2,
    );

    let err = h
        .service
        .start_interview(USER, "Electrician", InterviewMode::Configured, DifficultyFilter::Mixed)
        .await
        .unwrap_err();

    assert!(err.is_upstream());
    assert_eq!(generator.calls(), 3, "retried up to max_attempts");
    assert_eq!(h.service.usage(USER).await.unwrap().credits, 2);

    let classification = h.service.classifier().classify_error(&err);
    assert_eq!(classification.error_category, ErrorCategory::Upstream);
    assert!(classification.is_retryable);
}

#[tokio::test]
async fn test_generator_outage_degrades_to_question_bank() {
    let mut config = fast_config();
    config.degradation.fallback_after_failures = 1;
    let generator = Arc::new(FailingGenerator::default());
    let h = harness_with(
        &config,
        Arc::new(InMemorySessionStore::new()),
        generator.clone(),
        Arc::new(HeuristicScorer::new()),
        2,
    );

    let session = h
        .service
        .start_interview(USER, "Plumber", InterviewMode::Configured, DifficultyFilter::Mixed)
        .await
        .unwrap();
    assert_eq!(session.questions.len(), 8);
    assert!(session.questions.iter().any(|q| q.prompt.contains("Plumber")));
    assert_eq!(generator.calls(), 3);

    // Unavailable and inside the health-check interval: primary is skipped
    h.service
        .start_interview(USER, "Carpenter", InterviewMode::Configured, DifficultyFilter::Mixed)
        .await
        .unwrap();
    assert_eq!(generator.calls(), 3);
    assert_eq!(h.service.usage(USER).await.unwrap().credits, 0);

    let status = h.service.resilience_status();
    let generation = status
        .degraded_services
        .iter()
        .find(|s| s.name == "question_generation")
        .unwrap();
    assert!(!generation.available);
    assert!(generation.has_fallback);
}

#[tokio::test]
async fn test_recovery_probe_restores_primary() {
    let mut config = fast_config();
    config.retry.max_attempts = 1;
    config.degradation.fallback_after_failures = 1;
    config.degradation.health_check_interval_seconds = 1;
    let generator = Arc::new(RecoveringGenerator {
        failures: 1,
        calls: AtomicUsize::new(0),
    });
    let h = harness_with(
        &config,
        Arc::new(InMemorySessionStore::new()),
        generator.clone(),
        Arc::new(HeuristicScorer::new()),
        3,
    );

    h.service
        .start_interview(USER, "Baker", InterviewMode::Configured, DifficultyFilter::Mixed)
        .await
        .unwrap();
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    h.service
        .start_interview(USER, "Butcher", InterviewMode::Configured, DifficultyFilter::Mixed)
        .await
        .unwrap();
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);

    let status = h.service.resilience_status();
    let generation = status
        .degraded_services
        .iter()
        .find(|s| s.name == "question_generation")
        .unwrap();
    assert!(generation.available);
    assert_eq!(generation.failure_count, 0);
}

#[tokio::test]
async fn test_breaker_opens_and_fails_fast() {
    let mut config = fast_config();
    config.retry.max_attempts = 1;
    config.circuit_breakers.default_config.failure_threshold = 2;
    config.degradation.fallback_after_failures = 100;
    let generator = Arc::new(FailingGenerator::default());
    let h = harness_with(
        &config,
        Arc::new(InMemorySessionStore::new()),
        generator.clone(),
        Arc::new(HeuristicScorer::new()),
        5,
    );

    for _ in 0..2 {
        let err = h
            .service
            .start_interview(USER, "Welder", InterviewMode::Configured, DifficultyFilter::Mixed)
            .await
            .unwrap_err();
        assert!(err.is_upstream());
    }
    assert_eq!(generator.calls(), 2);

    let err = h
        .service
        .start_interview(USER, "Welder", InterviewMode::Configured, DifficultyFilter::Mixed)
        .await
        .unwrap_err();
    assert!(matches!(err, InterviewError::CircuitOpen { .. }));
    assert_eq!(generator.calls(), 2, "open breaker must not invoke the generator");
    assert_eq!(h.service.usage(USER).await.unwrap().credits, 5);

    let breaker = h
        .service
        .resilience_status()
        .circuit_breakers
        .into_iter()
        .find(|b| b.name == "question_generation")
        .unwrap();
    assert_eq!(breaker.state, CircuitState::Open);
    assert!(breaker.next_attempt_in.is_some());
}

#[tokio::test]
async fn test_scoring_outage_falls_back_to_heuristic_scorer() {
    let mut config = fast_config();
    config.degradation.fallback_after_failures = 1;
    let scorer = Arc::new(FailingScorer::default());
    let h = harness_with(
        &config,
        Arc::new(InMemorySessionStore::new()),
        Arc::new(QuestionBank::new()),
        scorer.clone(),
        1,
    );
    let session = h
        .service
        .start_interview(USER, "Pharmacist", InterviewMode::Configured, DifficultyFilter::Mixed)
        .await
        .unwrap();

    let follow_up = h
        .service
        .submit_answer(session.id, USER, &strong_answer(), false)
        .await
        .unwrap();
    assert!(matches!(follow_up.next_action, NextAction::FollowUp { .. }));
    assert_eq!(scorer.calls(), 0);

    let outcome = h
        .service
        .submit_answer(session.id, USER, &strong_answer(), false)
        .await
        .unwrap();
    let score = outcome.score.unwrap();
    assert!(score.overall > 0.0 && score.overall <= 10.0);
    assert_eq!(scorer.calls(), 3);

    // Second exchange goes straight to the fallback
    h.service
        .submit_answer(session.id, USER, "Short answer.", false)
        .await
        .unwrap();
    h.service
        .submit_answer(session.id, USER, "Another short answer.", false)
        .await
        .unwrap();
    assert_eq!(scorer.calls(), 3);
}

#[tokio::test]
async fn test_store_outage_refunds_and_opens_store_breaker() {
    let store = Arc::new(UnavailableStore::default());
    let h = harness_with(
        &fast_config(),
        store.clone(),
        Arc::new(QuestionBank::new()),
        Arc::new(HeuristicScorer::new()),
        1,
    );

    for attempt in 0..5 {
        let err = h
            .service
            .start_interview(
                USER,
                &format!("Role {attempt}"),
                InterviewMode::Configured,
                DifficultyFilter::Mixed,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, InterviewError::Persistence(_)));
        let classification = h.service.classifier().classify_error(&err);
        assert_eq!(classification.error_category, ErrorCategory::Persistence);
        assert!(!classification.is_retryable);
    }
    assert_eq!(store.calls(), 5);

    let err = h
        .service
        .start_interview(USER, "Role 6", InterviewMode::Configured, DifficultyFilter::Mixed)
        .await
        .unwrap_err();
    assert!(matches!(err, InterviewError::CircuitOpen { .. }));
    assert_eq!(store.calls(), 5);
    assert_eq!(h.ledger.account(USER).await.unwrap().credits, 1);
}
