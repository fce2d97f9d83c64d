//! # Interview Service
//!
//! Drives [`SessionStateMachine`] against the injected collaborators.
//!
//! Upstream calls (question generation, answer scoring) compose as
//! degradation → retry → circuit breaker → collaborator. The session store is
//! guarded by a circuit breaker only; a store failure surfaces directly.
//!
//! Submissions for the same session are serialised through a per-session
//! async lock, and every save is checked against the session's `version`, so a
//! second instance writing the same session gets `Conflict` instead of a lost
//! update.

use super::answer_scorer::{AnswerScorer, HeuristicScorer};
use super::credit_ledger::CreditLedger;
use super::question_generator::{QuestionBank, QuestionGenerator};
use super::usage_service::{UsageReport, UsageService};
use crate::cache::keyed_lock::{KeyedLock, LockMap};
use crate::cache::{CacheStats, InterviewCache};
use crate::config::{InterviewConfig, RetryConfig};
use crate::constants::{operations, FALLBACK_EVALUATION_SCORE};
use crate::error::{InterviewError, InterviewResult};
use crate::logging::{log_cache_operation, log_resilience_event, log_session_operation};
use crate::models::{
    validate_user_id, AnswerScore, DifficultyFilter, InterviewMode, InterviewSummary, Progress,
    Question, QuestionSet, Session,
};
use crate::resilience::{
    CircuitBreakerManager, CircuitBreakerSnapshot, DegradationError, DegradationOptions,
    ErrorClassifier, GracefulDegradationService, RetryOptions, RetryPolicy, ServiceStatusReport,
    StandardErrorClassifier,
};
use crate::state_machine::{
    NextAction, PersistenceError, PersistenceResult, ScoringRequest, SessionEvent,
    SessionStateMachine, SessionStore,
};
use dashmap::DashMap;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Collaborators the service is built from
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn SessionStore>,
    pub ledger: Arc<dyn CreditLedger>,
    pub generator: Arc<dyn QuestionGenerator>,
    pub scorer: Arc<dyn AnswerScorer>,
}

impl Collaborators {
    pub fn new(
        store: Arc<dyn SessionStore>,
        ledger: Arc<dyn CreditLedger>,
        generator: Arc<dyn QuestionGenerator>,
        scorer: Arc<dyn AnswerScorer>,
    ) -> Self {
        Self {
            store,
            ledger,
            generator,
            scorer,
        }
    }
}

/// Result of one answer submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub session: Session,
    pub next_action: NextAction,
    /// Score recorded by this submission, if any
    pub score: Option<AnswerScore>,
    pub progress: Progress,
}

/// Breaker, fallback and cache state for operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResilienceStatus {
    pub circuit_breakers: Vec<CircuitBreakerSnapshot>,
    pub degraded_services: Vec<ServiceStatusReport>,
    pub cache: CacheStats,
}

pub struct InterviewService {
    store: Arc<dyn SessionStore>,
    ledger: Arc<dyn CreditLedger>,
    generator: Arc<dyn QuestionGenerator>,
    scorer: Arc<dyn AnswerScorer>,
    machine: SessionStateMachine,
    cache: InterviewCache,
    breakers: Arc<CircuitBreakerManager>,
    question_fallbacks: GracefulDegradationService<String, QuestionSet>,
    scoring_fallbacks: GracefulDegradationService<ScoringRequest, AnswerScore>,
    classifier: Arc<dyn ErrorClassifier>,
    retry: RetryConfig,
    degradation: DegradationOptions,
    questions_per_session: usize,
    session_locks: LockMap<Uuid>,
    usage: UsageService,
}

impl std::fmt::Debug for InterviewService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterviewService")
            .field("generator", &self.generator.name())
            .field("scorer", &self.scorer.name())
            .field("questions_per_session", &self.questions_per_session)
            .field("active_session_locks", &self.session_locks.len())
            .finish()
    }
}

impl InterviewService {
    pub fn new(config: &InterviewConfig, collaborators: Collaborators) -> Self {
        Self::with_cache(config, collaborators, InterviewCache::from_config(&config.cache))
    }

    /// Build with a cache shared with other components
    pub fn with_cache(
        config: &InterviewConfig,
        collaborators: Collaborators,
        cache: InterviewCache,
    ) -> Self {
        let question_fallbacks = GracefulDegradationService::new();
        question_fallbacks.register_fallback(
            operations::QUESTION_GENERATION,
            |position: String| async move { Ok(QuestionBank::question_set(&position)) },
        );

        let scoring_fallbacks = GracefulDegradationService::new();
        scoring_fallbacks.register_fallback(
            operations::ANSWER_SCORING,
            |request: ScoringRequest| async move { Ok(HeuristicScorer.evaluate(&request)) },
        );

        info!(
            generator = collaborators.generator.name(),
            scorer = collaborators.scorer.name(),
            questions_per_session = config.session.questions_per_session,
            max_follow_ups = ?config.session.max_follow_ups,
            "🚀 Interview service initialized"
        );

        Self {
            usage: UsageService::new(
                Arc::clone(&collaborators.store),
                Arc::clone(&collaborators.ledger),
            ),
            store: collaborators.store,
            ledger: collaborators.ledger,
            generator: collaborators.generator,
            scorer: collaborators.scorer,
            machine: SessionStateMachine::from_config(config),
            cache,
            breakers: Arc::new(CircuitBreakerManager::from_config(&config.circuit_breakers)),
            question_fallbacks,
            scoring_fallbacks,
            classifier: Arc::new(StandardErrorClassifier::new()),
            retry: config.retry.clone(),
            degradation: DegradationOptions::from(&config.degradation),
            questions_per_session: config.session.questions_per_session.max(1),
            session_locks: DashMap::new(),
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn classifier(&self) -> &Arc<dyn ErrorClassifier> {
        &self.classifier
    }

    pub fn breakers(&self) -> &Arc<CircuitBreakerManager> {
        &self.breakers
    }

    pub fn cache(&self) -> &InterviewCache {
        &self.cache
    }

    /// Deduct a credit, generate questions and create a session. The mode
    /// bounds the question count and the difficulties and categories drawn
    /// from; `difficulty` narrows that further. Every mode costs one credit.
    #[instrument(skip(self))]
    pub async fn start_interview(
        &self,
        user_id: &str,
        position: &str,
        mode: InterviewMode,
        difficulty: DifficultyFilter,
    ) -> InterviewResult<Session> {
        let position = position.trim();
        validate_user_id(user_id)?;
        if position.is_empty() {
            return Err(InterviewError::validation("position", "Position must not be empty"));
        }

        let remaining = self.ledger.try_deduct(user_id, 1).await?;

        let session = match self.create_session(user_id, position, mode, difficulty).await {
            Ok(session) => session,
            Err(error) => {
                if let Err(refund_error) = self.ledger.refund(user_id, 1).await {
                    warn!(
                        user_id = user_id,
                        error = %refund_error,
                        "Failed to refund credit after aborted interview start"
                    );
                }
                log_session_operation(
                    "start_interview",
                    None,
                    Some(user_id),
                    None,
                    "failed",
                    Some(&error.to_string()),
                );
                return Err(error);
            }
        };

        self.cache.invalidate_user(user_id);
        log_session_operation(
            "start_interview",
            Some(session.id),
            Some(user_id),
            Some(&session.stage.to_string()),
            "started",
            Some(&format!(
                "position={position} mode={mode} difficulty={difficulty} questions={} credits_remaining={remaining}",
                session.questions.len()
            )),
        );
        Ok(session)
    }

    async fn create_session(
        &self,
        user_id: &str,
        position: &str,
        mode: InterviewMode,
        difficulty: DifficultyFilter,
    ) -> InterviewResult<Session> {
        let mut questions = self.generate_questions(position, difficulty).await?;
        questions.retain(|question| mode.allows(question));
        if questions.is_empty() {
            return Err(InterviewError::validation(
                "difficulty",
                format!("No {difficulty} questions are available for {position} in {mode} mode"),
            ));
        }

        questions.shuffle(&mut rand::thread_rng());
        questions.truncate(mode.question_count(self.questions_per_session));

        let session = Session::new(user_id, position, questions)?;
        self.guard_store(|| self.store.create(&session)).await?;
        Ok(session)
    }

    async fn generate_questions(
        &self,
        position: &str,
        difficulty: DifficultyFilter,
    ) -> InterviewResult<Vec<Question>> {
        let generator = &self.generator;
        self.cache
            .generated_questions(position, difficulty.as_str(), || async move {
                let set = self
                    .question_fallbacks
                    .execute_with_fallback(
                        operations::QUESTION_GENERATION,
                        position.to_string(),
                        || {
                            self.call_upstream(operations::QUESTION_GENERATION, move || {
                                generator.generate(position)
                            })
                        },
                        &self.degradation,
                    )
                    .await?;
                set.validate()?;

                Ok(set
                    .into_questions()
                    .into_iter()
                    .filter(|question| difficulty.matches(question))
                    .collect())
            })
            .await
    }

    /// Record an answer (or a skip) and advance the session
    #[instrument(skip(self, answer))]
    pub async fn submit_answer(
        &self,
        session_id: Uuid,
        user_id: &str,
        answer: &str,
        skip: bool,
    ) -> InterviewResult<SubmitOutcome> {
        validate_user_id(user_id)?;
        let event = if skip {
            SessionEvent::Skip
        } else {
            let trimmed = answer.trim();
            if trimmed.is_empty() {
                return Err(InterviewError::validation(
                    "answer",
                    "Answer must not be empty; skip the question instead",
                ));
            }
            SessionEvent::SubmitAnswer(trimmed.to_string())
        };

        let slot = KeyedLock::register(&self.session_locks, session_id);
        let _guard = slot.lock().await;
        self.submit_locked(session_id, user_id, &event).await
    }

    async fn submit_locked(
        &self,
        session_id: Uuid,
        user_id: &str,
        event: &SessionEvent,
    ) -> InterviewResult<SubmitOutcome> {
        let mut session = self.load_owned(session_id, user_id).await?;
        let from_stage = session.stage;

        let plan = self.machine.determine_transition(&session, event)?;
        let score = match plan.scoring_request() {
            Some(request) => Some(self.score_answer(request.clone()).await?),
            None => None,
        };

        let next_action = self.machine.apply(&mut session, event, &plan, score)?;
        let version = self.guard_store(|| self.store.save(&session)).await?;
        session.version = version;

        let invalidated = self.cache.invalidate_session(session_id) + self.cache.invalidate_user(user_id);
        log_cache_operation("invalidate", Some(&session_id.to_string()), "ok", Some(invalidated));

        log_session_operation(
            event.event_type(),
            Some(session_id),
            Some(user_id),
            Some(&session.stage.to_string()),
            next_action.label(),
            Some(&format!("from={from_stage} version={version}")),
        );

        let score = session.answers.last().and_then(|answer| answer.score.clone());
        Ok(SubmitOutcome {
            progress: session.progress(),
            session,
            next_action,
            score,
        })
    }

    async fn score_answer(&self, request: ScoringRequest) -> InterviewResult<AnswerScore> {
        let scorer = &self.scorer;
        let primary_request = &request.clone();
        let result = self
            .scoring_fallbacks
            .execute_with_fallback(
                operations::ANSWER_SCORING,
                request,
                || {
                    self.call_upstream(operations::ANSWER_SCORING, move || async move {
                        let score = scorer.score(primary_request).await?;
                        score.validate()?;
                        Ok(score)
                    })
                },
                &self.degradation,
            )
            .await;

        match result {
            Ok(score) => Ok(score),
            Err(DegradationError::Primary(error)) => Err(error),
            Err(exhausted) => {
                log_resilience_event(
                    operations::ANSWER_SCORING,
                    "fallback_score",
                    None,
                    Some(&exhausted.to_string()),
                );
                Ok(AnswerScore::uniform(
                    FALLBACK_EVALUATION_SCORE,
                    "Automatic scoring is temporarily unavailable.",
                ))
            }
        }
    }

    /// Session snapshot for its owner, served from cache when fresh
    pub async fn get_session(&self, session_id: Uuid, user_id: &str) -> InterviewResult<Session> {
        validate_user_id(user_id)?;
        self.cache
            .session_data(session_id, user_id, || self.load_owned(session_id, user_id))
            .await
    }

    /// Interview history, newest first
    pub async fn user_interviews(
        &self,
        user_id: &str,
        limit: usize,
    ) -> InterviewResult<Vec<InterviewSummary>> {
        validate_user_id(user_id)?;
        if limit == 0 {
            return Err(InterviewError::validation("limit", "Limit must be at least 1"));
        }
        self.cache
            .user_interviews(user_id, limit, || async {
                let sessions = self
                    .guard_store(|| self.store.list_for_user(user_id, limit))
                    .await?;
                Ok(sessions.iter().map(Session::summary).collect())
            })
            .await
    }

    pub async fn usage(&self, user_id: &str) -> InterviewResult<UsageReport> {
        self.usage.report(user_id).await
    }

    pub fn resilience_status(&self) -> ResilienceStatus {
        let mut degraded_services = self.question_fallbacks.services_status();
        degraded_services.extend(self.scoring_fallbacks.services_status());
        degraded_services.sort_by(|a, b| a.name.cmp(&b.name));

        ResilienceStatus {
            circuit_breakers: self.breakers.snapshots(),
            degraded_services,
            cache: self.cache.stats(),
        }
    }

    async fn load_owned(&self, session_id: Uuid, user_id: &str) -> InterviewResult<Session> {
        let session = self
            .guard_store(|| self.store.load(session_id))
            .await?
            .ok_or_else(|| InterviewError::session_not_found(session_id))?;

        if !session.is_owned_by(user_id) {
            warn!(
                session_id = %session_id,
                user_id = user_id,
                "Session requested by a user who does not own it"
            );
            return Err(InterviewError::session_not_found(session_id));
        }
        Ok(session)
    }

    /// Retry + circuit breaker around one upstream call
    async fn call_upstream<T, F, Fut>(&self, operation: &'static str, call: F) -> InterviewResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = InterviewResult<T>>,
    {
        let classifier = Arc::clone(&self.classifier);
        let options = RetryOptions::<InterviewError>::from_config(&self.retry)
            .with_retry_condition(move |error| classifier.is_retryable(error))
            .with_on_retry(move |attempt, error| {
                log_resilience_event(operation, "retry", Some(attempt), Some(&error.to_string()))
            });

        let breaker = self.breakers.get_circuit_breaker(operation);
        let enabled = self.breakers.is_enabled();
        let call = &call;
        let breaker = &breaker;

        RetryPolicy::execute(
            move || async move {
                if enabled {
                    breaker.call(call).await.map_err(InterviewError::from)
                } else {
                    call().await
                }
            },
            &options,
        )
        .await
    }

    /// Circuit breaker around a store call. Only storage failures count
    /// against the breaker; conflicts and missing rows pass straight through.
    async fn guard_store<T, F, Fut>(&self, call: F) -> InterviewResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PersistenceResult<T>>,
    {
        if !self.breakers.is_enabled() {
            return call().await.map_err(InterviewError::from);
        }

        let breaker = self.breakers.get_circuit_breaker(operations::SESSION_STORE);
        let outcome = breaker
            .call(|| async move {
                match call().await {
                    Ok(value) => Ok(Ok(value)),
                    Err(error @ PersistenceError::StorageFailure { .. }) => {
                        Err(InterviewError::from(error))
                    }
                    Err(error) => Ok(Err(error)),
                }
            })
            .await
            .map_err(InterviewError::from)?;

        outcome.map_err(InterviewError::from)
    }
}
