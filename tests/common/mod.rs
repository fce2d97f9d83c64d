//! Shared fixtures for integration tests: fast configuration, scripted
//! collaborators and a service builder.

#![allow(dead_code)]

use async_trait::async_trait;
use dashmap::DashMap;
use interview_core::config::InterviewConfig;
use interview_core::error::{InterviewError, InterviewResult};
use interview_core::models::{AnswerScore, QuestionSet, Session};
use interview_core::services::{
    AnswerScorer, Collaborators, HeuristicScorer, InMemoryCreditLedger, InterviewService,
    QuestionBank, QuestionGenerator,
};
use interview_core::state_machine::{
    InMemorySessionStore, PersistenceError, PersistenceResult, ScoringRequest, SessionStore,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

pub const USER: &str = "candidate_1";

/// Defaults with millisecond retries so failure paths finish quickly
pub fn fast_config() -> InterviewConfig {
    let mut config = InterviewConfig::default();
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 5;
    config
}

pub struct Harness {
    pub service: Arc<InterviewService>,
    pub store: Arc<dyn SessionStore>,
    pub ledger: Arc<InMemoryCreditLedger>,
}

pub fn harness_with(
    config: &InterviewConfig,
    store: Arc<dyn SessionStore>,
    generator: Arc<dyn QuestionGenerator>,
    scorer: Arc<dyn AnswerScorer>,
    credits: i64,
) -> Harness {
    let ledger = Arc::new(InMemoryCreditLedger::new().with_account(USER, credits));
    let collaborators = Collaborators::new(store.clone(), ledger.clone(), generator, scorer);
    Harness {
        service: Arc::new(InterviewService::new(config, collaborators)),
        store,
        ledger,
    }
}

pub fn harness(config: &InterviewConfig, credits: i64) -> Harness {
    harness_with(
        config,
        Arc::new(InMemorySessionStore::new()),
        Arc::new(QuestionBank::new()),
        Arc::new(HeuristicScorer::new()),
        credits,
    )
}

/// Generator whose every call fails with an upstream error
#[derive(Default)]
pub struct FailingGenerator {
    pub calls: AtomicUsize,
}

impl FailingGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionGenerator for FailingGenerator {
    async fn generate(&self, _position: &str) -> InterviewResult<QuestionSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(InterviewError::upstream("question_generation", "model overloaded"))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Built-in question templates with every follow-up removed
#[derive(Default)]
pub struct NoFollowUpGenerator;

#[async_trait]
impl QuestionGenerator for NoFollowUpGenerator {
    async fn generate(&self, position: &str) -> InterviewResult<QuestionSet> {
        let mut set = QuestionBank::question_set(position);
        for question in set
            .behavioral
            .iter_mut()
            .chain(set.technical.iter_mut())
            .chain(set.situational.iter_mut())
        {
            question.follow_up.clear();
        }
        Ok(set)
    }

    fn name(&self) -> &'static str {
        "no_follow_up"
    }
}

/// Config whose sessions hold exactly `questions` questions
pub fn sized_config(questions: usize) -> InterviewConfig {
    let mut config = fast_config();
    config.session.questions_per_session = questions;
    config
}

/// Scorer that always fails
#[derive(Default)]
pub struct FailingScorer {
    pub calls: AtomicUsize,
}

impl FailingScorer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerScorer for FailingScorer {
    async fn score(&self, _request: &ScoringRequest) -> InterviewResult<AnswerScore> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(InterviewError::upstream("answer_scoring", "timeout"))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Scorer returning the same score for every answer
pub struct FixedScorer(pub f64);

#[async_trait]
impl AnswerScorer for FixedScorer {
    async fn score(&self, _request: &ScoringRequest) -> InterviewResult<AnswerScore> {
        Ok(AnswerScore::uniform(self.0, "fixed"))
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Store that behaves like a second instance reading a replica: `load`
/// keeps returning the first copy it saw of each session.
#[derive(Default)]
pub struct StaleReadStore {
    inner: InMemorySessionStore,
    first_seen: DashMap<Uuid, Session>,
}

#[async_trait]
impl SessionStore for StaleReadStore {
    async fn create(&self, session: &Session) -> PersistenceResult<()> {
        self.inner.create(session).await
    }

    async fn load(&self, session_id: Uuid) -> PersistenceResult<Option<Session>> {
        if let Some(session) = self.first_seen.get(&session_id) {
            return Ok(Some(session.clone()));
        }
        let loaded = self.inner.load(session_id).await?;
        if let Some(session) = &loaded {
            self.first_seen.insert(session_id, session.clone());
        }
        Ok(loaded)
    }

    async fn save(&self, session: &Session) -> PersistenceResult<u64> {
        self.inner.save(session).await
    }

    async fn list_for_user(&self, user_id: &str, limit: usize) -> PersistenceResult<Vec<Session>> {
        self.inner.list_for_user(user_id, limit).await
    }
}

/// Store whose backend is down
#[derive(Default)]
pub struct UnavailableStore {
    pub calls: AtomicUsize,
}

impl UnavailableStore {
    fn fail<T>(&self, operation: &str) -> PersistenceResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PersistenceError::storage_failure(operation, "connection refused"))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for UnavailableStore {
    async fn create(&self, _session: &Session) -> PersistenceResult<()> {
        self.fail("create")
    }

    async fn load(&self, _session_id: Uuid) -> PersistenceResult<Option<Session>> {
        self.fail("load")
    }

    async fn save(&self, _session: &Session) -> PersistenceResult<u64> {
        self.fail("save")
    }

    async fn list_for_user(&self, _user_id: &str, _limit: usize) -> PersistenceResult<Vec<Session>> {
        self.fail("list_for_user")
    }
}

/// A long, structured answer the heuristic scorer rates well
pub fn strong_answer() -> String {
    "In my last role I owned the release pipeline. First, I measured where time was lost; \
     for example, flaky integration tests cost us two hours per release. Then I split the \
     suite, added retries for known-flaky network calls and tracked the results weekly. \
     As a result, release time dropped by 60% and the team shipped twice as often."
        .to_string()
}
