#![allow(clippy::doc_markdown)] // Allow technical terms like TTL, LLM in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Interview Core
//!
//! Session engine for AI mock interviews.
//!
//! ## Overview
//!
//! A candidate starts an interview for a position, spending one credit. The
//! engine generates a question set, walks the candidate through each question
//! and its follow-up, scores every exchange and rolls the scores up into a
//! final evaluation. Question generation and scoring are slow, flaky upstream
//! calls, so they run behind retries, circuit breakers and graceful
//! degradation to built-in fallbacks.
//!
//! ## Module Organization
//!
//! - [`cache`] - TTL cache with hit/miss statistics and wildcard invalidation
//! - [`resilience`] - Retry, circuit breakers, degradation and error classification
//! - [`models`] - Sessions, questions, answers and evaluations
//! - [`state_machine`] - Session transitions, guards, scoring and the session store
//! - [`services`] - Collaborator traits and the interview service
//! - [`api`] - Request validation and response envelopes
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use interview_core::config::InterviewConfig;
//! use interview_core::models::{DifficultyFilter, InterviewMode};
//! use interview_core::services::{
//!     Collaborators, HeuristicScorer, InMemoryCreditLedger, InterviewService, QuestionBank,
//! };
//! use interview_core::state_machine::InMemorySessionStore;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let collaborators = Collaborators::new(
//!     Arc::new(InMemorySessionStore::new()),
//!     Arc::new(InMemoryCreditLedger::new().with_account("user_1", 3)),
//!     Arc::new(QuestionBank::new()),
//!     Arc::new(HeuristicScorer::new()),
//! );
//! let service = InterviewService::new(&InterviewConfig::default(), collaborators);
//!
//! let session = service
//!     .start_interview(
//!         "user_1",
//!         "Backend Engineer",
//!         InterviewMode::Configured,
//!         DifficultyFilter::Mixed,
//!     )
//!     .await?;
//! let outcome = service
//!     .submit_answer(session.id, "user_1", "I led the migration to async IO...", false)
//!     .await?;
//! println!("next: {}", outcome.next_action.label());
//! # Ok::<(), interview_core::InterviewError>(())
//! # }).unwrap();
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit and integration tests
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod resilience;
pub mod services;
pub mod state_machine;

pub use config::{ConfigManager, InterviewConfig};
pub use error::{InterviewError, InterviewResult};
pub use services::InterviewService;
