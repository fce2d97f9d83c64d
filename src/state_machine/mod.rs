// Interview session state machine
//
// Pure transition logic (question → follow-up → next question → completed),
// guards, score aggregation, and the session store abstraction the service
// layer persists through.

pub mod errors;
pub mod events;
pub mod guards;
pub mod persistence;
pub mod scoring;
pub mod session_state_machine;
pub mod states;

// Re-export main types for convenient access
pub use errors::{
    GuardError, GuardResult, PersistenceError, PersistenceResult, StateMachineError,
    StateMachineResult,
};
pub use events::SessionEvent;
pub use persistence::{InMemorySessionStore, SessionStore};
pub use scoring::{round_to_tenth, CategoryWeights, ScoringStrategy};
pub use session_state_machine::{ScoringRequest, SessionStateMachine, TransitionPlan};
pub use states::{NextAction, SessionStage};

// Common traits and utilities
pub use guards::StateGuard;
