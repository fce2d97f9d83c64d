//! # Cache Module
//!
//! Process-local TTL caching for interview reads.
//!
//! ```text
//! InterviewCache            <- typed helpers, key layout, invalidation rules
//!   └── TtlCache<Value>     <- expiry, size bound, hit/miss stats, wildcard invalidation
//! ```
//!
//! Nothing here is shared across processes: each instance keeps its own
//! entries and statistics.

pub mod errors;
pub mod interview_cache;
pub(crate) mod keyed_lock;
pub mod pattern;
pub mod ttl_cache;

pub use errors::{CacheError, CacheResult};
pub use interview_cache::{InterviewCache, InterviewCacheTtls};
pub use pattern::wildcard_matches;
pub use ttl_cache::{CacheStats, TtlCache};
