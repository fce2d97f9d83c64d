use super::errors::{PersistenceError, PersistenceResult};
use crate::models::Session;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

/// Storage for sessions with optimistic concurrency on `version`
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new session; fails if the id is taken
    async fn create(&self, session: &Session) -> PersistenceResult<()>;

    async fn load(&self, session_id: Uuid) -> PersistenceResult<Option<Session>>;

    /// Replace a stored session if its stored version still equals
    /// `session.version`. Returns the new version.
    async fn save(&self, session: &Session) -> PersistenceResult<u64>;

    /// A user's sessions, newest first
    async fn list_for_user(&self, user_id: &str, limit: usize) -> PersistenceResult<Vec<Session>>;
}

/// `DashMap`-backed store for tests and single-process embedding
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<Uuid, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: &Session) -> PersistenceResult<()> {
        match self.sessions.entry(session.id) {
            Entry::Occupied(_) => Err(PersistenceError::AlreadyExists {
                entity_id: session.id.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(session.clone());
                debug!(session_id = %session.id, "Session created");
                Ok(())
            }
        }
    }

    async fn load(&self, session_id: Uuid) -> PersistenceResult<Option<Session>> {
        Ok(self.sessions.get(&session_id).map(|entry| entry.clone()))
    }

    async fn save(&self, session: &Session) -> PersistenceResult<u64> {
        match self.sessions.entry(session.id) {
            Entry::Vacant(_) => Err(PersistenceError::NotFound {
                entity_id: session.id.to_string(),
            }),
            Entry::Occupied(mut slot) => {
                let stored_version = slot.get().version;
                if stored_version != session.version {
                    return Err(PersistenceError::ConcurrentModification {
                        entity_id: session.id.to_string(),
                        expected_version: session.version,
                        actual_version: stored_version,
                    });
                }

                let mut updated = session.clone();
                updated.version = stored_version + 1;
                let new_version = updated.version;
                slot.insert(updated);
                debug!(session_id = %session.id, version = new_version, "Session saved");
                Ok(new_version)
            }
        }
    }

    async fn list_for_user(&self, user_id: &str, limit: usize) -> PersistenceResult<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .sessions
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        sessions.truncate(limit);
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Question, QuestionCategory, QuestionDifficulty};

    fn session(user_id: &str) -> Session {
        Session::new(
            user_id,
            "QA Engineer",
            vec![Question::new("q", "", QuestionCategory::Technical, QuestionDifficulty::Easy, 2)],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_bumps_version() {
        let store = InMemorySessionStore::new();
        let mut s = session("user_1");
        store.create(&s).await.unwrap();

        s.current_question_index = 0;
        let version = store.save(&s).await.unwrap();
        assert_eq!(version, 1);
        assert_eq!(store.load(s.id).await.unwrap().unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let store = InMemorySessionStore::new();
        let s = session("user_1");
        store.create(&s).await.unwrap();

        store.save(&s).await.unwrap();
        let result = store.save(&s).await;
        assert!(matches!(
            result,
            Err(PersistenceError::ConcurrentModification {
                expected_version: 0,
                actual_version: 1,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_create_and_missing_save() {
        let store = InMemorySessionStore::new();
        let s = session("user_1");
        store.create(&s).await.unwrap();
        assert!(matches!(
            store.create(&s).await,
            Err(PersistenceError::AlreadyExists { .. })
        ));

        let other = session("user_1");
        assert!(matches!(
            store.save(&other).await,
            Err(PersistenceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_for_user_is_newest_first_and_limited() {
        let store = InMemorySessionStore::new();
        let mut first = session("user_1");
        first.started_at -= chrono::Duration::minutes(5);
        let second = session("user_1");
        store.create(&first).await.unwrap();
        store.create(&second).await.unwrap();
        store.create(&session("user_2")).await.unwrap();

        let listed = store.list_for_user("user_1", 10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);

        assert_eq!(store.list_for_user("user_1", 1).await.unwrap().len(), 1);
    }
}
