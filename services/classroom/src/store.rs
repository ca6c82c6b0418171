//! In-Memory Session Store
//!
//! Holds the session state for every (app, user, session) triple for the
//! lifetime of the process. Each entry is owned by the store; updates replace
//! the stored state with the value returned by the core updater.

use chrono::{DateTime, Utc};
use sahayak_core::{
    SessionEvent, SessionState, StateError, clock::Clock, summary::SessionSummary,
};
use serde::Serialize;
use std::{collections::HashMap, fmt};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.app_name, self.user_id, self.session_id)
    }
}

/// A user query recorded against a session.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
pub struct StoredSession {
    pub key: SessionKey,
    pub state: SessionState,
    pub interactions: Vec<Interaction>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Session '{0}' already exists")]
    AlreadyExists(SessionKey),
    #[error("Session '{0}' not found")]
    NotFound(SessionKey),
    #[error(transparent)]
    State(#[from] StateError),
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: HashMap<SessionKey, StoredSession>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new session with its initial state.
    pub fn create(
        &mut self,
        key: SessionKey,
        state: SessionState,
    ) -> Result<&StoredSession, StoreError> {
        if self.sessions.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key));
        }
        info!(session = %key, domain = %state.domain(), "Created session");
        let stored = StoredSession {
            key: key.clone(),
            state,
            interactions: Vec::new(),
        };
        Ok(&*self.sessions.entry(key).or_insert(stored))
    }

    pub fn get(&self, key: &SessionKey) -> Option<&StoredSession> {
        self.sessions.get(key)
    }

    /// Applies `event` to the stored state and keeps the result.
    pub fn apply(
        &mut self,
        key: &SessionKey,
        event: &SessionEvent,
        clock: &dyn Clock,
    ) -> Result<&SessionState, StoreError> {
        let stored = self
            .sessions
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        stored.state = stored.state.apply(event, clock)?;
        Ok(&stored.state)
    }

    /// Appends a user query to the session's interaction history and returns
    /// the new interaction count.
    pub fn record_interaction(
        &mut self,
        key: &SessionKey,
        content: &str,
        clock: &dyn Clock,
    ) -> Result<usize, StoreError> {
        let stored = self
            .sessions
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        stored.interactions.push(Interaction {
            kind: "user_query".to_string(),
            content: content.to_string(),
            timestamp: clock.now(),
        });
        Ok(stored.interactions.len())
    }

    pub fn summary(&self, key: &SessionKey) -> Result<SessionSummary, StoreError> {
        let stored = self
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        Ok(SessionSummary::from_state(
            &stored.state,
            stored.interactions.len(),
        )?)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sahayak_core::{Domain, activity::ActivityEvent, clock::FixedClock};

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
    }

    fn activity(topic: &str, completed: bool) -> SessionEvent {
        SessionEvent::Activity(ActivityEvent::new(topic, "quiz", completed))
    }

    fn fun_state(user: &str) -> SessionState {
        SessionState::initialize(Domain::FunActivity, user, None, &clock())
    }

    #[test]
    fn test_create_and_get() {
        let mut store = InMemorySessionStore::new();
        let key = SessionKey::new("fun_activity_app", "u1", "session_001");
        store.create(key.clone(), fun_state("u1")).unwrap();

        let stored = store.get(&key).unwrap();
        assert_eq!(stored.state.owner_id(), "u1");
        assert!(stored.interactions.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_twice_is_rejected() {
        let mut store = InMemorySessionStore::new();
        let key = SessionKey::new("app", "u1", "s1");
        store.create(key.clone(), fun_state("u1")).unwrap();
        let err = store.create(key, fun_state("u1")).unwrap_err();
        assert_eq!(err.to_string(), "Session 'app/u1/s1' already exists");
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mut store = InMemorySessionStore::new();
        let first = SessionKey::new("app", "u1", "s1");
        let second = SessionKey::new("app", "u2", "s1");
        store.create(first.clone(), fun_state("u1")).unwrap();
        store.create(second.clone(), fun_state("u2")).unwrap();

        store.apply(&first, &activity("fractions", true), &clock()).unwrap();
        store.record_interaction(&first, "quiz on fractions", &clock()).unwrap();

        let untouched = store.get(&second).unwrap();
        assert_eq!(untouched.state, fun_state("u2"));
        assert!(untouched.interactions.is_empty());
    }

    #[test]
    fn test_apply_unknown_session() {
        let mut store = InMemorySessionStore::new();
        let key = SessionKey::new("app", "ghost", "s1");
        let err = store.apply(&key, &activity("x", false), &clock()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_apply_wrong_domain_keeps_state() {
        let mut store = InMemorySessionStore::new();
        let key = SessionKey::new("app", "t1", "s1");
        let planning = SessionState::initialize(Domain::Planning, "t1", None, &clock());
        store.create(key.clone(), planning.clone()).unwrap();

        let err = store.apply(&key, &activity("x", false), &clock()).unwrap_err();
        assert!(matches!(err, StoreError::State(StateError::InvalidInput(_))));
        assert_eq!(store.get(&key).unwrap().state, planning);
    }

    #[test]
    fn test_summary_counts_interactions() {
        let mut store = InMemorySessionStore::new();
        let key = SessionKey::new("app", "u1", "s1");
        store.create(key.clone(), fun_state("u1")).unwrap();
        assert_eq!(store.record_interaction(&key, "hello", &clock()).unwrap(), 1);
        assert_eq!(store.record_interaction(&key, "summary", &clock()).unwrap(), 2);
        store.apply(&key, &activity("fractions", false), &clock()).unwrap();

        let summary = store.summary(&key).unwrap();
        assert_eq!(summary.interaction_count, 2);
        assert_eq!(summary.recent, vec!["fractions"]);

        let interaction = &store.get(&key).unwrap().interactions[0];
        let json = serde_json::to_value(interaction).unwrap();
        assert_eq!(json["type"], "user_query");
        assert_eq!(json["content"], "hello");
    }
}
