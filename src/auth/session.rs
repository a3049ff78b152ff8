//! auth::session
//!
//! In-memory session store for the relay server.
//!
//! # Design
//!
//! Two maps behind one `std::sync::Mutex`:
//!
//! - pending login `state` values, single use, valid for [`STATE_TTL`]
//! - sessions, `sid -> User`, valid for [`SESSION_TTL`] from creation
//!
//! Expired entries are pruned whenever the store is touched. The lock is
//! never held across an `.await`; every method is synchronous.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use uuid::Uuid;

use super::user::User;

/// How long a login `state` value stays valid.
pub const STATE_TTL: Duration = Duration::from_secs(10 * 60);

/// How long a session lives (matches the cookie's Max-Age).
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Opaque session identifier carried in the `sid` cookie.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap a value read back from a cookie.
    pub fn from_cookie(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionId([REDACTED])")
    }
}

struct SessionEntry {
    user: User,
    created: Instant,
}

#[derive(Default)]
struct Inner {
    states: HashMap<String, Instant>,
    sessions: HashMap<SessionId, SessionEntry>,
}

impl Inner {
    fn prune(&mut self, state_ttl: Duration, session_ttl: Duration) {
        self.states.retain(|_, issued| issued.elapsed() < state_ttl);
        self.sessions
            .retain(|_, entry| entry.created.elapsed() < session_ttl);
    }
}

/// Server-side login states and sessions.
pub struct SessionStore {
    inner: Mutex<Inner>,
    state_ttl: Duration,
    session_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.lock().sessions.len())
            .field("state_ttl", &self.state_ttl)
            .field("session_ttl", &self.session_ttl)
            .finish()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_ttls(STATE_TTL, SESSION_TTL)
    }

    /// Store with custom lifetimes.
    pub fn with_ttls(state_ttl: Duration, session_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            state_ttl,
            session_ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pruned(&self) -> MutexGuard<'_, Inner> {
        let mut inner = self.lock();
        inner.prune(self.state_ttl, self.session_ttl);
        inner
    }

    /// Issue a fresh login `state` value.
    pub fn issue_state(&self) -> String {
        let state = Uuid::new_v4().simple().to_string();
        self.pruned().states.insert(state.clone(), Instant::now());
        state
    }

    /// Consume a login `state`. Returns false if unknown, expired, or used.
    pub fn take_state(&self, state: &str) -> bool {
        self.pruned().states.remove(state).is_some()
    }

    /// Create a session for `user`.
    pub fn create(&self, user: User) -> SessionId {
        let sid = SessionId::generate();
        self.pruned().sessions.insert(
            sid.clone(),
            SessionEntry {
                user,
                created: Instant::now(),
            },
        );
        sid
    }

    /// The user for a live session.
    pub fn get(&self, sid: &SessionId) -> Option<User> {
        self.pruned().sessions.get(sid).map(|e| e.user.clone())
    }

    /// End a session. Returns whether it existed.
    pub fn remove(&self, sid: &SessionId) -> bool {
        self.pruned().sessions.remove(sid).is_some()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.pruned().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostUser;

    fn user(login: &str) -> User {
        User::from_host(
            HostUser {
                id: 7,
                login: login.into(),
                name: None,
                email: None,
                avatar_url: None,
            },
            "gho_t",
        )
    }

    mod states {
        use super::*;

        #[test]
        fn state_is_single_use() {
            let store = SessionStore::new();
            let state = store.issue_state();
            assert!(store.take_state(&state));
            assert!(!store.take_state(&state));
        }

        #[test]
        fn unknown_state_is_rejected() {
            let store = SessionStore::new();
            assert!(!store.take_state("forged"));
        }

        #[test]
        fn expired_state_is_rejected() {
            let store = SessionStore::with_ttls(Duration::ZERO, SESSION_TTL);
            let state = store.issue_state();
            assert!(!store.take_state(&state));
        }
    }

    mod sessions {
        use super::*;

        #[test]
        fn create_then_get() {
            let store = SessionStore::new();
            let sid = store.create(user("octocat"));
            assert_eq!(store.get(&sid).unwrap().username, "octocat");
            assert_eq!(store.len(), 1);
        }

        #[test]
        fn ids_are_unique() {
            let store = SessionStore::new();
            let a = store.create(user("a"));
            let b = store.create(user("b"));
            assert_ne!(a, b);
        }

        #[test]
        fn remove_ends_session() {
            let store = SessionStore::new();
            let sid = store.create(user("octocat"));
            assert!(store.remove(&sid));
            assert!(store.get(&sid).is_none());
            assert!(!store.remove(&sid));
        }

        #[test]
        fn expired_sessions_are_pruned() {
            let store = SessionStore::with_ttls(STATE_TTL, Duration::ZERO);
            let sid = store.create(user("octocat"));
            assert!(store.get(&sid).is_none());
            assert!(store.is_empty());
        }

        #[test]
        fn cookie_value_round_trips() {
            let store = SessionStore::new();
            let sid = store.create(user("octocat"));
            let echoed = SessionId::from_cookie(sid.as_str());
            assert!(store.get(&echoed).is_some());
        }

        #[test]
        fn debug_hides_id() {
            let sid = SessionId::from_cookie("abc-123");
            assert!(!format!("{:?}", sid).contains("abc-123"));
        }
    }
}
