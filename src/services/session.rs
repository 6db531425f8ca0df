use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session_id";

/// Fixed session lifetime: 24 hours.
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Server-side session state, keyed by an opaque cookie token.
///
/// Expired entries are dropped lazily when validated.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Create a new session and return its cookie token.
    pub fn create(&self) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now() + Duration::seconds(SESSION_TTL_SECS);
        self.sessions
            .lock()
            .expect("session lock poisoned")
            .insert(token.clone(), expires_at);
        token
    }

    /// True iff the token names a live, unexpired session.
    pub fn validate(&self, token: &str) -> bool {
        let mut sessions = self.sessions.lock().expect("session lock poisoned");
        match sessions.get(token) {
            Some(expires_at) if *expires_at > Utc::now() => true,
            Some(_) => {
                sessions.remove(token);
                false
            }
            None => false,
        }
    }

    /// Destroy a session; unknown tokens are a no-op.
    pub fn destroy(&self, token: &str) {
        self.sessions
            .lock()
            .expect("session lock poisoned")
            .remove(token);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
