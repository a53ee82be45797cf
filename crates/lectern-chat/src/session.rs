//! Conversation session store.
//!
//! Sessions are identified by opaque string ids and hold a bounded history
//! of turns. Idle sessions are evicted when new sessions are created.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use lectern_core::config::SessionConfig;
use lectern_core::types::{Role, Turn};

use crate::error::ChatError;

#[derive(Debug, Clone)]
struct Session {
    turns: Vec<Turn>,
    last_active: i64,
}

impl Session {
    fn new(now: i64) -> Self {
        Self {
            turns: Vec::new(),
            last_active: now,
        }
    }
}

/// In-memory store of conversation sessions.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    /// Number of user/assistant exchanges retained per session.
    max_history: usize,
    /// Idle minutes before a session is evicted. Zero disables eviction.
    idle_timeout_minutes: u32,
}

impl SessionStore {
    pub fn new(max_history: usize, idle_timeout_minutes: u32) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_history,
            idle_timeout_minutes,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.max_history, config.idle_timeout_minutes)
    }

    /// Create a new empty session and return its id.
    pub fn create_session(&self) -> Result<String, ChatError> {
        let now = Utc::now().timestamp();
        let mut sessions = self.lock()?;
        self.evict_idle_locked(&mut sessions, now);

        let mut id = Uuid::new_v4().to_string();
        while sessions.contains_key(&id) {
            id = Uuid::new_v4().to_string();
        }
        sessions.insert(id.clone(), Session::new(now));
        debug!(session_id = %id, "Session created");
        Ok(id)
    }

    /// Turns recorded for a session, oldest first.
    ///
    /// An unknown id yields an empty history.
    pub fn get_history(&self, session_id: &str) -> Result<Vec<Turn>, ChatError> {
        let sessions = self.lock()?;
        Ok(sessions
            .get(session_id)
            .map(|s| s.turns.clone())
            .unwrap_or_default())
    }

    /// Append a single turn. An unknown id starts a new session under that id.
    pub fn add_turn(
        &self,
        session_id: &str,
        role: Role,
        content: impl Into<String>,
    ) -> Result<(), ChatError> {
        self.append(
            session_id,
            [Turn {
                role,
                content: content.into(),
            }],
        )
    }

    /// Append a user turn followed by the assistant's reply, atomically.
    pub fn add_exchange(
        &self,
        session_id: &str,
        user: impl Into<String>,
        assistant: impl Into<String>,
    ) -> Result<(), ChatError> {
        self.append(session_id, [Turn::user(user), Turn::assistant(assistant)])
    }

    fn append<const N: usize>(&self, session_id: &str, turns: [Turn; N]) -> Result<(), ChatError> {
        let now = Utc::now().timestamp();
        let mut sessions = self.lock()?;
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(now));

        session.turns.extend(turns);
        session.last_active = now;

        let limit = self.max_history * 2;
        if session.turns.len() > limit {
            let excess = session.turns.len() - limit;
            session.turns.drain(..excess);
        }
        Ok(())
    }

    /// Whether a session with this id exists.
    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions
            .lock()
            .map(|s| s.contains_key(session_id))
            .unwrap_or(false)
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Remove sessions idle longer than the configured timeout. Returns the
    /// number removed.
    pub fn evict_idle(&self) -> Result<usize, ChatError> {
        let now = Utc::now().timestamp();
        let mut sessions = self.lock()?;
        Ok(self.evict_idle_locked(&mut sessions, now))
    }

    fn evict_idle_locked(&self, sessions: &mut HashMap<String, Session>, now: i64) -> usize {
        if self.idle_timeout_minutes == 0 {
            return 0;
        }
        let timeout_secs = i64::from(self.idle_timeout_minutes) * 60;
        let before = sessions.len();
        sessions.retain(|_, s| now - s.last_active <= timeout_secs);
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, "Evicted idle sessions");
        }
        evicted
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Session>>, ChatError> {
        self.sessions
            .lock()
            .map_err(|e| ChatError::Storage(format!("session lock poisoned: {}", e)))
    }
}
