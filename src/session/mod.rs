//! Per-session context manager registry.
//!
//! Every debate thread gets its own [`ContextManager`]; the registry maps
//! session ids to managers so concurrent sessions in one process can never
//! corrupt each other's accumulated history. All core operations are pure,
//! synchronous and short, so a plain mutex around the map is sufficient.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::context::ContextManager;

/// Registry of per-session context managers.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, ContextManager>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a fresh session id.
    pub fn generate_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Runs `f` against the session's manager, creating it on first use.
    pub fn with_session<R>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut ContextManager) -> R,
    ) -> R {
        let mut sessions = self.sessions.lock().expect("session lock not poisoned");
        let manager = sessions.entry(session_id.to_string()).or_default();
        f(manager)
    }

    /// Drops a session's accumulated state. Returns true when the session
    /// existed.
    pub fn remove_session(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.lock().expect("session lock not poisoned");
        sessions.remove(session_id).is_some()
    }

    /// Ids of all live sessions.
    pub fn session_ids(&self) -> Vec<String> {
        let sessions = self.sessions.lock().expect("session lock not poisoned");
        sessions.keys().cloned().collect()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        let sessions = self.sessions.lock().expect("session lock not poisoned");
        sessions.len()
    }

    /// Whether no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
