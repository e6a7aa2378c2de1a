//! Per-Call Session Registry
//!
//! The [`SessionStore`] owns every active call's conversation history,
//! keyed by the externally-assigned call SID. A session is created when the
//! relay sends its `setup` event and removed when the WebSocket closes.
//!
//! Events for one call are serialized upstream (one dispatcher task per
//! connection), so the store only has to guarantee that an individual
//! operation never exposes a partially-mutated sequence. A single `RwLock`
//! over the map is sufficient for that: every operation is a short,
//! in-memory critical section.

use crate::convo::Turn;
use std::collections::HashMap;
use std::sync::RwLock;

/// A failure to locate a session.
///
/// Unknown call ids indicate a protocol violation by the relay (an event
/// arrived for a call that was never set up, or after teardown), not a
/// recoverable runtime condition. Callers log and drop the event.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no session for call '{0}'")]
    NotFound(String),
}

/// Process-wide registry mapping a call SID to its conversation history.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Vec<Turn>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes an empty history for `call_sid`.
    ///
    /// A repeated `setup` for the same SID resets the history: call SIDs are
    /// never reused concurrently, so a fresh setup always means a fresh
    /// conversation.
    pub fn create(&self, call_sid: &str) {
        let mut sessions = self.sessions.write().expect("session store lock poisoned");
        sessions.insert(call_sid.to_string(), Vec::new());
    }

    /// Returns a snapshot of the history for `call_sid`.
    pub fn get(&self, call_sid: &str) -> Result<Vec<Turn>, StoreError> {
        let sessions = self.sessions.read().expect("session store lock poisoned");
        sessions
            .get(call_sid)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(call_sid.to_string()))
    }

    /// Appends `turn` to the history for `call_sid`.
    pub fn append(&self, call_sid: &str, turn: Turn) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().expect("session store lock poisoned");
        let history = sessions
            .get_mut(call_sid)
            .ok_or_else(|| StoreError::NotFound(call_sid.to_string()))?;
        history.push(turn);
        Ok(())
    }

    /// Replaces the tail of the history starting at `index` with `tail`,
    /// as a single atomic mutation. Used by the interrupt resolver.
    ///
    /// An `index` past the end of the sequence appends (the resolver always
    /// passes an index it found in a snapshot of the same history).
    pub fn replace_from(
        &self,
        call_sid: &str,
        index: usize,
        tail: Vec<Turn>,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().expect("session store lock poisoned");
        let history = sessions
            .get_mut(call_sid)
            .ok_or_else(|| StoreError::NotFound(call_sid.to_string()))?;
        history.truncate(index);
        history.extend(tail);
        Ok(())
    }

    /// Removes the session for `call_sid`. A no-op for unknown SIDs, so
    /// teardown paths never have to care whether setup completed.
    pub fn remove(&self, call_sid: &str) {
        let mut sessions = self.sessions.write().expect("session store lock poisoned");
        sessions.remove(call_sid);
    }
}
