// src/session/registry.rs

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use uuid::Uuid;

use super::runner::{DispatchStatus, SessionHandle};

/// Live exam sessions, keyed by session id.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, handle: SessionHandle) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle.id(), handle);
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Removes the session and cancels its countdown.
    pub fn remove(&self, id: &Uuid) -> Option<SessionHandle> {
        let handle = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        if let Some(handle) = &handle {
            handle.close();
        }
        handle
    }

    pub fn live_count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether a session that still needs the question has it loaded.
    ///
    /// A session keeps needing its questions until its result is delivered
    /// or the dispatch has failed.
    pub fn holds_question(&self, question_id: i64) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .any(|handle| {
                !handle.dispatch_status().is_settled() && handle.has_question(question_id)
            })
    }

    /// Drops sessions whose result has been delivered.
    ///
    /// Their final state stays available from the results table. Sessions
    /// whose dispatch failed are kept, since nothing else records them.
    pub fn sweep_delivered(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, handle| {
            !matches!(handle.dispatch_status(), DispatchStatus::Delivered(_))
        });
        before - sessions.len()
    }
}
