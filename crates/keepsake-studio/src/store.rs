use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use mini_moka::sync::Cache;
use uuid::Uuid;

use crate::{
    error::{Result, StudioError},
    session::Session,
};

pub type SharedSession = Arc<Mutex<Session>>;

/// Lock a session
///
/// Session methods never panic midway, so a poisoned lock still holds
/// consistent state.
pub fn lock(session: &SharedSession) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory session storage with idle eviction
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<Uuid, SharedSession>,
    max_images: usize,
}

impl SessionStore {
    pub fn new(max_sessions: u64, idle_ttl: Duration, max_images: usize) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(max_sessions)
                .time_to_idle(idle_ttl)
                .build(),
            max_images,
        }
    }

    /// Start a fresh session
    pub fn create(&self) -> (Uuid, SharedSession) {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(Session::new(self.max_images)));
        self.sessions.insert(id, Arc::clone(&session));
        (id, session)
    }

    /// Look up a session by its textual id
    pub fn get(&self, id: &str) -> Result<(Uuid, SharedSession)> {
        let id = Uuid::parse_str(id).map_err(|_| StudioError::SessionNotFound)?;
        let session = self.sessions.get(&id).ok_or(StudioError::SessionNotFound)?;
        Ok((id, session))
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("max_images", &self.max_images)
            .finish_non_exhaustive()
    }
}
