use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::scoreboard::ScoreboardState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("unknown or expired session '{0}'")]
    UnknownSession(String),

    #[error("session limit of {0} reached")]
    SessionLimit(usize),
}

struct Session {
    board: ScoreboardState,
    last_used: Instant,
}

struct Inner {
    sessions: HashMap<String, Session>,
    max_sessions: usize,
    ttl: Duration,
}

/// In-memory registry of per-session scoreboards.
///
/// Cloning yields another handle to the same registry. Every scoreboard is
/// private to its session id; nothing is shared across sessions and nothing
/// is written to disk.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Inner>>,
}

impl SessionStore {
    pub fn new(max_sessions: usize, ttl: Duration) -> Self {
        SessionStore {
            inner: Arc::new(Mutex::new(Inner {
                sessions: HashMap::new(),
                max_sessions,
                ttl,
            })),
        }
    }

    // A poisoned lock still guards whole boards; every mutation is all-or-nothing.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new session with a fresh board and return its id.
    pub fn create(&self) -> Result<String, SessionError> {
        let mut inner = self.lock();
        let now = Instant::now();

        if inner.sessions.len() >= inner.max_sessions {
            let evicted = evict_expired(&mut inner, now);
            if evicted > 0 {
                debug!("Evicted {} idle session(s) to make room", evicted);
            }
        }
        if inner.sessions.len() >= inner.max_sessions {
            warn!("Session limit reached ({} sessions)", inner.max_sessions);
            return Err(SessionError::SessionLimit(inner.max_sessions));
        }

        let mut id = new_session_id();
        while inner.sessions.contains_key(&id) {
            id = new_session_id();
        }
        inner.sessions.insert(
            id.clone(),
            Session {
                board: ScoreboardState::new(),
                last_used: now,
            },
        );
        info!("Session {} created ({} live)", id, inner.sessions.len());
        Ok(id)
    }

    /// Run `f` against the board of session `id` and mark the session as used.
    pub fn with_session<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut ScoreboardState) -> T,
    ) -> Result<T, SessionError> {
        self.with_session_at(id, Instant::now(), f)
    }

    fn with_session_at<T>(
        &self,
        id: &str,
        now: Instant,
        f: impl FnOnce(&mut ScoreboardState) -> T,
    ) -> Result<T, SessionError> {
        let mut inner = self.lock();
        let ttl = inner.ttl;

        let expired = match inner.sessions.get(id) {
            Some(session) => now.saturating_duration_since(session.last_used) > ttl,
            None => return Err(SessionError::UnknownSession(id.to_string())),
        };
        if expired {
            inner.sessions.remove(id);
            info!("Session {} expired", id);
            return Err(SessionError::UnknownSession(id.to_string()));
        }

        let session = inner
            .sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::UnknownSession(id.to_string()))?;
        session.last_used = now;
        Ok(f(&mut session.board))
    }

    /// Drop a session. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.lock().sessions.remove(id).is_some();
        if removed {
            info!("Session {} closed", id);
        }
        removed
    }

    /// Drop every session idle for longer than the TTL as of `now`.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let mut inner = self.lock();
        let evicted = evict_expired(&mut inner, now);
        if evicted > 0 {
            info!(
                "Evicted {} idle session(s), {} remaining",
                evicted,
                inner.sessions.len()
            );
        }
        evicted
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().sessions.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn evict_expired(inner: &mut Inner, now: Instant) -> usize {
    let ttl = inner.ttl;
    let before = inner.sessions.len();
    inner
        .sessions
        .retain(|_, s| now.saturating_duration_since(s.last_used) <= ttl);
    before - inner.sessions.len()
}

fn new_session_id() -> String {
    format!("{:032x}", rand::thread_rng().gen::<u128>())
}
