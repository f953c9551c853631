//! Live sessions, keyed by id and owned by one user.

use dashmap::DashMap;
use shared_types::{SessionEvent, SessionSnapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, MutexGuard};

use super::ConversationState;

const SESSION_EVENT_CAPACITY: usize = 64;

/// One user's editing session.
///
/// The busy flag sits outside the state lock so a second send can be turned
/// away without waiting on the first one's gateway round-trip.
#[derive(Debug)]
pub struct SessionHandle {
    id: String,
    owner: String,
    state: Mutex<ConversationState>,
    busy: AtomicBool,
    events: broadcast::Sender<SessionEvent>,
}

/// Exclusive right to run one send on a session. Owns the session so a send
/// can outlive the request that started it; clears the busy flag when dropped.
#[derive(Debug)]
pub struct SendPermit {
    session: Arc<SessionHandle>,
}

impl SendPermit {
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }
}

impl Drop for SendPermit {
    fn drop(&mut self) {
        self.session.busy.store(false, Ordering::Release);
    }
}

impl SessionHandle {
    pub fn new(id: impl Into<String>, owner: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self {
            id: id.into(),
            owner: owner.into(),
            state: Mutex::new(ConversationState::new(events.clone())),
            busy: AtomicBool::new(false),
            events,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claim the session for one send; `None` while another send is pending.
    pub fn try_begin_send(self: &Arc<Self>) -> Option<SendPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SendPermit {
                session: Arc::clone(self),
            })
    }

    pub async fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            session_id: self.id.clone(),
            document: state.draft().clone(),
            turns: state.turns().to_vec(),
            busy: self.is_busy(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, Arc<SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, owner: &str) -> Arc<SessionHandle> {
        let id = ulid::Ulid::new().to_string();
        let session = Arc::new(SessionHandle::new(id.clone(), owner));
        self.sessions.insert(id, Arc::clone(&session));
        tracing::info!(session_id = %session.id(), owner, "Session created");
        session
    }

    /// Look up a session; another owner's session is reported as missing.
    pub fn get(&self, owner: &str, id: &str) -> Option<Arc<SessionHandle>> {
        self.sessions
            .get(id)
            .filter(|entry| entry.owner() == owner)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, owner: &str, id: &str) -> bool {
        let removed = self
            .sessions
            .remove_if(id, |_, session| session.owner() == owner)
            .is_some();
        if removed {
            tracing::info!(session_id = %id, owner, "Session closed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
