//! Process-wide current-session registry.

use std::sync::RwLock;

use tracing::{info, warn};
use uuid::Uuid;

use crate::types::SessionDescriptor;

/// Thread-safe holder for the active session descriptor.
///
/// Read-heavy: handlers look the session up on hot paths while the
/// producer replaces it only on session change, so the state sits behind
/// a reader-writer lock where readers never block each other.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    current: RwLock<Option<SessionDescriptor>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    /// Install a new active session.
    ///
    /// Replaces any session already active, with a warning when the old
    /// one was never ended.
    pub fn start_session(&self, session: SessionDescriptor) {
        let mut current = self.current.write().expect("session registry poisoned");
        if let Some(previous) = current.as_ref() {
            if previous.session_id != session.session_id {
                warn!(
                    "session {} still active while starting {}",
                    previous.session_id, session.session_id
                );
            }
        }
        info!(
            "session started: {} - {} ({})",
            session.track_name, session.car_name, session.session_id
        );
        *current = Some(session);
    }

    /// End the active session.
    ///
    /// No-op (with a warning) when the id does not match the active
    /// session or when no session is active.
    pub fn end_session(&self, session_id: Uuid) {
        let mut current = self.current.write().expect("session registry poisoned");
        match current.as_ref() {
            Some(active) if active.session_id == session_id => {
                info!("session ended: {}", session_id);
                *current = None;
            }
            Some(active) => {
                warn!(
                    "attempted to end session {} but {} is active",
                    session_id, active.session_id
                );
            }
            None => {
                warn!(
                    "attempted to end session {} but no session is active",
                    session_id
                );
            }
        }
    }

    /// Snapshot of the active session, if any.
    pub fn current(&self) -> Option<SessionDescriptor> {
        self.current
            .read()
            .expect("session registry poisoned")
            .clone()
    }

    /// Whether a session is active.
    pub fn has_active_session(&self) -> bool {
        self.current
            .read()
            .expect("session registry poisoned")
            .is_some()
    }
}
