//! Per-context session registry.

use crate::error::{VoiceError, VoiceResult};
use crate::session::VoiceSession;
use crate::state::{JoinOptions, VoiceState, VoiceTarget};
use crate::transport::MediaTransport;
use hearth_types::Snowflake;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Owns at most one voice session per guild or DM context.
pub struct VoiceManager {
    transport: Arc<dyn MediaTransport>,
    sessions: Mutex<HashMap<Snowflake, Arc<VoiceSession>>>,
}

impl VoiceManager {
    pub fn new(transport: Arc<dyn MediaTransport>) -> Self {
        Self {
            transport,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Joins `target`, resolving once the media handshake completes.
    ///
    /// Fails with [`VoiceError::AlreadyConnecting`] or
    /// [`VoiceError::AlreadyConnected`] while another session for the same
    /// context is in flight or live; that session is left untouched. A closed
    /// session for the context is replaced. Dropping the returned future
    /// mid-handshake closes the new session, so a later join can proceed.
    pub async fn join_channel(
        &self,
        target: VoiceTarget,
        options: JoinOptions,
    ) -> VoiceResult<Arc<VoiceSession>> {
        let session = {
            let mut sessions = self.sessions.lock();
            if let Some(existing) = sessions.get(&target.context) {
                match existing.state() {
                    VoiceState::Connecting => {
                        return Err(VoiceError::AlreadyConnecting(target.context));
                    }
                    VoiceState::Connected | VoiceState::Streaming => {
                        return Err(VoiceError::AlreadyConnected(target.context));
                    }
                    VoiceState::Idle | VoiceState::Disconnecting | VoiceState::Closed => {
                        debug!(context = %target.context, "Replacing stale voice session");
                    }
                }
            }
            let session = Arc::new(VoiceSession::new(target, options));
            // Claimed before the lock is released so a concurrent join sees `Connecting`.
            session.begin_connect()?;
            sessions.insert(target.context, session.clone());
            session
        };

        session.handshake(self.transport.as_ref()).await?;
        Ok(session)
    }

    /// The session for `context`, in whatever state it is.
    pub fn session(&self, context: Snowflake) -> Option<Arc<VoiceSession>> {
        self.sessions.lock().get(&context).cloned()
    }

    /// Disconnects and forgets the session for `context`, if any.
    pub fn disconnect(&self, context: Snowflake) {
        let session = self.sessions.lock().remove(&context);
        if let Some(session) = session {
            session.disconnect();
        }
    }

    /// Disconnects every session.
    pub fn disconnect_all(&self) {
        let sessions: Vec<Arc<VoiceSession>> =
            self.sessions.lock().drain().map(|(_, s)| s).collect();
        for session in sessions {
            session.disconnect();
        }
    }

    /// Contexts with a live or in-flight session.
    pub fn active_contexts(&self) -> Vec<Snowflake> {
        let mut contexts: Vec<Snowflake> = self
            .sessions
            .lock()
            .iter()
            .filter(|(_, session)| {
                matches!(
                    session.state(),
                    VoiceState::Connecting | VoiceState::Connected | VoiceState::Streaming
                )
            })
            .map(|(context, _)| *context)
            .collect();
        contexts.sort();
        contexts
    }
}
