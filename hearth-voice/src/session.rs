//! A single voice session and its sub-streams.

use crate::error::{TransportError, VoiceError, VoiceResult};
use crate::state::{JoinOptions, VoiceState, VoiceTarget};
use crate::stream::{
    AudioSource, StreamKind, StreamReporter, StreamRequest, SubStream, VideoOptions,
};
use crate::transport::{MediaConnection, MediaStream, MediaTransport};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

const EVENT_CAPACITY: usize = 16;

/// Session-level lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The media handshake completed.
    Ready,
    /// The stored lifecycle state changed. Derived `Streaming` is not
    /// announced.
    StateChanged(VoiceState),
    /// Teardown finished; every handle was released.
    Disconnected,
}

struct StreamSlot {
    reporter: StreamReporter,
    /// `None` while the transport is still opening the stream.
    stream: Option<Arc<dyn MediaStream>>,
}

impl StreamSlot {
    fn is_active(&self) -> bool {
        !self.reporter.has_ended()
    }
}

struct Inner {
    /// Never `Streaming`; that state is derived from `streams`.
    state: VoiceState,
    connection: Option<Arc<dyn MediaConnection>>,
    streams: HashMap<StreamKind, StreamSlot>,
}

impl Inner {
    fn state(&self) -> VoiceState {
        match self.state {
            VoiceState::Connected if self.streams.values().any(StreamSlot::is_active) => {
                VoiceState::Streaming
            }
            state => state,
        }
    }
}

/// One voice connection for a guild or DM context.
pub struct VoiceSession {
    id: Uuid,
    target: VoiceTarget,
    options: JoinOptions,
    inner: Mutex<Inner>,
    events: broadcast::Sender<SessionEvent>,
}

impl fmt::Debug for VoiceSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceSession")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("state", &self.state())
            .finish()
    }
}

impl VoiceSession {
    /// Creates an idle session.
    pub fn new(target: VoiceTarget, options: JoinOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            id: Uuid::new_v4(),
            target,
            options,
            inner: Mutex::new(Inner {
                state: VoiceState::Idle,
                connection: None,
                streams: HashMap::new(),
            }),
            events,
        }
    }

    /// Per-session nonce, used to tell sessions for the same context apart.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn target(&self) -> VoiceTarget {
        self.target
    }

    pub fn options(&self) -> JoinOptions {
        self.options
    }

    pub fn state(&self) -> VoiceState {
        self.inner.lock().state()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Kinds of the sub-streams currently running.
    pub fn active_streams(&self) -> Vec<StreamKind> {
        let inner = self.inner.lock();
        let mut kinds: Vec<StreamKind> = inner
            .streams
            .iter()
            .filter(|(_, slot)| slot.is_active())
            .map(|(kind, _)| *kind)
            .collect();
        kinds.sort();
        kinds
    }

    /// Runs the media handshake: `Idle -> Connecting -> Connected`.
    ///
    /// A handshake failure, or a [`disconnect`](Self::disconnect) issued
    /// while it was in flight, leaves the session `Closed` and returns
    /// [`VoiceError::ConnectionFailed`]. Dropping the returned future before
    /// the handshake finishes also closes the session.
    pub async fn connect(&self, transport: &dyn MediaTransport) -> VoiceResult<()> {
        self.begin_connect()?;
        self.handshake(transport).await
    }

    /// Claims the session for a handshake: `Idle -> Connecting`.
    ///
    /// Only the first caller succeeds; later callers get
    /// [`VoiceError::AlreadyConnecting`] or [`VoiceError::AlreadyConnected`].
    pub fn begin_connect(&self) -> VoiceResult<()> {
        let mut inner = self.inner.lock();
        match inner.state() {
            VoiceState::Idle => {}
            VoiceState::Connecting => {
                return Err(VoiceError::AlreadyConnecting(self.target.context));
            }
            VoiceState::Connected | VoiceState::Streaming => {
                return Err(VoiceError::AlreadyConnected(self.target.context));
            }
            // A torn-down session is not reusable.
            VoiceState::Disconnecting | VoiceState::Closed => {
                return Err(VoiceError::NotConnected);
            }
        }
        self.transition(&mut inner, VoiceState::Connecting);
        drop(inner);

        info!(
            session_id = %self.id,
            context = %self.target.context,
            channel_id = %self.target.channel_id,
            "Joining voice channel"
        );
        Ok(())
    }

    /// Completes a handshake claimed by [`begin_connect`](Self::begin_connect).
    pub(crate) async fn handshake(&self, transport: &dyn MediaTransport) -> VoiceResult<()> {
        let mut guard = HandshakeGuard {
            session: self,
            armed: true,
        };
        let result = transport.connect(self.target, self.options).await;
        guard.armed = false;

        let mut inner = self.inner.lock();
        match result {
            Ok(connection) if inner.state == VoiceState::Connecting => {
                inner.connection = Some(connection);
                self.transition(&mut inner, VoiceState::Connected);
                let _ = self.events.send(SessionEvent::Ready);
                info!(session_id = %self.id, "Voice connection ready");
                Ok(())
            }
            Ok(connection) => {
                drop(inner);
                connection.close();
                warn!(session_id = %self.id, "Voice session closed during handshake");
                Err(VoiceError::ConnectionFailed {
                    context: self.target.context,
                    source: TransportError::new("session disconnected during handshake"),
                })
            }
            Err(source) => {
                if inner.state == VoiceState::Connecting {
                    self.transition(&mut inner, VoiceState::Closed);
                    let _ = self.events.send(SessionEvent::Disconnected);
                }
                warn!(session_id = %self.id, error = %source, "Voice handshake failed");
                Err(VoiceError::ConnectionFailed {
                    context: self.target.context,
                    source,
                })
            }
        }
    }

    /// Closes a session whose handshake future was dropped mid-flight.
    fn abandon_handshake(&self) {
        let mut inner = self.inner.lock();
        if inner.state != VoiceState::Connecting {
            return;
        }
        self.transition(&mut inner, VoiceState::Closed);
        let _ = self.events.send(SessionEvent::Disconnected);
        warn!(session_id = %self.id, "Voice handshake cancelled");
    }

    /// Opens a screen/application capture sub-stream.
    pub async fn create_stream(&self) -> VoiceResult<SubStream> {
        self.open(StreamRequest::Capture).await
    }

    /// Starts playing `source` at full volume.
    pub async fn play_audio(&self, source: AudioSource) -> VoiceResult<SubStream> {
        self.open(StreamRequest::Playback {
            source,
            volume: 1.0,
        })
        .await
    }

    /// Opens a camera video sub-stream.
    pub async fn create_video_stream(&self, options: VideoOptions) -> VoiceResult<SubStream> {
        self.open(StreamRequest::RecordVideo(options)).await
    }

    /// Opens a sub-stream of the request's kind.
    pub async fn open(&self, request: StreamRequest) -> VoiceResult<SubStream> {
        let kind = request.kind();
        let volume = match &request {
            StreamRequest::Playback { volume, .. } => *volume,
            _ => 1.0,
        };
        let reporter = StreamReporter::new(kind);

        let connection = {
            let mut inner = self.inner.lock();
            if !inner.state().is_live() {
                return Err(VoiceError::NotConnected);
            }
            if inner.streams.get(&kind).is_some_and(StreamSlot::is_active) {
                return Err(VoiceError::StreamAlreadyActive(kind));
            }
            let Some(connection) = inner.connection.clone() else {
                return Err(VoiceError::NotConnected);
            };
            inner.streams.insert(
                kind,
                StreamSlot {
                    reporter: reporter.clone(),
                    stream: None,
                },
            );
            connection
        };

        let opened = connection.open_stream(request, reporter.clone()).await;

        let mut inner = self.inner.lock();
        let reserved = inner
            .streams
            .get(&kind)
            .is_some_and(|slot| slot.reporter.same_stream(&reporter));

        match opened {
            Ok(stream) if reserved && !reporter.has_ended() => {
                if let Some(slot) = inner.streams.get_mut(&kind) {
                    slot.stream = Some(stream.clone());
                }
                debug!(session_id = %self.id, %kind, "Sub-stream opened");
                Ok(SubStream::new(reporter, stream, volume))
            }
            Ok(stream) => {
                // Torn down while the transport was opening it.
                drop(inner);
                stream.stop();
                reporter.end();
                Err(VoiceError::NotConnected)
            }
            Err(error) => {
                if reserved {
                    inner.streams.remove(&kind);
                }
                reporter.end();
                warn!(session_id = %self.id, %kind, error = %error, "Failed to open sub-stream");
                Err(VoiceError::Transport(error))
            }
        }
    }

    /// Tears the session down and releases every handle.
    ///
    /// Returns without waiting on the network. Calling it on an idle or
    /// already closed session does nothing.
    pub fn disconnect(&self) {
        let (connection, streams) = {
            let mut inner = self.inner.lock();
            match inner.state {
                VoiceState::Idle | VoiceState::Disconnecting | VoiceState::Closed => return,
                _ => {}
            }
            self.transition(&mut inner, VoiceState::Disconnecting);
            let streams: Vec<StreamSlot> = inner.streams.drain().map(|(_, slot)| slot).collect();
            (inner.connection.take(), streams)
        };

        for slot in &streams {
            slot.reporter.stop(slot.stream.as_deref());
        }
        if let Some(connection) = connection {
            connection.close();
        }

        let mut inner = self.inner.lock();
        self.transition(&mut inner, VoiceState::Closed);
        let _ = self.events.send(SessionEvent::Disconnected);
        info!(
            session_id = %self.id,
            released_streams = streams.len(),
            "Voice session closed"
        );
    }

    fn transition(&self, inner: &mut Inner, next: VoiceState) {
        debug!(session_id = %self.id, from = %inner.state, to = %next, "Voice state transition");
        inner.state = next;
        let _ = self.events.send(SessionEvent::StateChanged(next));
    }
}

/// Closes the session if the handshake future is dropped before it resolves.
struct HandshakeGuard<'a> {
    session: &'a VoiceSession,
    armed: bool,
}

impl Drop for HandshakeGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session.abandon_handshake();
        }
    }
}

impl Drop for VoiceSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}
