//! Media transport abstraction.
//!
//! The session state machine drives a transport through these traits and
//! never touches sockets or codecs itself.

use crate::error::TransportError;
use crate::state::{JoinOptions, VoiceTarget};
use crate::stream::{StreamReporter, StreamRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// Establishes media connections.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Performs the media handshake for `target`.
    async fn connect(
        &self,
        target: VoiceTarget,
        options: JoinOptions,
    ) -> Result<Arc<dyn MediaConnection>, TransportError>;
}

/// A live media connection.
#[async_trait]
pub trait MediaConnection: Send + Sync {
    /// Opens a sub-stream. The transport reports its lifecycle through
    /// `reporter`.
    async fn open_stream(
        &self,
        request: StreamRequest,
        reporter: StreamReporter,
    ) -> Result<Arc<dyn MediaStream>, TransportError>;

    /// Starts teardown and returns immediately. Must tolerate the underlying
    /// connection already being gone.
    fn close(&self);
}

/// Transport side of one running sub-stream.
pub trait MediaStream: Send + Sync {
    fn pause(&self);
    fn resume(&self);
    fn set_volume(&self, level: f32);
    /// Stops the stream without waiting on the network.
    fn stop(&self);
}

/// A scriptable in-memory transport for testing.
pub mod mock {
    use super::*;
    use crate::stream::StreamKind;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Mock transport recording every connection it hands out.
    #[derive(Default)]
    pub struct MockTransport {
        connect_calls: AtomicUsize,
        failure: Mutex<Option<TransportError>>,
        gate: Option<Arc<Notify>>,
        connections: Mutex<Vec<Arc<MockConnection>>>,
    }

    impl MockTransport {
        /// A transport whose handshakes succeed immediately.
        pub fn new() -> Self {
            Self::default()
        }

        /// A transport whose handshakes wait until the returned gate is
        /// notified, once per handshake.
        pub fn gated() -> (Self, Arc<Notify>) {
            let gate = Arc::new(Notify::new());
            let transport = Self {
                gate: Some(gate.clone()),
                ..Self::default()
            };
            (transport, gate)
        }

        /// Makes the next handshake fail with `error`.
        pub fn fail_next(&self, error: TransportError) {
            *self.failure.lock() = Some(error);
        }

        pub fn connect_calls(&self) -> usize {
            self.connect_calls.load(Ordering::SeqCst)
        }

        /// Every connection handed out so far, in order.
        pub fn connections(&self) -> Vec<Arc<MockConnection>> {
            self.connections.lock().clone()
        }

        pub fn last_connection(&self) -> Option<Arc<MockConnection>> {
            self.connections.lock().last().cloned()
        }
    }

    #[async_trait]
    impl MediaTransport for MockTransport {
        async fn connect(
            &self,
            target: VoiceTarget,
            options: JoinOptions,
        ) -> Result<Arc<dyn MediaConnection>, TransportError> {
            self.connect_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let Some(error) = self.failure.lock().take() {
                return Err(error);
            }

            let connection = Arc::new(MockConnection::new(target, options));
            self.connections.lock().push(connection.clone());
            Ok(connection)
        }
    }

    /// Mock connection recording its streams and whether it was closed.
    pub struct MockConnection {
        target: VoiceTarget,
        options: JoinOptions,
        closed: AtomicBool,
        stream_failure: Mutex<Option<TransportError>>,
        streams: Mutex<Vec<Arc<MockStream>>>,
    }

    impl MockConnection {
        fn new(target: VoiceTarget, options: JoinOptions) -> Self {
            Self {
                target,
                options,
                closed: AtomicBool::new(false),
                stream_failure: Mutex::new(None),
                streams: Mutex::new(Vec::new()),
            }
        }

        pub fn target(&self) -> VoiceTarget {
            self.target
        }

        pub fn options(&self) -> JoinOptions {
            self.options
        }

        pub fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }

        /// Makes the next `open_stream` fail with `error`.
        pub fn fail_next_stream(&self, error: TransportError) {
            *self.stream_failure.lock() = Some(error);
        }

        pub fn streams(&self) -> Vec<Arc<MockStream>> {
            self.streams.lock().clone()
        }

        /// The most recently opened stream of `kind`.
        pub fn stream(&self, kind: StreamKind) -> Option<Arc<MockStream>> {
            self.streams
                .lock()
                .iter()
                .rev()
                .find(|stream| stream.request.kind() == kind)
                .cloned()
        }
    }

    #[async_trait]
    impl MediaConnection for MockConnection {
        async fn open_stream(
            &self,
            request: StreamRequest,
            reporter: StreamReporter,
        ) -> Result<Arc<dyn MediaStream>, TransportError> {
            if self.is_closed() {
                return Err(TransportError::new("connection closed"));
            }
            if let Some(error) = self.stream_failure.lock().take() {
                return Err(error);
            }

            let stream = Arc::new(MockStream {
                request,
                reporter,
                paused: AtomicBool::new(false),
                volume: Mutex::new(None),
                stopped: AtomicBool::new(false),
            });
            self.streams.lock().push(stream.clone());
            Ok(stream)
        }

        fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    /// Mock stream exposing its reporter so tests can drive notifications.
    pub struct MockStream {
        request: StreamRequest,
        reporter: StreamReporter,
        paused: AtomicBool,
        volume: Mutex<Option<f32>>,
        stopped: AtomicBool,
    }

    impl MockStream {
        pub fn request(&self) -> &StreamRequest {
            &self.request
        }

        pub fn reporter(&self) -> &StreamReporter {
            &self.reporter
        }

        pub fn is_paused(&self) -> bool {
            self.paused.load(Ordering::SeqCst)
        }

        /// Last volume pushed by the session, if any.
        pub fn volume(&self) -> Option<f32> {
            *self.volume.lock()
        }

        pub fn is_stopped(&self) -> bool {
            self.stopped.load(Ordering::SeqCst)
        }
    }

    impl MediaStream for MockStream {
        fn pause(&self) {
            self.paused.store(true, Ordering::SeqCst);
        }

        fn resume(&self) {
            self.paused.store(false, Ordering::SeqCst);
        }

        fn set_volume(&self, level: f32) {
            *self.volume.lock() = Some(level);
        }

        fn stop(&self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }
}
