//! SSE server transport: one push stream plus POST intake, per session.
//!
//! [`SseServerTransport`] is the sole writer of its push stream and the
//! sole entry point for inbound POST bodies for one session. The stream is
//! handed off as a channel pair: `start()` keeps the sender as the
//! transport's exclusively-owned writer and returns a [`StreamHandle`]
//! wrapping the receiver, which the HTTP layer converts into an SSE
//! response.
//!
//! # Concurrency
//!
//! All state-mutating operations serialize on one internal lock, so two
//! concurrent `send` calls observe a strict global frame order on the
//! wire. Callbacks are invoked synchronously but after the lock is
//! released, so a callback may call back into the transport (for example
//! `on_message` answering with `send`). Callbacks must not block
//! indefinitely; the call that triggered them does not return until they
//! do.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use axum::response::sse::{Event as AxumSseEvent, Sse};
use axum::response::IntoResponse;
use futures::Stream;
use parking_lot::Mutex;
use sse_bridge_core::{parse_message, JsonRpcMessage, SessionId};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::{BridgeError, Result};
use crate::frame::SseFrame;

/// Connection state of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Constructed, stream not yet opened.
    Idle,
    /// Stream active, writer available.
    Open,
    /// Terminal; the transport is never reused.
    Closed,
}

type MessageCallback = Arc<dyn Fn(JsonRpcMessage) + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&BridgeError) + Send + Sync>;
type CloseCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Callbacks {
    on_message: Option<MessageCallback>,
    on_error: Option<ErrorCallback>,
    on_close: Option<CloseCallback>,
}

struct Inner {
    state: TransportState,
    writer: Option<mpsc::UnboundedSender<SseFrame>>,
}

/// Server transport for SSE: sends messages over an SSE push stream and
/// receives messages from HTTP POST requests.
pub struct SseServerTransport {
    session_id: SessionId,
    endpoint: String,
    inner: Mutex<Inner>,
    callbacks: Mutex<Callbacks>,
    // Self-reference for the stream's drop guard.
    weak: Weak<SseServerTransport>,
}

impl SseServerTransport {
    /// Creates a transport that directs the client to POST messages to
    /// `endpoint`, under a freshly generated session id.
    pub fn new(endpoint: impl Into<String>) -> Arc<Self> {
        Self::with_session_id(endpoint, SessionId::random())
    }

    /// Creates a transport bound to an externally-derived session id.
    pub fn with_session_id(endpoint: impl Into<String>, session_id: SessionId) -> Arc<Self> {
        let endpoint = endpoint.into();
        Arc::new_cyclic(|weak| Self {
            session_id,
            endpoint,
            inner: Mutex::new(Inner {
                state: TransportState::Idle,
                writer: None,
            }),
            callbacks: Mutex::new(Callbacks::default()),
            weak: weak.clone(),
        })
    }

    /// The session id embedded in the handshake and every POST URL.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// The POST endpoint advertised to the client, fixed at construction.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Current connection state.
    pub fn state(&self) -> TransportState {
        self.inner.lock().state
    }

    /// Sets the callback invoked synchronously for every accepted message.
    pub fn on_message(&self, callback: impl Fn(JsonRpcMessage) + Send + Sync + 'static) {
        self.callbacks.lock().on_message = Some(Arc::new(callback));
    }

    /// Sets the callback invoked on recoverable and fatal errors.
    pub fn on_error(&self, callback: impl Fn(&BridgeError) + Send + Sync + 'static) {
        self.callbacks.lock().on_error = Some(Arc::new(callback));
    }

    /// Sets the callback invoked exactly once when the transport closes.
    pub fn on_close(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.callbacks.lock().on_close = Some(Arc::new(callback));
    }

    /// Opens the push stream and writes the handshake frame.
    ///
    /// Transitions `Idle -> Open` and returns the handle the caller
    /// attaches to its outbound response. Calling `start` again while the
    /// stream is open is a usage error ([`BridgeError::AlreadyStarted`]);
    /// calling it on a closed transport reports
    /// [`BridgeError::NotConnected`] - a closed transport is never
    /// revived.
    pub fn start(&self) -> Result<StreamHandle> {
        let mut inner = self.inner.lock();
        match inner.state {
            TransportState::Open => return Err(BridgeError::AlreadyStarted),
            TransportState::Closed => return Err(BridgeError::NotConnected),
            TransportState::Idle => {}
        }

        let (tx, rx) = mpsc::unbounded_channel();
        // The receiver is still in scope, so this send cannot fail.
        let _ = tx.send(SseFrame::endpoint(&self.endpoint, &self.session_id));
        inner.writer = Some(tx);
        inner.state = TransportState::Open;
        drop(inner);

        Ok(StreamHandle {
            frames: rx,
            guard: StreamDropGuard {
                transport: self.weak.clone(),
            },
        })
    }

    /// Writes `message` to the stream as one discrete `event: message`
    /// frame.
    ///
    /// Frames appear on the wire in call order. A sink failure is fatal:
    /// the transport transitions to `Closed`, `on_error` and `on_close`
    /// fire, and the call reports [`BridgeError::WriteFailed`].
    pub fn send(&self, message: &JsonRpcMessage) -> Result<()> {
        let frame = SseFrame::message(message)?;

        let mut inner = self.inner.lock();
        if inner.state != TransportState::Open {
            return Err(BridgeError::NotConnected);
        }
        let Some(writer) = inner.writer.as_ref() else {
            return Err(BridgeError::NotConnected);
        };

        if writer.send(frame).is_err() {
            inner.state = TransportState::Closed;
            inner.writer = None;
            drop(inner);

            let error = BridgeError::WriteFailed("push stream receiver dropped".to_string());
            self.fire_error(&error);
            self.fire_close();
            return Err(error);
        }
        Ok(())
    }

    /// Handles one inbound POST body.
    ///
    /// Content-type and shape failures are local: they fire `on_error` and
    /// report a client error, leaving the transport open for further
    /// POSTs. On success the parsed message is dispatched synchronously to
    /// `on_message` before the call returns.
    pub fn receive_post(&self, content_type: Option<&str>, body: &str) -> Result<()> {
        if self.inner.lock().state != TransportState::Open {
            return Err(BridgeError::NotConnected);
        }

        let content_type = content_type.unwrap_or("");
        if !content_type
            .to_ascii_lowercase()
            .contains("application/json")
        {
            let error = BridgeError::UnsupportedContentType(content_type.to_string());
            self.fire_error(&error);
            return Err(error);
        }

        let message = match parse_message(body) {
            Ok(message) => message,
            Err(e) => {
                let error = BridgeError::MalformedMessage(e.to_string());
                self.fire_error(&error);
                return Err(error);
            }
        };

        let callback = self.callbacks.lock().on_message.clone();
        if let Some(callback) = callback {
            callback(message);
        }
        Ok(())
    }

    /// Closes the transport. Idempotent.
    ///
    /// Any transition into `Closed` finalizes the writer (ending the
    /// stream, if one was attached) and fires `on_close` exactly once, so
    /// whoever registered the transport learns it is gone even when it
    /// was never started. Closing a closed transport is a no-op.
    pub fn close(&self) {
        let notify = {
            let mut inner = self.inner.lock();
            let notify = inner.state != TransportState::Closed;
            inner.state = TransportState::Closed;
            inner.writer = None;
            notify
        };
        if notify {
            self.fire_close();
        }
    }

    fn fire_error(&self, error: &BridgeError) {
        let callback = self.callbacks.lock().on_error.clone();
        if let Some(callback) = callback {
            callback(error);
        }
    }

    fn fire_close(&self) {
        let callback = self.callbacks.lock().on_close.clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl std::fmt::Debug for SseServerTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SseServerTransport")
            .field("session_id", &self.session_id)
            .field("endpoint", &self.endpoint)
            .field("state", &self.state())
            .finish()
    }
}

/// Notifies the transport when the client side tears the stream down.
///
/// Axum drops the response body stream when the client disconnects; the
/// guard travels inside it, so the drop mirrors an explicit `close()`.
#[derive(Debug)]
struct StreamDropGuard {
    transport: Weak<SseServerTransport>,
}

impl Drop for StreamDropGuard {
    fn drop(&mut self) {
        if let Some(transport) = self.transport.upgrade() {
            transport.close();
        }
    }
}

/// Receiver side of an open push stream.
///
/// Returned by [`SseServerTransport::start`]; convert it into the HTTP
/// response with [`StreamHandle::into_sse_response`]. Dropping the handle
/// (or the response stream derived from it) closes the transport.
#[derive(Debug)]
pub struct StreamHandle {
    frames: mpsc::UnboundedReceiver<SseFrame>,
    guard: StreamDropGuard,
}

impl StreamHandle {
    /// Receives the next frame. Returns `None` once the transport closes.
    pub async fn recv(&mut self) -> Option<SseFrame> {
        self.frames.recv().await
    }

    /// Converts this handle into an axum SSE response streaming the
    /// transport's frames.
    pub fn into_sse_response(self) -> impl IntoResponse {
        Sse::new(FrameStream {
            inner: UnboundedReceiverStream::new(self.frames),
            _guard: self.guard,
        })
    }
}

/// Stream adapter mapping transport frames to axum SSE events.
struct FrameStream {
    inner: UnboundedReceiverStream<SseFrame>,
    _guard: StreamDropGuard,
}

impl Stream for FrameStream {
    type Item = std::result::Result<AxumSseEvent, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(frame)) => Poll::Ready(Some(Ok(AxumSseEvent::default()
                .event(frame.event)
                .data(frame.data)))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}
