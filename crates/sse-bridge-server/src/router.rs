//! Session router: maps a session key to exactly one live transport.
//!
//! The registry is the single structure shared across concurrent external
//! calls. Creation goes through `DashMap::entry`, so under concurrent
//! connects for the same new key exactly one transport is constructed and
//! every caller observes it. A closed transport removes itself from the
//! registry; a later connect under the same key starts fresh rather than
//! reviving the old instance.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use sse_bridge_core::{JsonRpcMessage, SessionId};
use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::transport::SseServerTransport;

/// Observer interface for everything the router's transports report.
///
/// `on_message` runs synchronously inside the POST call that delivered the
/// message; it may send responses through [`SessionRouter::send`] but must
/// not block indefinitely.
pub trait SessionHandler: Send + Sync + 'static {
    /// An accepted inbound message for `session_id`.
    fn on_message(&self, session_id: &SessionId, message: JsonRpcMessage);

    /// A recoverable or fatal transport error for `session_id`.
    fn on_error(&self, session_id: &SessionId, error: &BridgeError) {
        let _ = (session_id, error);
    }

    /// The session's transport closed; fired exactly once per transport.
    fn on_session_closed(&self, session_id: &SessionId) {
        let _ = session_id;
    }
}

/// Routes inbound HTTP calls to the one transport for their session.
pub struct SessionRouter {
    sessions: DashMap<SessionId, Arc<SseServerTransport>>,
    message_endpoint: String,
    handler: Arc<dyn SessionHandler>,
    // Self-reference handed to each transport's close hook.
    weak: Weak<SessionRouter>,
}

impl SessionRouter {
    /// Creates a router whose transports advertise `message_endpoint` in
    /// their handshake frames.
    pub fn new(message_endpoint: impl Into<String>, handler: Arc<dyn SessionHandler>) -> Arc<Self> {
        let message_endpoint = message_endpoint.into();
        Arc::new_cyclic(|weak| Self {
            sessions: DashMap::new(),
            message_endpoint,
            handler,
            weak: weak.clone(),
        })
    }

    /// Returns the live transport for `session_id`, constructing and
    /// registering one if none exists.
    pub fn connect(&self, session_id: SessionId) -> Arc<SseServerTransport> {
        let entry = self
            .sessions
            .entry(session_id.clone())
            .or_insert_with(|| self.build_transport(session_id));
        Arc::clone(entry.value())
    }

    /// Delivers a POST body to the session's transport.
    ///
    /// A POST never implicitly creates a session: an unknown or expired
    /// key reports [`BridgeError::SessionNotFound`].
    pub fn route_message(
        &self,
        session_id: &SessionId,
        content_type: Option<&str>,
        body: &str,
    ) -> Result<()> {
        let transport = self.lookup(session_id)?;
        transport.receive_post(content_type, body)
    }

    /// Pushes a server-originated message down the session's stream.
    pub fn send(&self, session_id: &SessionId, message: &JsonRpcMessage) -> Result<()> {
        let transport = self.lookup(session_id)?;
        transport.send(message)
    }

    /// Closes the session's transport, if it is live. Returns whether a
    /// transport was found.
    pub fn close_session(&self, session_id: &SessionId) -> bool {
        match self.lookup(session_id) {
            Ok(transport) => {
                transport.close();
                true
            }
            Err(_) => false,
        }
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    // The registry reference must be released before calling into the
    // transport: a close fired downstream re-enters `sessions` to remove
    // the entry.
    fn lookup(&self, session_id: &SessionId) -> Result<Arc<SseServerTransport>> {
        self.sessions
            .get(session_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| BridgeError::SessionNotFound(session_id.clone()))
    }

    fn build_transport(&self, session_id: SessionId) -> Arc<SseServerTransport> {
        debug!(session_id = %session_id, "creating transport");
        let transport =
            SseServerTransport::with_session_id(self.message_endpoint.clone(), session_id.clone());

        let handler = Arc::clone(&self.handler);
        let sid = session_id.clone();
        transport.on_message(move |message| handler.on_message(&sid, message));

        let handler = Arc::clone(&self.handler);
        let sid = session_id.clone();
        transport.on_error(move |error| handler.on_error(&sid, error));

        let router = self.weak.clone();
        let handler = Arc::clone(&self.handler);
        transport.on_close(move || {
            if let Some(router) = router.upgrade() {
                router.sessions.remove(&session_id);
                debug!(session_id = %session_id, "session removed");
            }
            handler.on_session_closed(&session_id);
        });

        transport
    }
}

impl std::fmt::Debug for SessionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRouter")
            .field("message_endpoint", &self.message_endpoint)
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use sse_bridge_core::parse_message;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingHandler {
        messages: Mutex<Vec<(SessionId, String)>>,
        errors: AtomicUsize,
        closed: Mutex<Vec<SessionId>>,
    }

    impl SessionHandler for RecordingHandler {
        fn on_message(&self, session_id: &SessionId, message: JsonRpcMessage) {
            let method = message.method().unwrap_or("").to_string();
            self.messages.lock().push((session_id.clone(), method));
        }

        fn on_error(&self, _session_id: &SessionId, _error: &BridgeError) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_session_closed(&self, session_id: &SessionId) {
            self.closed.lock().push(session_id.clone());
        }
    }

    fn router_with_handler() -> (Arc<SessionRouter>, Arc<RecordingHandler>) {
        let handler = Arc::new(RecordingHandler::default());
        let router = SessionRouter::new("/message", handler.clone());
        (router, handler)
    }

    #[tokio::test]
    async fn test_connect_is_get_or_create() {
        let (router, _) = router_with_handler();
        let a = router.connect(SessionId::from("s1"));
        let b = router.connect(SessionId::from("s1"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(router.session_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_connects_build_one_transport() {
        let (router, _) = router_with_handler();
        let mut tasks = Vec::new();
        for _ in 0..16 {
            let router = router.clone();
            tasks.push(tokio::spawn(async move {
                router.connect(SessionId::from("racy"))
            }));
        }

        let mut transports = Vec::new();
        for task in tasks {
            transports.push(task.await.unwrap());
        }
        for t in &transports[1..] {
            assert!(Arc::ptr_eq(&transports[0], t));
        }
        assert_eq!(router.session_count(), 1);
    }

    #[tokio::test]
    async fn test_post_never_creates_a_session() {
        let (router, _) = router_with_handler();
        let err = router
            .route_message(
                &SessionId::from("nope"),
                Some("application/json"),
                r#"{"jsonrpc":"2.0","method":"ping","id":1}"#,
            )
            .unwrap_err();
        assert!(matches!(err, BridgeError::SessionNotFound(_)));
        assert_eq!(router.session_count(), 0);
    }

    #[tokio::test]
    async fn test_messages_reach_the_handler() {
        let (router, handler) = router_with_handler();
        let transport = router.connect(SessionId::from("s1"));
        let _handle = transport.start().unwrap();

        router
            .route_message(
                &SessionId::from("s1"),
                Some("application/json"),
                r#"{"jsonrpc":"2.0","method":"ping","id":1}"#,
            )
            .unwrap();

        let messages = handler.messages.lock();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, SessionId::from("s1"));
        assert_eq!(messages[0].1, "ping");
    }

    #[tokio::test]
    async fn test_send_pushes_down_the_stream() {
        let (router, _) = router_with_handler();
        let transport = router.connect(SessionId::from("s1"));
        let mut handle = transport.start().unwrap();
        handle.recv().await.unwrap(); // handshake

        let message = parse_message(r#"{"jsonrpc":"2.0","id":1,"result":{}}"#).unwrap();
        router.send(&SessionId::from("s1"), &message).unwrap();

        let frame = handle.recv().await.unwrap();
        assert_eq!(frame.data, r#"{"jsonrpc":"2.0","id":1,"result":{}}"#);
    }

    #[tokio::test]
    async fn test_close_removes_and_reconnect_starts_fresh() {
        let (router, handler) = router_with_handler();
        let first = router.connect(SessionId::from("s1"));
        let _handle = first.start().unwrap();

        assert!(router.close_session(&SessionId::from("s1")));
        assert_eq!(router.session_count(), 0);
        assert_eq!(handler.closed.lock().as_slice(), [SessionId::from("s1")]);

        // Same key, fresh transport - the closed one is never revived.
        let second = router.connect(SessionId::from("s1"));
        assert!(!Arc::ptr_eq(&first, &second));
        let _handle = second.start().unwrap();
    }

    #[tokio::test]
    async fn test_close_before_start_frees_the_key() {
        let (router, handler) = router_with_handler();
        // Connected but the stream was never opened.
        let first = router.connect(SessionId::from("s1"));

        assert!(router.close_session(&SessionId::from("s1")));
        assert_eq!(router.session_count(), 0);
        assert_eq!(handler.closed.lock().as_slice(), [SessionId::from("s1")]);

        // The key is free again: a reconnect gets a usable transport.
        let second = router.connect(SessionId::from("s1"));
        assert!(!Arc::ptr_eq(&first, &second));
        let _handle = second.start().unwrap();
    }

    #[tokio::test]
    async fn test_client_cancel_removes_the_session() {
        let (router, handler) = router_with_handler();
        let transport = router.connect(SessionId::from("s1"));
        let handle = transport.start().unwrap();

        drop(handle);

        assert_eq!(router.session_count(), 0);
        assert_eq!(handler.closed.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_errors_reach_the_handler() {
        let (router, handler) = router_with_handler();
        let transport = router.connect(SessionId::from("s1"));
        let _handle = transport.start().unwrap();

        let _ = router.route_message(
            &SessionId::from("s1"),
            Some("application/json"),
            "not json",
        );
        assert_eq!(handler.errors.load(Ordering::SeqCst), 1);
    }
}
