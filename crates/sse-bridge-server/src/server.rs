//! The bridge server: configuration, axum router assembly, and the run
//! loop.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use crate::router::{SessionHandler, SessionRouter};
use crate::routes::{self, ServerState};

/// Configuration for the bridge server.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Port to listen on.
    pub port: u16,
    /// Host address to bind to.
    pub host: String,
    /// Path of the stream-open endpoint.
    pub sse_path: String,
    /// Path of the message intake endpoint, advertised in handshakes.
    pub message_path: String,
    /// Path of the server-side push endpoint.
    pub send_path: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: 8787,
            host: "127.0.0.1".to_string(),
            sse_path: "/sse".to_string(),
            message_path: "/message".to_string(),
            send_path: "/send".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the port number.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the message intake path.
    pub fn message_path(mut self, path: impl Into<String>) -> Self {
        self.message_path = path.into();
        self
    }
}

/// The bridge server tying the session router to its HTTP surface.
pub struct BridgeServer {
    config: BridgeConfig,
    router: Arc<SessionRouter>,
}

impl BridgeServer {
    /// Creates a new bridge server dispatching messages to `handler`.
    pub fn new(config: BridgeConfig, handler: Arc<dyn SessionHandler>) -> Self {
        let router = SessionRouter::new(config.message_path.clone(), handler);
        Self { config, router }
    }

    /// The session router, for server-side pushes and administration.
    pub fn session_router(&self) -> &Arc<SessionRouter> {
        &self.router
    }

    /// The server configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Builds the axum router with all bridge routes.
    pub fn router(&self) -> Router {
        let state = ServerState {
            router: self.router.clone(),
        };

        Router::new()
            .route(&self.config.sse_path, get(routes::sse_handler))
            .route(&self.config.message_path, post(routes::message_handler))
            .route(&self.config.send_path, post(routes::send_handler))
            .route("/health", get(routes::health))
            .with_state(state)
    }

    /// Runs the bridge server.
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let app = self.router();
        info!(%addr, "sse-bridge listening");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await
    }

    /// Returns the address the server will listen on.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }
}
