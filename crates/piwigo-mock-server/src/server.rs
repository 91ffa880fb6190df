// crates/piwigo-mock-server/src/server.rs
// ============================================================================
// Module: Mock Server Listener
// Description: Accept loop, optional TLS termination, and RPC handlers.
// Purpose: Serve Piwigo fixture responses over HTTP/1.1 or HTTPS.
// Dependencies: axum, hyper, hyper-util, tokio, tokio-rustls
// ============================================================================

//! ## Overview
//! [`MockServer::bind`] validates configuration, provisions certificate
//! material when TLS is enabled, and binds the socket. [`BoundServer::serve`]
//! then runs the accept loop. Each connection carries exactly one request
//! (keep-alive is disabled). In sequential mode a connection is served to
//! completion before the next is accepted; in concurrent mode each connection
//! runs on its own task. Handshake and connection failures are logged and
//! never stop the loop.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Extension;
use axum::Router;
use axum::extract::ConnectInfo;
use axum::extract::DefaultBodyLimit;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::header::ALLOW;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::post;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use piwigo_mock_config::ConnectionMode;
use piwigo_mock_config::MockServerConfig;
use piwigo_mock_config::TlsConfig;
use rustls::ServerConfig;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;

use crate::certificate::CertificateError;
use crate::certificate::CertificateRequest;
use crate::certificate::generate_certificate;
use crate::decoder::decode_method;
use crate::decoder::declared_content_length;
use crate::dispatch::Dispatch;
use crate::dispatch::RPC_ENDPOINT;
use crate::dispatch::dispatch;
use crate::logging::LifecycleKind;
use crate::logging::LifecycleLogEvent;
use crate::logging::MockLogSink;
use crate::logging::RequestLogEvent;
use crate::logging::RequestLogEventParams;
use crate::logging::RequestOutcome;
use crate::logging::log_sink_from_config;
use crate::tls::load_server_config;

// ============================================================================
// SECTION: Mock Server
// ============================================================================

/// Configured, not yet bound, mock server.
pub struct MockServer {
    /// Validated server configuration.
    config: MockServerConfig,
    /// Event sink shared with every connection.
    log_sink: Arc<dyn MockLogSink>,
}

impl MockServer {
    /// Builds a mock server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MockServerError`] when validation fails or the configured
    /// log sink cannot be opened.
    pub fn from_config(config: MockServerConfig) -> Result<Self, MockServerError> {
        config.validate().map_err(|err| MockServerError::Config(err.to_string()))?;
        let log_sink = log_sink_from_config(&config.logging)
            .map_err(|err| MockServerError::Init(err.to_string()))?;
        Ok(Self {
            config,
            log_sink,
        })
    }

    /// Replaces the configured log sink.
    #[must_use]
    pub fn with_log_sink(mut self, log_sink: Arc<dyn MockLogSink>) -> Self {
        self.log_sink = log_sink;
        self
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &MockServerConfig {
        &self.config
    }

    /// Provisions TLS material (when enabled) and binds the listener.
    ///
    /// # Errors
    ///
    /// Returns [`MockServerError`] when certificate generation, PEM writes,
    /// TLS context construction, or socket binding fails.
    pub async fn bind(self) -> Result<BoundServer, MockServerError> {
        let addr = self
            .config
            .server
            .socket_addr()
            .map_err(|err| MockServerError::Config(err.to_string()))?;

        let acceptor = if self.config.server.tls {
            let tls_config = self.config.tls.clone();
            let log_sink = Arc::clone(&self.log_sink);
            let server_config =
                tokio::task::spawn_blocking(move || provision_tls(&tls_config, log_sink.as_ref()))
                    .await
                    .map_err(|err| MockServerError::Init(err.to_string()))??;
            Some(TlsAcceptor::from(Arc::new(server_config)))
        } else {
            None
        };

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| MockServerError::Transport(format!("bind {addr} failed: {err}")))?;
        let local_addr =
            listener.local_addr().map_err(|err| MockServerError::Transport(err.to_string()))?;
        let mode = self.config.server.connection_mode;
        let scheme = if acceptor.is_some() { "https" } else { "http" };
        self.log_sink.record_lifecycle(&LifecycleLogEvent::new(
            LifecycleKind::Listening,
            format!("serving {scheme} in {} mode", mode.as_str()),
            Some(local_addr.to_string()),
        ));

        let state = Arc::new(ServerState {
            response_delay: Duration::from_millis(self.config.server.response_delay_ms),
            max_body_bytes: self.config.server.max_body_bytes,
            log_sink: Arc::clone(&self.log_sink),
        });
        Ok(BoundServer {
            listener,
            local_addr,
            acceptor,
            router: build_router(state),
            mode,
            log_sink: self.log_sink,
        })
    }

    /// Binds and serves until the process is terminated.
    ///
    /// # Errors
    ///
    /// Returns [`MockServerError`] when startup fails.
    pub async fn serve(self) -> Result<(), MockServerError> {
        self.bind().await?.serve().await
    }
}

// ============================================================================
// SECTION: Bound Server
// ============================================================================

/// Listener bound to its socket and ready to accept connections.
pub struct BoundServer {
    /// Bound TCP listener.
    listener: TcpListener,
    /// Actual bound address (resolves port 0).
    local_addr: SocketAddr,
    /// TLS acceptor when TLS is enabled.
    acceptor: Option<TlsAcceptor>,
    /// Request router shared by all connections.
    router: Router,
    /// Connection scheduling mode.
    mode: ConnectionMode,
    /// Event sink for lifecycle events.
    log_sink: Arc<dyn MockLogSink>,
}

impl BoundServer {
    /// Returns the bound socket address.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns true when connections are TLS-terminated.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        self.acceptor.is_some()
    }

    /// Runs the accept loop.
    ///
    /// # Errors
    ///
    /// The loop only ends with the process; per-connection failures are
    /// logged instead of returned.
    pub async fn serve(self) -> Result<(), MockServerError> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    self.log_sink.record_lifecycle(&LifecycleLogEvent::new(
                        LifecycleKind::ConnectionFailed,
                        format!("accept failed: {err}"),
                        None,
                    ));
                    continue;
                }
            };
            let connection = serve_connection(
                stream,
                peer,
                self.acceptor.clone(),
                self.router.clone(),
                Arc::clone(&self.log_sink),
            );
            match self.mode {
                ConnectionMode::Sequential => connection.await,
                ConnectionMode::Concurrent => {
                    tokio::spawn(connection);
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Connections
// ============================================================================

/// Serves a single connection: optional handshake, then one HTTP/1.1 request.
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    acceptor: Option<TlsAcceptor>,
    router: Router,
    log_sink: Arc<dyn MockLogSink>,
) {
    let service = TowerToHyperService::new(router.layer(Extension(ConnectInfo(peer))));
    let result = match acceptor {
        Some(acceptor) => match acceptor.accept(stream).await {
            Ok(tls_stream) => serve_http1(TokioIo::new(tls_stream), service).await,
            Err(err) => {
                log_sink.record_lifecycle(&LifecycleLogEvent::new(
                    LifecycleKind::ConnectionFailed,
                    format!("tls handshake failed: {err}"),
                    Some(peer.to_string()),
                ));
                return;
            }
        },
        None => serve_http1(TokioIo::new(stream), service).await,
    };
    if let Err(err) = result {
        log_sink.record_lifecycle(&LifecycleLogEvent::new(
            LifecycleKind::ConnectionFailed,
            format!("http connection failed: {err}"),
            Some(peer.to_string()),
        ));
    }
}

/// Drives hyper's HTTP/1.1 connection with keep-alive disabled.
async fn serve_http1<I>(io: I, service: TowerToHyperService<Router>) -> Result<(), hyper::Error>
where
    I: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    http1::Builder::new().keep_alive(false).serve_connection(io, service).await
}

/// Generates, persists, and reloads certificate material.
fn provision_tls(
    config: &TlsConfig,
    log_sink: &dyn MockLogSink,
) -> Result<ServerConfig, MockServerError> {
    let material = generate_certificate(&CertificateRequest::from_config(config))?;
    let cert_path = Path::new(&config.cert_path);
    let key_path = Path::new(&config.key_path);
    material.write_pem_files(cert_path, key_path)?;
    log_sink.record_lifecycle(&LifecycleLogEvent::new(
        LifecycleKind::CertificateWritten,
        format!("wrote {} and {}", config.cert_path, config.key_path),
        None,
    ));
    load_server_config(cert_path, key_path).map_err(|err| MockServerError::Tls(err.to_string()))
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Shared state for RPC handlers.
struct ServerState {
    /// Artificial delay applied before dispatching decoded requests.
    response_delay: Duration,
    /// Maximum accepted request body size.
    max_body_bytes: usize,
    /// Request event sink.
    log_sink: Arc<dyn MockLogSink>,
}

/// Builds the request router.
fn build_router(state: Arc<ServerState>) -> Router {
    let max_body_bytes = state.max_body_bytes;
    Router::new()
        .route(RPC_ENDPOINT, post(handle_rpc).fallback(handle_method_not_allowed))
        .fallback(handle_not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Handles `POST /ws.php`.
async fn handle_rpc(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    let path = request.uri().path().to_string();
    let content_type = header_string(request.headers());
    let request_bytes = declared_content_length(request.headers());

    let (decision, method, error_kind) = match decode_method(request, state.max_body_bytes).await {
        Ok(method_name) => {
            tokio::time::sleep(state.response_delay).await;
            (Some(dispatch(&path, &method_name)), Some(method_name), None)
        }
        Err(err) => (None, None, Some(err.kind())),
    };

    let (status, outcome, response_bytes) = match decision {
        Some(decision) => (
            decision.status(),
            outcome_for(decision),
            decision.body().map_or(0, |body| body.len()),
        ),
        None => (StatusCode::INTERNAL_SERVER_ERROR, RequestOutcome::DecodeFailed, 0),
    };
    state.log_sink.record_request(&RequestLogEvent::new(RequestLogEventParams {
        peer_ip: Some(peer.ip().to_string()),
        path,
        content_type,
        method,
        status: status.as_u16(),
        outcome,
        error_kind,
        request_bytes,
        response_bytes,
    }));

    match decision {
        Some(decision) => decision.into_response(),
        None => status.into_response(),
    }
}

/// Handles every path other than the RPC endpoint.
///
/// POST bodies are decoded like RPC calls; a decoded method gets the same
/// response delay before the 404.
async fn handle_not_found(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    let decision = Dispatch::NotFound;
    let path = request.uri().path().to_string();
    let content_type = header_string(request.headers());
    let request_bytes = declared_content_length(request.headers());

    let method = if request.method() == Method::POST {
        decode_method(request, state.max_body_bytes).await.ok()
    } else {
        None
    };
    if method.is_some() {
        tokio::time::sleep(state.response_delay).await;
    }

    state.log_sink.record_request(&RequestLogEvent::new(RequestLogEventParams {
        peer_ip: Some(peer.ip().to_string()),
        path,
        content_type,
        method,
        status: decision.status().as_u16(),
        outcome: RequestOutcome::NotFound,
        error_kind: None,
        request_bytes,
        response_bytes: 0,
    }));
    decision.into_response()
}

/// Handles non-POST requests to the RPC endpoint.
async fn handle_method_not_allowed(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    let status = StatusCode::METHOD_NOT_ALLOWED;
    state.log_sink.record_request(&RequestLogEvent::new(RequestLogEventParams {
        peer_ip: Some(peer.ip().to_string()),
        path: request.uri().path().to_string(),
        content_type: header_string(request.headers()),
        method: None,
        status: status.as_u16(),
        outcome: RequestOutcome::MethodNotAllowed,
        error_kind: None,
        request_bytes: declared_content_length(request.headers()),
        response_bytes: 0,
    }));
    (status, [(ALLOW, "POST")]).into_response()
}

/// Maps a dispatch decision to its log outcome.
const fn outcome_for(decision: Dispatch) -> RequestOutcome {
    match decision {
        Dispatch::Fixture(_) => RequestOutcome::Ok,
        Dispatch::UnknownMethod => RequestOutcome::UnknownMethod,
        Dispatch::NotFound => RequestOutcome::NotFound,
    }
}

/// Returns the `Content-Type` header as a string when printable.
fn header_string(headers: &HeaderMap) -> Option<String> {
    headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok()).map(ToString::to_string)
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Mock server errors.
#[derive(Debug, Error)]
pub enum MockServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Certificate provisioning errors.
    #[error("certificate error: {0}")]
    Certificate(#[from] CertificateError),
    /// TLS context errors.
    #[error("tls error: {0}")]
    Tls(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
