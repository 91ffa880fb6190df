// crates/piwigo-mock-server/src/logging.rs
// ============================================================================
// Module: Mock Server Logging
// Description: Structured request and lifecycle events for the mock server.
// Purpose: Emit JSON-lines logs to stderr, a file, or nowhere.
// Dependencies: piwigo-mock-config, serde, serde_json
// ============================================================================

//! ## Overview
//! Every handled request produces one [`RequestLogEvent`]; startup and
//! connection-level failures produce [`LifecycleLogEvent`]s. Events are
//! serialized as single JSON lines and routed through a [`MockLogSink`].
//! Sink write failures are ignored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use piwigo_mock_config::LogSinkKind;
use piwigo_mock_config::LoggingConfig;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Classification of a handled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Fixture response returned.
    Ok,
    /// Path other than the RPC endpoint.
    NotFound,
    /// Decoded method not in the fixture table.
    UnknownMethod,
    /// Body could not be decoded into a method name.
    DecodeFailed,
    /// Non-POST request to the RPC endpoint.
    MethodNotAllowed,
}

/// Per-request log payload.
#[derive(Debug, Clone, Serialize)]
pub struct RequestLogEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// Request path.
    pub path: String,
    /// Raw `Content-Type` header when present.
    pub content_type: Option<String>,
    /// Decoded RPC method name.
    pub method: Option<String>,
    /// HTTP status code returned.
    pub status: u16,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Declared request body size in bytes.
    pub request_bytes: Option<u64>,
    /// Response body size in bytes.
    pub response_bytes: usize,
}

/// Inputs required to construct a request event.
pub struct RequestLogEventParams {
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// Request path.
    pub path: String,
    /// Raw `Content-Type` header when present.
    pub content_type: Option<String>,
    /// Decoded RPC method name.
    pub method: Option<String>,
    /// HTTP status code returned.
    pub status: u16,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Declared request body size in bytes.
    pub request_bytes: Option<u64>,
    /// Response body size in bytes.
    pub response_bytes: usize,
}

impl RequestLogEvent {
    /// Builds a request event stamped with the current time.
    #[must_use]
    pub fn new(params: RequestLogEventParams) -> Self {
        Self {
            event: "rpc_request",
            timestamp_ms: now_millis(),
            peer_ip: params.peer_ip,
            path: params.path,
            content_type: params.content_type,
            method: params.method,
            status: params.status,
            outcome: params.outcome,
            error_kind: params.error_kind,
            request_bytes: params.request_bytes,
            response_bytes: params.response_bytes,
        }
    }
}

/// Server lifecycle event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleKind {
    /// Listener bound and accepting.
    Listening,
    /// Certificate material written to disk.
    CertificateWritten,
    /// Accept, handshake, or HTTP connection failure.
    ConnectionFailed,
}

/// Server lifecycle log payload.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleLogEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Lifecycle event kind.
    pub kind: LifecycleKind,
    /// Human-readable detail.
    pub message: String,
    /// Peer or listener address when relevant.
    pub address: Option<String>,
}

impl LifecycleLogEvent {
    /// Builds a lifecycle event stamped with the current time.
    #[must_use]
    pub fn new(kind: LifecycleKind, message: impl Into<String>, address: Option<String>) -> Self {
        Self {
            event: "server_lifecycle",
            timestamp_ms: now_millis(),
            kind,
            message: message.into(),
            address,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Log sink for mock server events.
pub trait MockLogSink: Send + Sync {
    /// Records a request event.
    fn record_request(&self, event: &RequestLogEvent);

    /// Records a lifecycle event.
    fn record_lifecycle(&self, _event: &LifecycleLogEvent) {}
}

/// Sink that writes JSON lines to stderr.
pub struct StderrLogSink;

impl MockLogSink for StderrLogSink {
    fn record_request(&self, event: &RequestLogEvent) {
        write_json_line(&mut io::stderr(), event);
    }

    fn record_lifecycle(&self, event: &LifecycleLogEvent) {
        write_json_line(&mut io::stderr(), event);
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileLogSink {
    /// Append-mode log file.
    file: Mutex<File>,
}

impl FileLogSink {
    /// Opens (or creates) the log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized event.
    fn append<T: Serialize>(&self, event: &T) {
        if let Ok(mut file) = self.file.lock() {
            write_json_line(&mut *file, event);
            let _ = file.flush();
        }
    }
}

impl MockLogSink for FileLogSink {
    fn record_request(&self, event: &RequestLogEvent) {
        self.append(event);
    }

    fn record_lifecycle(&self, event: &LifecycleLogEvent) {
        self.append(event);
    }
}

/// Sink that drops every event.
pub struct NoopLogSink;

impl MockLogSink for NoopLogSink {
    fn record_request(&self, _event: &RequestLogEvent) {}
}

/// Builds the sink selected by the logging configuration.
///
/// # Errors
///
/// Returns an error when the file sink cannot open its path.
pub fn log_sink_from_config(config: &LoggingConfig) -> io::Result<Arc<dyn MockLogSink>> {
    match config.sink {
        LogSinkKind::Stderr => Ok(Arc::new(StderrLogSink)),
        LogSinkKind::None => Ok(Arc::new(NoopLogSink)),
        LogSinkKind::File => {
            let path = config.path.as_deref().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "logging.path is required")
            })?;
            Ok(Arc::new(FileLogSink::new(Path::new(path))?))
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns milliseconds since the Unix epoch.
fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

/// Writes `event` as a single JSON line, ignoring failures.
fn write_json_line<W: Write, T: Serialize>(writer: &mut W, event: &T) {
    if let Ok(payload) = serde_json::to_string(event) {
        let _ = writeln!(writer, "{payload}");
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
