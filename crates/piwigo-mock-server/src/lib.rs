// crates/piwigo-mock-server/src/lib.rs
// ============================================================================
// Module: Piwigo Mock Server
// Description: Mock Piwigo web-service endpoint with optional TLS.
// Purpose: Serve canned Piwigo RPC responses for client integration tests.
// Dependencies: piwigo-mock-config, axum, hyper, rcgen, rustls, tokio
// ============================================================================

//! ## Overview
//! The mock server answers `POST /ws.php` with fixed XML fixtures keyed by the
//! form `method` field, mimicking a small subset of the Piwigo web-service
//! protocol. It can terminate TLS with a self-signed certificate generated at
//! startup. Requests are independent; no state survives between them.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod certificate;
pub mod decoder;
pub mod dispatch;
pub mod logging;
pub mod server;
pub mod tls;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use certificate::CertificateError;
pub use certificate::CertificateMaterial;
pub use certificate::CertificateRequest;
pub use certificate::CertificateSubject;
pub use certificate::generate_certificate;
pub use decoder::DecodeError;
pub use decoder::decode_method;
pub use dispatch::Dispatch;
pub use dispatch::PiwigoMethod;
pub use dispatch::dispatch;
pub use logging::FileLogSink;
pub use logging::LifecycleLogEvent;
pub use logging::MockLogSink;
pub use logging::NoopLogSink;
pub use logging::RequestLogEvent;
pub use logging::StderrLogSink;
pub use server::BoundServer;
pub use server::MockServer;
pub use server::MockServerError;
pub use tls::TlsError;
