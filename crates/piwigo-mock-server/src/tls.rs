// crates/piwigo-mock-server/src/tls.rs
// ============================================================================
// Module: TLS Context
// Description: rustls server configuration from PEM certificate material.
// Purpose: Terminate TLS 1.3/1.2 for the mock listener.
// Dependencies: rustls, rustls-pki-types
// ============================================================================

//! ## Overview
//! Builds a rustls [`ServerConfig`] restricted to TLS 1.3 and TLS 1.2 with no
//! client authentication and ALPN `http/1.1`. The aws-lc-rs provider is
//! selected explicitly so no process-wide default provider is required.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rustls::ServerConfig;
use rustls_pki_types::CertificateDer;
use rustls_pki_types::PrivateKeyDer;
use rustls_pki_types::pem::PemObject;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// ALPN protocol identifier advertised by the listener.
pub const ALPN_HTTP_1_1: &[u8] = b"http/1.1";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// TLS context errors.
#[derive(Debug, Error)]
pub enum TlsError {
    /// PEM file could not be read.
    #[error("failed to read {path}: {error}")]
    Io {
        /// Source path.
        path: String,
        /// Underlying error message.
        error: String,
    },
    /// PEM content could not be parsed.
    #[error("invalid pem: {0}")]
    Pem(String),
    /// rustls rejected the configuration.
    #[error("tls context error: {0}")]
    Context(String),
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Builds a server TLS configuration from in-memory PEM material.
///
/// # Errors
///
/// Returns [`TlsError`] when the PEM data is invalid or rustls rejects the
/// certificate and key pair.
pub fn server_config_from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<ServerConfig, TlsError> {
    let certs = CertificateDer::pem_slice_iter(cert_pem)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| TlsError::Pem(err.to_string()))?;
    if certs.is_empty() {
        return Err(TlsError::Pem("no certificate found".to_string()));
    }
    let key = PrivateKeyDer::from_pem_slice(key_pem).map_err(|err| TlsError::Pem(err.to_string()))?;

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])
        .map_err(|err| TlsError::Context(err.to_string()))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|err| TlsError::Context(err.to_string()))?;
    config.alpn_protocols = vec![ALPN_HTTP_1_1.to_vec()];
    Ok(config)
}

/// Loads PEM files written by the provisioner and builds the TLS context.
///
/// # Errors
///
/// Returns [`TlsError`] when either file cannot be read or the material is
/// rejected.
pub fn load_server_config(cert_path: &Path, key_path: &Path) -> Result<ServerConfig, TlsError> {
    let cert_pem = read_file(cert_path)?;
    let key_pem = read_file(key_path)?;
    server_config_from_pem(&cert_pem, &key_pem)
}

/// Reads one PEM file.
fn read_file(path: &Path) -> Result<Vec<u8>, TlsError> {
    fs::read(path).map_err(|err| TlsError::Io {
        path: path.display().to_string(),
        error: err.to_string(),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
