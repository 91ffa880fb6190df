// crates/piwigo-mock-config/src/config.rs
// ============================================================================
// Module: Piwigo Mock Configuration
// Description: Configuration loading and validation for the mock server.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml, thiserror
// ============================================================================

//! ## Overview
//! Configuration is loaded from an optional TOML file with strict size and
//! path limits. Every section has defaults, so an absent file yields the
//! canonical loopback server on port 8080 without TLS. Invalid configuration
//! fails closed before any socket is bound or certificate is written.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::IpAddr;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename looked up in the working directory.
pub const DEFAULT_CONFIG_NAME: &str = "piwigo-mock.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "PIWIGO_MOCK_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default TCP port for the listener.
pub const DEFAULT_PORT: u16 = 8080;
/// Default artificial response delay in milliseconds.
pub const DEFAULT_RESPONSE_DELAY_MS: u64 = 1_000;
/// Upper bound for the artificial response delay.
pub(crate) const MAX_RESPONSE_DELAY_MS: u64 = 60_000;
/// Default request body limit; sized for `pwg.images.addSimple` uploads.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;
/// Upper bound for the request body limit.
pub(crate) const MAX_BODY_BYTES_LIMIT: usize = 1024 * 1024 * 1024;
/// Default certificate validity: ten years.
pub const DEFAULT_VALIDITY_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;
/// Maximum length of a certificate subject field (X.520 upper bound).
pub(crate) const MAX_SUBJECT_FIELD_LENGTH: usize = 64;

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Top-level mock server configuration.
///
/// # Invariants
/// - `validate()` must succeed before the config is handed to a server.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MockServerConfig {
    /// Listener configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Self-signed certificate provisioning configuration.
    #[serde(default)]
    pub tls: TlsConfig,
    /// Structured log sink configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MockServerConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// Resolution order: explicit `path`, then [`CONFIG_ENV_VAR`], then
    /// [`DEFAULT_CONFIG_NAME`] in the working directory when it exists, and
    /// finally built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(resolved) = resolve_path(path)? else {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        };
        Self::load_file(&resolved)
    }

    /// Loads and validates a specific configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed or validated.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.tls.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Connection scheduling mode for the accept loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    /// Serve each connection to completion before accepting the next.
    #[default]
    Sequential,
    /// Serve each connection on its own task.
    Concurrent,
}

impl ConnectionMode {
    /// Returns the configuration label for this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Concurrent => "concurrent",
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind host (IP address literal).
    #[serde(default = "default_bind")]
    pub bind: String,
    /// TCP port; `0` selects an ephemeral port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Terminate TLS with a freshly generated self-signed certificate.
    #[serde(default)]
    pub tls: bool,
    /// Permit binding to non-loopback addresses.
    #[serde(default)]
    pub allow_non_loopback: bool,
    /// Artificial delay applied before answering `/ws.php` calls.
    #[serde(default = "default_response_delay_ms")]
    pub response_delay_ms: u64,
    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Accept loop scheduling mode.
    #[serde(default)]
    pub connection_mode: ConnectionMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: DEFAULT_PORT,
            tls: false,
            allow_non_loopback: false,
            response_delay_ms: DEFAULT_RESPONSE_DELAY_MS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            connection_mode: ConnectionMode::Sequential,
        }
    }
}

impl ServerConfig {
    /// Resolves the configured bind host and port into a socket address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the bind host is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid bind address: {}", self.bind)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Validates listener configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let addr = self.socket_addr()?;
        if !addr.ip().is_loopback() && !self.allow_non_loopback {
            return Err(ConfigError::Invalid(
                "non-loopback bind requires server.allow_non_loopback".to_string(),
            ));
        }
        if self.response_delay_ms > MAX_RESPONSE_DELAY_MS {
            return Err(ConfigError::Invalid(format!(
                "response_delay_ms must be at most {MAX_RESPONSE_DELAY_MS}"
            )));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_body_bytes must be at most {MAX_BODY_BYTES_LIMIT}"
            )));
        }
        Ok(())
    }
}

/// Self-signed certificate provisioning configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TlsConfig {
    /// Output path for the PEM certificate.
    #[serde(default = "default_cert_path")]
    pub cert_path: String,
    /// Output path for the PEM private key.
    #[serde(default = "default_key_path")]
    pub key_path: String,
    /// Certificate validity window in seconds.
    #[serde(default = "default_validity_seconds")]
    pub validity_seconds: u64,
    /// Certificate serial number.
    #[serde(default)]
    pub serial_number: u64,
    /// Distinguished name fields for subject and issuer.
    #[serde(default)]
    pub subject: CertificateSubjectConfig,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: default_cert_path(),
            key_path: default_key_path(),
            validity_seconds: DEFAULT_VALIDITY_SECONDS,
            serial_number: 0,
            subject: CertificateSubjectConfig::default(),
        }
    }
}

impl TlsConfig {
    /// Validates certificate output paths and subject fields.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("tls.cert_path", &self.cert_path)?;
        validate_path_string("tls.key_path", &self.key_path)?;
        if self.cert_path.trim() == self.key_path.trim() {
            return Err(ConfigError::Invalid(
                "tls.cert_path and tls.key_path must differ".to_string(),
            ));
        }
        if self.validity_seconds == 0 {
            return Err(ConfigError::Invalid(
                "tls.validity_seconds must be greater than zero".to_string(),
            ));
        }
        if i64::try_from(self.validity_seconds).is_err() {
            return Err(ConfigError::Invalid("tls.validity_seconds out of range".to_string()));
        }
        self.subject.validate()
    }
}

/// Distinguished name fields for the generated certificate.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CertificateSubjectConfig {
    /// Country name.
    #[serde(default = "default_subject_country")]
    pub country: String,
    /// Locality name.
    #[serde(default = "default_subject_locality")]
    pub locality: String,
    /// Organization name.
    #[serde(default = "default_subject_organization")]
    pub organization: String,
    /// Common name.
    #[serde(default = "default_subject_common_name")]
    pub common_name: String,
    /// Contact email address.
    #[serde(default = "default_subject_email")]
    pub email: String,
}

impl Default for CertificateSubjectConfig {
    fn default() -> Self {
        Self {
            country: default_subject_country(),
            locality: default_subject_locality(),
            organization: default_subject_organization(),
            common_name: default_subject_common_name(),
            email: default_subject_email(),
        }
    }
}

impl CertificateSubjectConfig {
    /// Validates subject field lengths.
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("tls.subject.country", &self.country),
            ("tls.subject.locality", &self.locality),
            ("tls.subject.organization", &self.organization),
            ("tls.subject.common_name", &self.common_name),
            ("tls.subject.email", &self.email),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
            }
            if value.len() > MAX_SUBJECT_FIELD_LENGTH {
                return Err(ConfigError::Invalid(format!(
                    "{field} exceeds {MAX_SUBJECT_FIELD_LENGTH} bytes"
                )));
            }
        }
        Ok(())
    }
}

/// Structured log destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to `logging.path`.
    File,
    /// Discard all events.
    None,
}

/// Structured logging configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Selected sink.
    #[serde(default)]
    pub sink: LogSinkKind,
    /// Log file path for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl LoggingConfig {
    /// Validates sink and path consistency.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, self.path.as_deref()) {
            (LogSinkKind::File, None) => {
                Err(ConfigError::Invalid("logging.path is required for the file sink".to_string()))
            }
            (_, Some(path)) => validate_path_string("logging.path", path),
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default bind host.
fn default_bind() -> String {
    "127.0.0.1".to_string()
}

/// Default listener port.
const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Default response delay.
const fn default_response_delay_ms() -> u64 {
    DEFAULT_RESPONSE_DELAY_MS
}

/// Default request body limit.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default certificate output path.
fn default_cert_path() -> String {
    "cert.pem".to_string()
}

/// Default private key output path.
fn default_key_path() -> String {
    "key.pem".to_string()
}

/// Default certificate validity.
const fn default_validity_seconds() -> u64 {
    DEFAULT_VALIDITY_SECONDS
}

/// Default subject country.
fn default_subject_country() -> String {
    "NT".to_string()
}

/// Default subject locality.
fn default_subject_locality() -> String {
    "Localhost".to_string()
}

/// Default subject organization.
fn default_subject_organization() -> String {
    "Piwigo Mock".to_string()
}

/// Default subject common name.
fn default_subject_common_name() -> String {
    "localhost".to_string()
}

/// Default subject email address.
fn default_subject_email() -> String {
    "mock@localhost".to_string()
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI, environment, or the working directory.
fn resolve_path(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let fallback = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(fallback.is_file().then_some(fallback))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
