//! Server and logging section validation tests for piwigo-mock-config.
// crates/piwigo-mock-config/tests/server_validation.rs
// =============================================================================
// Module: Server Validation Tests
// Description: Validate listener, delay, body limit and logging invariants.
// Purpose: Ensure unsafe or inconsistent listener settings fail closed.
// =============================================================================

use piwigo_mock_config::ConnectionMode;
use piwigo_mock_config::LogSinkKind;
use piwigo_mock_config::MockServerConfig;

mod common;

use common::TestResult;
use common::assert_invalid;

#[test]
fn minimal_config_is_valid() -> TestResult {
    let config = common::minimal_config().map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    if config.server.connection_mode != ConnectionMode::Sequential {
        return Err("default connection mode should be sequential".to_string());
    }
    if config.logging.sink != LogSinkKind::Stderr {
        return Err("default log sink should be stderr".to_string());
    }
    Ok(())
}

#[test]
fn non_loopback_bind_requires_opt_in() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.bind = "0.0.0.0".to_string();
    assert_invalid(config.validate(), "non-loopback bind requires server.allow_non_loopback")?;
    config.server.allow_non_loopback = true;
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn response_delay_is_bounded() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.response_delay_ms = 60_001;
    assert_invalid(config.validate(), "response_delay_ms must be at most 60000")?;
    config.server.response_delay_ms = 0;
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn max_body_bytes_must_be_positive() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.max_body_bytes = 0;
    assert_invalid(config.validate(), "max_body_bytes must be greater than zero")
}

#[test]
fn max_body_bytes_is_bounded() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.max_body_bytes = 1024 * 1024 * 1024 + 1;
    assert_invalid(config.validate(), "max_body_bytes must be at most")
}

#[test]
fn file_sink_requires_path() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.logging.sink = LogSinkKind::File;
    assert_invalid(config.validate(), "logging.path is required for the file sink")?;
    config.logging.path = Some("requests.jsonl".to_string());
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn toml_sections_parse_into_config() -> TestResult {
    let config = MockServerConfig::from_toml_str(
        r#"
[server]
port = 9443
tls = true
response_delay_ms = 250
connection_mode = "concurrent"

[tls]
cert_path = "out/cert.pem"
key_path = "out/key.pem"
serial_number = 42

[tls.subject]
common_name = "gallery.test"

[logging]
sink = "none"
"#,
    )
    .map_err(|err| err.to_string())?;
    if config.server.port != 9443 || !config.server.tls {
        return Err("server section not applied".to_string());
    }
    if config.server.connection_mode != ConnectionMode::Concurrent {
        return Err("connection mode not applied".to_string());
    }
    if config.tls.serial_number != 42 || config.tls.subject.common_name != "gallery.test" {
        return Err("tls section not applied".to_string());
    }
    if config.tls.subject.country != "NT" {
        return Err("unset subject fields should keep defaults".to_string());
    }
    if config.logging.sink != LogSinkKind::None {
        return Err("logging section not applied".to_string());
    }
    Ok(())
}

#[test]
fn unknown_fields_are_rejected() -> TestResult {
    assert_invalid(
        MockServerConfig::from_toml_str("[server]\nprot = 8080\n"),
        "config parse error",
    )
}
