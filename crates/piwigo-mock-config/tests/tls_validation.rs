//! Certificate provisioning config validation tests for piwigo-mock-config.
// crates/piwigo-mock-config/tests/tls_validation.rs
// =============================================================================
// Module: TLS Validation Tests
// Description: Validate certificate path, validity and subject constraints.
// Purpose: Ensure certificate generation inputs are rejected before startup.
// =============================================================================

mod common;

use common::TestResult;
use common::assert_invalid;

#[test]
fn cert_and_key_paths_must_differ() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.tls.key_path = config.tls.cert_path.clone();
    assert_invalid(config.validate(), "tls.cert_path and tls.key_path must differ")
}

#[test]
fn cert_path_must_be_non_empty() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.tls.cert_path = "  ".to_string();
    assert_invalid(config.validate(), "tls.cert_path must be non-empty")
}

#[test]
fn validity_must_be_positive() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.tls.validity_seconds = 0;
    assert_invalid(config.validate(), "tls.validity_seconds must be greater than zero")
}

#[test]
fn validity_must_fit_signed_seconds() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.tls.validity_seconds = u64::MAX;
    assert_invalid(config.validate(), "tls.validity_seconds out of range")
}

#[test]
fn subject_fields_must_be_non_empty() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.tls.subject.organization = String::new();
    assert_invalid(config.validate(), "tls.subject.organization must be non-empty")
}

#[test]
fn subject_fields_are_length_limited() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.tls.subject.common_name = "c".repeat(65);
    assert_invalid(config.validate(), "tls.subject.common_name exceeds 64 bytes")
}
