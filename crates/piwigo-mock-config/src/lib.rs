// crates/piwigo-mock-config/src/lib.rs
// ============================================================================
// Module: Piwigo Mock Config Library
// Description: Canonical config model and validation for the mock server.
// Purpose: Single source of truth for piwigo-mock.toml semantics.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! `piwigo-mock-config` defines the configuration model shared by the mock
//! server and its CLI. It provides strict, fail-closed validation so that a
//! bad config never reaches the listener.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
