// crates/geoprobe-smoke/src/lib.rs
// ============================================================================
// Module: geoprobe Smoke Library
// Description: Smoke tests for OGC API - Features servers such as pygeoapi.
// Purpose: Confirm a freshly deployed server answers its core endpoints.
// Dependencies: geoprobe-config, reqwest, serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`SmokeClient::preflight`] confirms the server is reachable, then
//! [`SmokeSuite::run`] walks a fixed plan of GET requests and returns a
//! [`SuiteReport`]. A failing check is data, not an error: only an
//! unreachable server aborts the run.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod report;
pub mod suite;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::HttpReply;
pub use client::SmokeClient;
pub use client::SmokeError;
pub use client::SmokeSettings;
pub use report::CheckDetail;
pub use report::CheckId;
pub use report::CheckKind;
pub use report::CheckReport;
pub use report::SuiteReport;
pub use suite::PlannedCheck;
pub use suite::SmokeSuite;
pub use suite::limit_respected;
pub use suite::plan;
pub use suite::returned_count;
pub use suite::top_keys;
