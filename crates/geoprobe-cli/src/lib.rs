// crates/geoprobe-cli/src/lib.rs
// ============================================================================
// Module: geoprobe CLI Library
// Description: Localization and rendering shared by the geoprobe binary.
// Purpose: Expose testable presentation helpers outside the entry point.
// Dependencies: geoprobe-gpkg, geoprobe-smoke, serde_json
// ============================================================================

//! ## Overview
//! The `geoprobe` binary dispatches commands; this library holds the message
//! catalog ([`i18n`]) and the text renderers ([`render`]) it prints with.

pub mod i18n;
pub mod render;
