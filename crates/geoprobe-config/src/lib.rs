// crates/geoprobe-config/src/lib.rs
// ============================================================================
// Module: geoprobe Config Library
// Description: Canonical config model and validation for geoprobe tools.
// Purpose: Single source of truth for geoprobe.toml semantics.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! `geoprobe-config` defines the configuration shared by the GeoPackage
//! inspector and the API smoke tester. Every section has built-in defaults
//! matching the stock `amazonas` deployment, so a missing default config file
//! is not an error. Explicitly requested files fail closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
