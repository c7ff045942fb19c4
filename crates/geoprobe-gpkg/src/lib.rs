// crates/geoprobe-gpkg/src/lib.rs
// ============================================================================
// Module: geoprobe GeoPackage Library
// Description: Read-only inspection of OGC GeoPackage containers.
// Purpose: Report layers, fields, spatial references, extents, and samples.
// Dependencies: rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! A GeoPackage is an `SQLite` database with a fixed set of metadata tables.
//! This crate opens one read-only and answers the questions an operator asks
//! before publishing it through an OGC API: which vector layers exist, how
//! many features each holds, what geometry type and spatial reference they
//! use, where their data lies, which attribute fields they carry, and what a
//! record looks like.
//! Invariants:
//! - Containers are never modified; connections are opened read-only.
//! - Geometry blobs are untrusted; malformed blobs are skipped, never panic.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod geometry;
pub mod report;
pub mod schema;
pub mod source;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use geometry::Envelope;
pub use geometry::GeometryError;
pub use geometry::GeometryHeader;
pub use report::AccessReport;
pub use report::FieldDef;
pub use report::FieldValue;
pub use report::GeoPackageReport;
pub use report::LayerReport;
pub use report::SampleFeature;
pub use report::SpatialRef;
pub use schema::FieldType;
pub use schema::GeometryKind;
pub use schema::GeometryTypeName;
pub use source::DataType;
pub use source::GeoPackage;
pub use source::GeometryColumn;
pub use source::GpkgError;
pub use source::GpkgOptions;
pub use source::LayerInfo;
