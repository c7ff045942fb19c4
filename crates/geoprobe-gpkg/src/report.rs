// crates/geoprobe-gpkg/src/report.rs
// ============================================================================
// Module: GeoPackage Inspection Reports
// Description: Serializable results of inspecting a GeoPackage.
// Purpose: Decouple container reads from presentation.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Reports are plain data: the CLI renders them as localized text or JSON.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

use crate::geometry::Envelope;
use crate::schema::FieldType;
use crate::source::DataType;

// ============================================================================
// SECTION: Spatial Reference
// ============================================================================

/// Row of `gpkg_spatial_ref_sys` referenced by a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpatialRef {
    /// GeoPackage SRS identifier.
    pub srs_id: i32,
    /// Human readable SRS name.
    pub name: String,
    /// Defining organization (for example `EPSG`).
    pub organization: String,
    /// Identifier assigned by the organization.
    pub code: i64,
}

impl SpatialRef {
    /// Returns `ORGANIZATION:CODE` when the SRS has a real authority.
    #[must_use]
    pub fn authority(&self) -> Option<String> {
        let organization = self.organization.trim();
        if organization.is_empty() || organization.eq_ignore_ascii_case("none") || self.code <= 0 {
            return None;
        }
        Some(format!("{}:{}", organization.to_ascii_uppercase(), self.code))
    }
}

// ============================================================================
// SECTION: Fields and Values
// ============================================================================

/// Attribute field declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    /// Column name.
    pub name: String,
    /// OGR-style field type.
    pub field_type: FieldType,
    /// Declared width (0 when unbounded).
    pub width: u32,
    /// Raw `SQLite` declared type.
    pub declared_type: String,
}

/// A single attribute value read from a feature row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// SQL `NULL`.
    Null,
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Real(f64),
    /// Text value.
    Text(String),
    /// Binary value, reported by size only.
    Blob {
        /// Blob length in bytes.
        bytes: usize,
    },
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Real(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
            Self::Blob {
                bytes,
            } => write!(f, "<{bytes} bytes>"),
        }
    }
}

/// First feature of a layer with its attribute values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleFeature {
    /// Feature identifier.
    pub fid: i64,
    /// Attribute values in field order.
    pub values: Vec<(String, FieldValue)>,
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Metadata for one vector layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerReport {
    /// 1-based position in the layer listing.
    pub index: usize,
    /// Table name.
    pub name: String,
    /// Content type (`features` or `attributes`).
    pub data_type: DataType,
    /// Number of rows in the layer table.
    pub feature_count: u64,
    /// OGR-style geometry type (`None` for attribute tables).
    pub geometry_type: String,
    /// Geometry column name, if any.
    pub geometry_column: Option<String>,
    /// Spatial reference, if defined.
    pub spatial_ref: Option<SpatialRef>,
    /// Data extent, if available.
    pub extent: Option<Envelope>,
    /// Attribute fields (FID and geometry excluded).
    pub fields: Vec<FieldDef>,
    /// Lowest-FID feature, if the layer is not empty.
    pub sample: Option<SampleFeature>,
}

/// Result of `inspect`: every vector layer in a container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPackageReport {
    /// Inspected file path.
    pub path: String,
    /// Vector layers, ordered by table name.
    pub layers: Vec<LayerReport>,
}

/// Result of the access check on the first layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessReport {
    /// Checked file path.
    pub path: String,
    /// Number of vector layers in the container.
    pub layer_count: usize,
    /// Name of the first layer.
    pub layer: String,
    /// Number of features in the first layer.
    pub feature_count: u64,
    /// Number of attribute fields in the first layer.
    pub field_count: usize,
    /// First feature read, absent when the layer is empty.
    pub sample: Option<SampleFeature>,
}
