// crates/geoprobe-gpkg/src/schema.rs
// ============================================================================
// Module: GeoPackage Schema Vocabulary
// Description: Geometry type names and attribute field type mapping.
// Purpose: Translate GeoPackage declarations into OGR-style display names.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! GeoPackage declares geometry types by upper-case name in
//! `gpkg_geometry_columns` and attribute types by `SQLite` declared type.
//! Operators know these through the OGR vocabulary (`Multi Polygon`,
//! `Integer64`), so both are mapped onto it here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use serde::Serializer;

// ============================================================================
// SECTION: Geometry Types
// ============================================================================

/// Geometry type families allowed in `gpkg_geometry_columns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    /// `GEOMETRY`: any geometry type.
    Geometry,
    /// `POINT`.
    Point,
    /// `LINESTRING`.
    LineString,
    /// `POLYGON`.
    Polygon,
    /// `MULTIPOINT`.
    MultiPoint,
    /// `MULTILINESTRING`.
    MultiLineString,
    /// `MULTIPOLYGON`.
    MultiPolygon,
    /// `GEOMETRYCOLLECTION`.
    GeometryCollection,
    /// `CIRCULARSTRING`.
    CircularString,
    /// `COMPOUNDCURVE`.
    CompoundCurve,
    /// `CURVEPOLYGON`.
    CurvePolygon,
    /// `MULTICURVE`.
    MultiCurve,
    /// `MULTISURFACE`.
    MultiSurface,
    /// `CURVE`.
    Curve,
    /// `SURFACE`.
    Surface,
}

impl GeometryKind {
    /// Parses a `geometry_type_name` value (case-insensitive).
    #[must_use]
    pub fn from_gpkg_name(name: &str) -> Option<Self> {
        let kind = match name.trim().to_ascii_uppercase().as_str() {
            "GEOMETRY" => Self::Geometry,
            "POINT" => Self::Point,
            "LINESTRING" => Self::LineString,
            "POLYGON" => Self::Polygon,
            "MULTIPOINT" => Self::MultiPoint,
            "MULTILINESTRING" => Self::MultiLineString,
            "MULTIPOLYGON" => Self::MultiPolygon,
            "GEOMETRYCOLLECTION" => Self::GeometryCollection,
            "CIRCULARSTRING" => Self::CircularString,
            "COMPOUNDCURVE" => Self::CompoundCurve,
            "CURVEPOLYGON" => Self::CurvePolygon,
            "MULTICURVE" => Self::MultiCurve,
            "MULTISURFACE" => Self::MultiSurface,
            "CURVE" => Self::Curve,
            "SURFACE" => Self::Surface,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns the OGR display name for the 2D type.
    #[must_use]
    pub const fn ogr_name(self) -> &'static str {
        match self {
            Self::Geometry => "Unknown (any)",
            Self::Point => "Point",
            Self::LineString => "Line String",
            Self::Polygon => "Polygon",
            Self::MultiPoint => "Multi Point",
            Self::MultiLineString => "Multi Line String",
            Self::MultiPolygon => "Multi Polygon",
            Self::GeometryCollection => "Geometry Collection",
            Self::CircularString => "Circular String",
            Self::CompoundCurve => "Compound Curve",
            Self::CurvePolygon => "Curve Polygon",
            Self::MultiCurve => "Multi Curve",
            Self::MultiSurface => "Multi Surface",
            Self::Curve => "Curve",
            Self::Surface => "Surface",
        }
    }
}

/// Full geometry type of a layer, including dimensionality.
///
/// # Invariants
/// - `kind == None` denotes an unrecognized declaration; it renders as
///   `Unknown (any)` just like `GEOMETRY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryTypeName {
    /// Declared geometry family.
    pub kind: Option<GeometryKind>,
    /// Z values are mandatory or optional.
    pub has_z: bool,
    /// M values are mandatory or optional.
    pub has_m: bool,
}

impl GeometryTypeName {
    /// Builds a type name from `gpkg_geometry_columns` values.
    ///
    /// `z` and `m` follow the GeoPackage convention: 0 prohibited,
    /// 1 mandatory, 2 optional.
    #[must_use]
    pub fn from_columns(type_name: &str, z: i64, m: i64) -> Self {
        Self {
            kind: GeometryKind::from_gpkg_name(type_name),
            has_z: matches!(z, 1 | 2),
            has_m: matches!(m, 1 | 2),
        }
    }
}

impl fmt::Display for GeometryTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_z {
            f.write_str("3D ")?;
        }
        if self.has_m {
            f.write_str("Measured ")?;
        }
        f.write_str(self.kind.map_or(GeometryKind::Geometry.ogr_name(), GeometryKind::ogr_name))
    }
}

impl Serialize for GeometryTypeName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// SECTION: Field Types
// ============================================================================

/// Attribute field types, named as OGR reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
    /// 32-bit integer (also booleans and small integers).
    Integer,
    /// 64-bit integer.
    Integer64,
    /// Double precision floating point.
    Real,
    /// Text.
    String,
    /// Calendar date.
    Date,
    /// Date and time.
    DateTime,
    /// Opaque bytes.
    Binary,
}

impl FieldType {
    /// Returns the OGR type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "Integer",
            Self::Integer64 => "Integer64",
            Self::Real => "Real",
            Self::String => "String",
            Self::Date => "Date",
            Self::DateTime => "DateTime",
            Self::Binary => "Binary",
        }
    }

    /// Maps a `SQLite` declared type to a field type and width.
    ///
    /// Width is the `(n)` suffix of `TEXT(n)` / `BLOB(n)` and 0 otherwise.
    /// Unknown declarations map to [`FieldType::String`].
    #[must_use]
    pub fn from_declared(declared: &str) -> (Self, u32) {
        let normalized = declared.trim().to_ascii_uppercase();
        let (base, width) = match normalized.split_once('(') {
            Some((base, rest)) => {
                let width = rest.trim_end_matches(')').trim().parse::<u32>().unwrap_or(0);
                (base.trim(), width)
            }
            None => (normalized.as_str(), 0),
        };
        let field_type = match base {
            "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" => Self::Integer,
            "INT" | "INTEGER" => Self::Integer64,
            "FLOAT" | "DOUBLE" | "REAL" => Self::Real,
            "BLOB" => Self::Binary,
            "DATE" => Self::Date,
            "DATETIME" => Self::DateTime,
            _ => Self::String,
        };
        let width = match field_type {
            Self::String | Self::Binary => width,
            _ => 0,
        };
        (field_type, width)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
