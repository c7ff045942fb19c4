// crates/geoprobe-gpkg/src/source.rs
// ============================================================================
// Module: GeoPackage Source
// Description: Read-only SQLite access to GeoPackage metadata and layers.
// Purpose: Produce inspection and access-check reports for a container.
// Dependencies: rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`GeoPackage`] wraps a read-only `SQLite` connection. Vector layers are the
//! `gpkg_contents` rows of type `features` or `attributes`; tile pyramids are
//! skipped. Table names come from the container and are always quoted before
//! being spliced into SQL.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use rusqlite::types::ValueRef;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::geometry::Envelope;
use crate::geometry::blob_envelope;
use crate::report::AccessReport;
use crate::report::FieldDef;
use crate::report::FieldValue;
use crate::report::GeoPackageReport;
use crate::report::LayerReport;
use crate::report::SampleFeature;
use crate::report::SpatialRef;
use crate::schema::FieldType;
use crate::schema::GeometryTypeName;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// `application_id` values accepted without a warning (`GPKG`, `GP10`, `GP11`).
const GPKG_APPLICATION_IDS: [i32; 3] = [0x4750_4B47, 0x4750_3130, 0x4750_3131];
/// Contents table that marks a GeoPackage.
const CONTENTS_TABLE: &str = "gpkg_contents";
/// Geometry column registry table.
const GEOMETRY_COLUMNS_TABLE: &str = "gpkg_geometry_columns";
/// Spatial reference registry table.
const SRS_TABLE: &str = "gpkg_spatial_ref_sys";

// ============================================================================
// SECTION: Options
// ============================================================================

/// Options for opening a GeoPackage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpkgOptions {
    /// `SQLite` busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for GpkgOptions {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// GeoPackage access errors.
#[derive(Debug, Error)]
pub enum GpkgError {
    /// The path does not exist.
    #[error("geopackage not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Filesystem error.
    #[error("geopackage io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("geopackage db error: {0}")]
    Db(String),
    /// The file is readable but not a GeoPackage.
    #[error("not a geopackage: {0}")]
    NotGeoPackage(String),
    /// The container holds no vector layers.
    #[error("geopackage contains no vector layers")]
    NoLayers,
    /// A non-empty layer yielded no feature.
    #[error("could not read a feature from layer {0}")]
    FeatureUnreadable(String),
}

impl From<rusqlite::Error> for GpkgError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Db(error.to_string())
    }
}

// ============================================================================
// SECTION: Layer Metadata
// ============================================================================

/// `gpkg_contents.data_type` values treated as vector layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Vector features with a geometry column.
    Features,
    /// Non-spatial attribute table.
    Attributes,
}

impl DataType {
    /// Parses a `data_type` value.
    fn parse(value: &str) -> Option<Self> {
        match value {
            "features" => Some(Self::Features),
            "attributes" => Some(Self::Attributes),
            _ => None,
        }
    }

    /// Returns the GeoPackage label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Features => "features",
            Self::Attributes => "attributes",
        }
    }
}

/// Geometry column registration for a feature layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryColumn {
    /// Column holding geometry blobs.
    pub column_name: String,
    /// Declared geometry type.
    pub type_name: GeometryTypeName,
    /// SRS declared for the column.
    pub srs_id: i32,
}

/// A vector layer listed in `gpkg_contents`.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerInfo {
    /// Table name.
    pub table_name: String,
    /// Content type.
    pub data_type: DataType,
    /// Bounds recorded in `gpkg_contents`, when all four are set.
    pub contents_bounds: Option<Envelope>,
    /// SRS recorded in `gpkg_contents`.
    pub contents_srs_id: Option<i32>,
    /// Geometry column, for feature layers.
    pub geometry: Option<GeometryColumn>,
}

impl LayerInfo {
    /// Returns the effective SRS identifier for the layer.
    #[must_use]
    pub fn srs_id(&self) -> Option<i32> {
        self.geometry.as_ref().map(|geometry| geometry.srs_id).or(self.contents_srs_id)
    }

    /// Returns the OGR-style geometry type label.
    #[must_use]
    pub fn geometry_type_label(&self) -> String {
        self.geometry
            .as_ref()
            .map_or_else(|| "None".to_string(), |geometry| geometry.type_name.to_string())
    }
}

/// Columns of a layer table split into FID, geometry, and attributes.
struct TableColumns {
    /// Integer primary key column, if declared.
    fid: Option<String>,
    /// Attribute fields in declaration order.
    fields: Vec<FieldDef>,
}

// ============================================================================
// SECTION: GeoPackage
// ============================================================================

/// Read-only handle on a GeoPackage container.
///
/// # Invariants
/// - The connection is opened with `SQLITE_OPEN_READ_ONLY`.
/// - `gpkg_contents` exists.
pub struct GeoPackage {
    /// Path the container was opened from.
    path: PathBuf,
    /// Read-only connection.
    connection: Connection,
}

impl GeoPackage {
    /// Opens a GeoPackage with default options.
    ///
    /// # Errors
    ///
    /// Returns [`GpkgError`] when the file is missing, unreadable, or not a
    /// GeoPackage.
    pub fn open(path: &Path) -> Result<Self, GpkgError> {
        Self::open_with(path, &GpkgOptions::default())
    }

    /// Opens a GeoPackage read-only.
    ///
    /// # Errors
    ///
    /// Returns [`GpkgError`] when the file is missing, unreadable, or not a
    /// GeoPackage.
    pub fn open_with(path: &Path, options: &GpkgOptions) -> Result<Self, GpkgError> {
        if !path.exists() {
            return Err(GpkgError::NotFound(path.to_path_buf()));
        }
        if path.is_dir() {
            return Err(GpkgError::Io(format!("{} is a directory", path.display())));
        }
        debug!(path = %path.display(), "opening geopackage");
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection = Connection::open_with_flags(path, flags)?;
        connection.busy_timeout(Duration::from_millis(options.busy_timeout_ms))?;
        let gpkg = Self {
            path: path.to_path_buf(),
            connection,
        };
        match gpkg.table_exists(CONTENTS_TABLE) {
            Ok(true) => {}
            Ok(false) => {
                return Err(GpkgError::NotGeoPackage(format!("missing {CONTENTS_TABLE} table")));
            }
            Err(err) if err.sqlite_error_code() == Some(ErrorCode::NotADatabase) => {
                return Err(GpkgError::NotGeoPackage("file is not a SQLite database".to_string()));
            }
            Err(err) => return Err(err.into()),
        }
        let application_id = gpkg.application_id()?;
        if !GPKG_APPLICATION_IDS.contains(&application_id) {
            warn!(
                path = %path.display(),
                application_id,
                "unexpected application_id; continuing because gpkg_contents is present"
            );
        }
        Ok(gpkg)
    }

    /// Returns the path the container was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the `SQLite` `application_id` header value.
    ///
    /// # Errors
    ///
    /// Returns [`GpkgError::Db`] when the pragma cannot be read.
    pub fn application_id(&self) -> Result<i32, GpkgError> {
        Ok(self.connection.query_row("PRAGMA application_id", params![], |row| row.get(0))?)
    }

    /// Lists vector layers ordered by table name.
    ///
    /// # Errors
    ///
    /// Returns [`GpkgError::Db`] when the metadata tables cannot be queried.
    pub fn layers(&self) -> Result<Vec<LayerInfo>, GpkgError> {
        let has_geometry_columns = self.table_exists(GEOMETRY_COLUMNS_TABLE)?;
        let sql = if has_geometry_columns {
            "SELECT c.table_name, c.data_type, c.min_x, c.min_y, c.max_x, c.max_y, c.srs_id,
                    g.column_name, g.geometry_type_name, g.srs_id, g.z, g.m
             FROM gpkg_contents c
             LEFT JOIN gpkg_geometry_columns g ON g.table_name = c.table_name
             WHERE c.data_type IN ('features', 'attributes')
             ORDER BY c.table_name"
        } else {
            "SELECT c.table_name, c.data_type, c.min_x, c.min_y, c.max_x, c.max_y, c.srs_id,
                    NULL, NULL, NULL, NULL, NULL
             FROM gpkg_contents c
             WHERE c.data_type IN ('features', 'attributes')
             ORDER BY c.table_name"
        };
        let mut stmt = self.connection.prepare(sql)?;
        let rows = stmt.query_map(params![], |row| {
            let table_name: String = row.get(0)?;
            let data_type: String = row.get(1)?;
            let bounds: [Option<f64>; 4] = [row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?];
            let contents_srs_id: Option<i32> = row.get(6)?;
            let column_name: Option<String> = row.get(7)?;
            let type_name: Option<String> = row.get(8)?;
            let column_srs_id: Option<i32> = row.get(9)?;
            let z: Option<i64> = row.get(10)?;
            let m: Option<i64> = row.get(11)?;
            let contents_bounds = match bounds {
                [Some(min_x), Some(min_y), Some(max_x), Some(max_y)] => Some(Envelope {
                    min_x,
                    max_x,
                    min_y,
                    max_y,
                }),
                _ => None,
            };
            let geometry = column_name.map(|column_name| GeometryColumn {
                column_name,
                type_name: GeometryTypeName::from_columns(
                    type_name.as_deref().unwrap_or("GEOMETRY"),
                    z.unwrap_or(0),
                    m.unwrap_or(0),
                ),
                srs_id: column_srs_id.or(contents_srs_id).unwrap_or(0),
            });
            Ok((table_name, data_type, contents_bounds, contents_srs_id, geometry))
        })?;
        let mut layers = Vec::new();
        for row in rows {
            let (table_name, data_type, contents_bounds, contents_srs_id, geometry) = row?;
            let Some(data_type) = DataType::parse(&data_type) else {
                continue;
            };
            let geometry = match data_type {
                DataType::Features => geometry,
                DataType::Attributes => None,
            };
            layers.push(LayerInfo {
                table_name,
                data_type,
                contents_bounds,
                contents_srs_id,
                geometry,
            });
        }
        debug!(path = %self.path.display(), layers = layers.len(), "listed vector layers");
        Ok(layers)
    }

    /// Counts the rows of a layer table.
    ///
    /// # Errors
    ///
    /// Returns [`GpkgError::Db`] when the table cannot be counted.
    pub fn feature_count(&self, layer: &LayerInfo) -> Result<u64, GpkgError> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(&layer.table_name));
        let count: i64 = self.connection.query_row(&sql, params![], |row| row.get(0))?;
        u64::try_from(count).map_err(|_| GpkgError::Db("negative row count".to_string()))
    }

    /// Resolves the layer's spatial reference.
    ///
    /// Identifiers `<= 0` are GeoPackage's undefined cartesian/geographic
    /// placeholders and resolve to `None`.
    ///
    /// # Errors
    ///
    /// Returns [`GpkgError::Db`] when the SRS table cannot be queried.
    pub fn spatial_ref(&self, layer: &LayerInfo) -> Result<Option<SpatialRef>, GpkgError> {
        let Some(srs_id) = layer.srs_id().filter(|id| *id > 0) else {
            return Ok(None);
        };
        if !self.table_exists(SRS_TABLE)? {
            return Ok(None);
        }
        let srs = self
            .connection
            .query_row(
                "SELECT srs_name, organization, organization_coordsys_id
                 FROM gpkg_spatial_ref_sys WHERE srs_id = ?1",
                params![srs_id],
                |row| {
                    Ok(SpatialRef {
                        srs_id,
                        name: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                        organization: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        code: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                    })
                },
            )
            .optional()?;
        if srs.is_none() {
            warn!(layer = %layer.table_name, srs_id, "layer references an unregistered srs_id");
        }
        Ok(srs)
    }

    /// Returns the layer extent.
    ///
    /// Uses the `gpkg_contents` bounds when recorded, otherwise the union of
    /// every geometry envelope. Malformed blobs are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`GpkgError::Db`] when the geometry column cannot be scanned.
    pub fn extent(&self, layer: &LayerInfo) -> Result<Option<Envelope>, GpkgError> {
        let Some(geometry) = &layer.geometry else {
            return Ok(None);
        };
        if let Some(bounds) = layer.contents_bounds {
            return Ok(Some(bounds));
        }
        let column = quote_identifier(&geometry.column_name);
        let sql = format!(
            "SELECT {column} FROM {} WHERE {column} IS NOT NULL",
            quote_identifier(&layer.table_name)
        );
        let mut stmt = self.connection.prepare(&sql)?;
        let mut rows = stmt.query(params![])?;
        let mut extent: Option<Envelope> = None;
        let mut skipped = 0usize;
        while let Some(row) = rows.next()? {
            let ValueRef::Blob(blob) = row.get_ref(0)? else {
                skipped += 1;
                continue;
            };
            match blob_envelope(blob) {
                Ok(Some(envelope)) => {
                    extent = Some(extent.map_or(envelope, |current| current.union(envelope)));
                }
                Ok(None) => {}
                Err(err) => {
                    skipped += 1;
                    debug!(layer = %layer.table_name, error = %err, "skipping geometry blob");
                }
            }
        }
        if skipped > 0 {
            warn!(layer = %layer.table_name, skipped, "skipped malformed geometries while computing extent");
        }
        Ok(extent)
    }

    /// Lists attribute fields, excluding the FID and geometry columns.
    ///
    /// # Errors
    ///
    /// Returns [`GpkgError::Db`] when the table schema cannot be read.
    pub fn fields(&self, layer: &LayerInfo) -> Result<Vec<FieldDef>, GpkgError> {
        Ok(self.table_columns(layer)?.fields)
    }

    /// Reads the lowest-FID feature of a layer.
    ///
    /// # Errors
    ///
    /// Returns [`GpkgError::Db`] when the row cannot be read.
    pub fn sample_feature(&self, layer: &LayerInfo) -> Result<Option<SampleFeature>, GpkgError> {
        let columns = self.table_columns(layer)?;
        self.first_feature(layer, &columns)
    }

    /// Builds the full report for one layer.
    ///
    /// # Errors
    ///
    /// Returns [`GpkgError`] when any metadata query fails.
    pub fn inspect_layer(&self, index: usize, layer: &LayerInfo) -> Result<LayerReport, GpkgError> {
        let columns = self.table_columns(layer)?;
        let sample = self.first_feature(layer, &columns)?;
        Ok(LayerReport {
            index,
            name: layer.table_name.clone(),
            data_type: layer.data_type,
            feature_count: self.feature_count(layer)?,
            geometry_type: layer.geometry_type_label(),
            geometry_column: layer.geometry.as_ref().map(|geometry| geometry.column_name.clone()),
            spatial_ref: self.spatial_ref(layer)?,
            extent: self.extent(layer)?,
            fields: columns.fields,
            sample,
        })
    }

    /// Inspects every vector layer.
    ///
    /// # Errors
    ///
    /// Returns [`GpkgError`] when any metadata query fails.
    pub fn inspect(&self) -> Result<GeoPackageReport, GpkgError> {
        let layers = self.layers()?;
        let mut reports = Vec::with_capacity(layers.len());
        for (position, layer) in layers.iter().enumerate() {
            reports.push(self.inspect_layer(position + 1, layer)?);
        }
        Ok(GeoPackageReport {
            path: self.path.display().to_string(),
            layers: reports,
        })
    }

    /// Verifies that the first layer can be read.
    ///
    /// # Errors
    ///
    /// Returns [`GpkgError::NoLayers`] for containers without vector layers
    /// and [`GpkgError::FeatureUnreadable`] when a non-empty layer yields no
    /// feature.
    pub fn check_access(&self) -> Result<AccessReport, GpkgError> {
        let layers = self.layers()?;
        let Some(first) = layers.first() else {
            return Err(GpkgError::NoLayers);
        };
        let feature_count = self.feature_count(first)?;
        let columns = self.table_columns(first)?;
        let sample = if feature_count == 0 {
            None
        } else {
            let sample = self.first_feature(first, &columns)?;
            if sample.is_none() {
                return Err(GpkgError::FeatureUnreadable(first.table_name.clone()));
            }
            sample
        };
        Ok(AccessReport {
            path: self.path.display().to_string(),
            layer_count: layers.len(),
            layer: first.table_name.clone(),
            feature_count,
            field_count: columns.fields.len(),
            sample,
        })
    }

    // ------------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------------

    /// Returns whether a table exists in the main schema.
    fn table_exists(&self, name: &str) -> Result<bool, rusqlite::Error> {
        self.connection.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            params![name],
            |row| row.get(0),
        )
    }

    /// Reads the layer table schema.
    fn table_columns(&self, layer: &LayerInfo) -> Result<TableColumns, GpkgError> {
        let sql = format!("PRAGMA table_info({})", quote_identifier(&layer.table_name));
        let mut stmt = self.connection.prepare(&sql)?;
        let rows = stmt.query_map(params![], |row| {
            let name: String = row.get(1)?;
            let declared: Option<String> = row.get(2)?;
            let pk: i64 = row.get(5)?;
            Ok((name, declared.unwrap_or_default(), pk))
        })?;
        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }
        let pk_columns: Vec<&(String, String, i64)> =
            columns.iter().filter(|(_, _, pk)| *pk > 0).collect();
        let fid = match pk_columns.as_slice() {
            [(name, declared, _)] if declared.eq_ignore_ascii_case("INTEGER") => Some(name.clone()),
            _ => None,
        };
        let geometry_column = layer.geometry.as_ref().map(|geometry| geometry.column_name.as_str());
        let fields = columns
            .iter()
            .filter(|(name, _, _)| Some(name.as_str()) != fid.as_deref())
            .filter(|(name, _, _)| {
                geometry_column.is_none_or(|geometry| !geometry.eq_ignore_ascii_case(name))
            })
            .map(|(name, declared, _)| {
                let (field_type, width) = FieldType::from_declared(declared);
                FieldDef {
                    name: name.clone(),
                    field_type,
                    width,
                    declared_type: declared.clone(),
                }
            })
            .collect();
        Ok(TableColumns {
            fid,
            fields,
        })
    }

    /// Reads the lowest-FID row using pre-resolved columns.
    fn first_feature(
        &self,
        layer: &LayerInfo,
        columns: &TableColumns,
    ) -> Result<Option<SampleFeature>, GpkgError> {
        let fid_column = columns.fid.as_deref().map_or_else(|| "rowid".to_string(), quote_identifier);
        let mut selected = vec![fid_column.clone()];
        selected.extend(columns.fields.iter().map(|field| quote_identifier(&field.name)));
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {fid_column} LIMIT 1",
            selected.join(", "),
            quote_identifier(&layer.table_name)
        );
        let sample = self
            .connection
            .query_row(&sql, params![], |row| {
                let fid: i64 = row.get(0)?;
                let mut values = Vec::with_capacity(columns.fields.len());
                for (offset, field) in columns.fields.iter().enumerate() {
                    let value = match row.get_ref(offset + 1)? {
                        ValueRef::Null => FieldValue::Null,
                        ValueRef::Integer(value) => FieldValue::Integer(value),
                        ValueRef::Real(value) => FieldValue::Real(value),
                        ValueRef::Text(bytes) => {
                            FieldValue::Text(String::from_utf8_lossy(bytes).into_owned())
                        }
                        ValueRef::Blob(bytes) => FieldValue::Blob {
                            bytes: bytes.len(),
                        },
                    };
                    values.push((field.name.clone(), value));
                }
                Ok(SampleFeature {
                    fid,
                    values,
                })
            })
            .optional()?;
        Ok(sample)
    }
}

/// Quotes an `SQLite` identifier.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
