// crates/geoprobe-gpkg/tests/common/mod.rs
// ============================================================================
// Module: GeoPackage Test Fixtures
// Description: Builds small GeoPackage containers with rusqlite.
// Purpose: Provide deterministic inputs for inspection tests.
// ============================================================================

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    reason = "Shared fixture helpers; not every test binary uses every helper."
)]

use std::path::Path;
use std::path::PathBuf;

use rusqlite::Connection;
use rusqlite::params;

/// `GPKG` application id.
pub const GPKG_APPLICATION_ID: i32 = 0x4750_4B47;

/// Encodes a little-endian GeoPackage blob without a header envelope.
pub fn gpkg_blob(srs_id: i32, wkb: &[u8]) -> Vec<u8> {
    let mut blob = vec![b'G', b'P', 0, 0b0000_0001];
    blob.extend_from_slice(&srs_id.to_le_bytes());
    blob.extend_from_slice(wkb);
    blob
}

/// Encodes a little-endian GeoPackage blob with an XY header envelope.
pub fn gpkg_blob_with_envelope(srs_id: i32, envelope: [f64; 4], wkb: &[u8]) -> Vec<u8> {
    let mut blob = vec![b'G', b'P', 0, 0b0000_0011];
    blob.extend_from_slice(&srs_id.to_le_bytes());
    for value in envelope {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob.extend_from_slice(wkb);
    blob
}

/// Encodes a little-endian WKB point.
pub fn wkb_point(x: f64, y: f64) -> Vec<u8> {
    let mut wkb = vec![1];
    wkb.extend_from_slice(&1u32.to_le_bytes());
    wkb.extend_from_slice(&x.to_le_bytes());
    wkb.extend_from_slice(&y.to_le_bytes());
    wkb
}

/// Encodes a little-endian WKB line string.
pub fn wkb_line(points: &[(f64, f64)]) -> Vec<u8> {
    let mut wkb = vec![1];
    wkb.extend_from_slice(&2u32.to_le_bytes());
    wkb.extend_from_slice(&u32::try_from(points.len()).unwrap().to_le_bytes());
    for (x, y) in points {
        wkb.extend_from_slice(&x.to_le_bytes());
        wkb.extend_from_slice(&y.to_le_bytes());
    }
    wkb
}

/// Creates the GeoPackage metadata tables.
pub fn create_metadata(conn: &Connection, application_id: i32) {
    conn.execute_batch(&format!("PRAGMA application_id = {application_id};")).unwrap();
    conn.execute_batch(
        "CREATE TABLE gpkg_spatial_ref_sys (
            srs_name TEXT NOT NULL,
            srs_id INTEGER PRIMARY KEY,
            organization TEXT NOT NULL,
            organization_coordsys_id INTEGER NOT NULL,
            definition TEXT NOT NULL,
            description TEXT
        );
        INSERT INTO gpkg_spatial_ref_sys VALUES
            ('Undefined cartesian SRS', -1, 'NONE', -1, 'undefined', NULL),
            ('Undefined geographic SRS', 0, 'NONE', 0, 'undefined', NULL),
            ('WGS 84 geodetic', 4326, 'EPSG', 4326, 'GEOGCS[\"WGS 84\"]', NULL);
        CREATE TABLE gpkg_contents (
            table_name TEXT NOT NULL PRIMARY KEY,
            data_type TEXT NOT NULL,
            identifier TEXT UNIQUE,
            description TEXT DEFAULT '',
            last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
            min_x DOUBLE, min_y DOUBLE, max_x DOUBLE, max_y DOUBLE,
            srs_id INTEGER
        );
        CREATE TABLE gpkg_geometry_columns (
            table_name TEXT NOT NULL,
            column_name TEXT NOT NULL,
            geometry_type_name TEXT NOT NULL,
            srs_id INTEGER NOT NULL,
            z TINYINT NOT NULL,
            m TINYINT NOT NULL,
            CONSTRAINT pk_geom_cols PRIMARY KEY (table_name, column_name)
        );",
    )
    .unwrap();
}

/// Builds the reference fixture and returns its path.
///
/// Layers (sorted): `amazonas` (3 polygons, contents bounds recorded),
/// `municipios` (attributes, 2 rows), `rios` (3 lines, one malformed blob,
/// no contents bounds), `vacia` (empty points, undefined SRS). A `tiles`
/// row is registered and must be ignored.
pub fn build_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("amazonas.gpkg");
    let conn = Connection::open(&path).unwrap();
    create_metadata(&conn, GPKG_APPLICATION_ID);
    conn.execute_batch(
        "INSERT INTO gpkg_contents (table_name, data_type, identifier, min_x, min_y, max_x, max_y, srs_id) VALUES
            ('amazonas', 'features', 'amazonas', -74.5, -1.75, -69.25, 1.5, 4326),
            ('rios', 'features', 'rios', NULL, NULL, NULL, NULL, 4326),
            ('municipios', 'attributes', 'municipios', NULL, NULL, NULL, NULL, NULL),
            ('vacia', 'features', 'vacia', NULL, NULL, NULL, NULL, -1),
            ('ortofoto', 'tiles', 'ortofoto', NULL, NULL, NULL, NULL, 4326);
        INSERT INTO gpkg_geometry_columns VALUES
            ('amazonas', 'geom', 'MULTIPOLYGON', 4326, 0, 0),
            ('rios', 'geom', 'LINESTRING', 4326, 0, 0),
            ('vacia', 'geom', 'POINT', -1, 1, 0);
        CREATE TABLE amazonas (
            fid INTEGER PRIMARY KEY AUTOINCREMENT,
            geom MULTIPOLYGON,
            nombre TEXT(80),
            poblacion MEDIUMINT,
            area DOUBLE,
            codigo INTEGER,
            foto BLOB
        );
        CREATE TABLE rios (fid INTEGER PRIMARY KEY AUTOINCREMENT, geom LINESTRING, name TEXT);
        CREATE TABLE municipios (fid INTEGER PRIMARY KEY AUTOINCREMENT, nombre TEXT, capital BOOLEAN);
        CREATE TABLE vacia (fid INTEGER PRIMARY KEY AUTOINCREMENT, geom POINT, etiqueta TEXT(10));",
    )
    .unwrap();

    let polygon = gpkg_blob_with_envelope(
        4326,
        [-74.5, -70.0, -1.75, 0.5],
        &wkb_point(-72.0, -0.5),
    );
    conn.execute(
        "INSERT INTO amazonas (fid, geom, nombre, poblacion, area, codigo, foto) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![7, polygon, "Leticia", 48_144, 5_968.3, 91_001, vec![0u8; 4]],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO amazonas (fid, geom, nombre, poblacion, area, codigo, foto) VALUES (?1, ?2, ?3, NULL, ?4, ?5, NULL)",
        params![12, gpkg_blob(4326, &wkb_point(-70.0, 1.0)), "Puerto Nariño", 1_500.0, 91_540],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO amazonas (fid, geom, nombre, poblacion, area, codigo, foto) VALUES (?1, NULL, ?2, ?3, NULL, NULL, NULL)",
        params![30, "Tarapacá", 4_000],
    )
    .unwrap();

    let lines = [
        gpkg_blob(4326, &wkb_line(&[(-73.0, -1.0), (-71.5, -0.25)])),
        gpkg_blob(4326, &wkb_line(&[(-72.0, 0.5), (-69.75, 1.25)])),
        vec![b'X', b'X', 0, 1, 0, 0],
    ];
    for (index, blob) in lines.into_iter().enumerate() {
        conn.execute(
            "INSERT INTO rios (geom, name) VALUES (?1, ?2)",
            params![blob, format!("rio {index}")],
        )
        .unwrap();
    }

    conn.execute_batch(
        "INSERT INTO municipios (nombre, capital) VALUES ('Leticia', 1), ('Tarapacá', 0);",
    )
    .unwrap();
    path
}

/// Builds a container whose only layer has no rows.
pub fn build_empty_layer_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("empty.gpkg");
    let conn = Connection::open(&path).unwrap();
    create_metadata(&conn, GPKG_APPLICATION_ID);
    conn.execute_batch(
        "INSERT INTO gpkg_contents (table_name, data_type, srs_id) VALUES ('puntos', 'features', 4326);
        INSERT INTO gpkg_geometry_columns VALUES ('puntos', 'geom', 'POINT', 4326, 0, 0);
        CREATE TABLE puntos (fid INTEGER PRIMARY KEY AUTOINCREMENT, geom POINT, nombre TEXT);",
    )
    .unwrap();
    path
}

/// Builds a container with metadata tables but no vector layers.
pub fn build_layerless_fixture(dir: &Path, application_id: i32) -> PathBuf {
    let path = dir.join("layerless.gpkg");
    let conn = Connection::open(&path).unwrap();
    create_metadata(&conn, application_id);
    path
}
