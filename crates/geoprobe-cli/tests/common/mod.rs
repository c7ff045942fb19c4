// crates/geoprobe-cli/tests/common/mod.rs
// ============================================================================
// Module: CLI Test Harness
// Description: Binary runner, GeoPackage fixture, and pygeoapi stub.
// Purpose: Run the geoprobe binary in an isolated working directory.
// ============================================================================

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    reason = "Shared test helpers; not every test binary uses every helper."
)]

use std::net::TcpListener;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

use rusqlite::Connection;
use rusqlite::params;
use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Binary Runner
// ============================================================================

/// Runs the geoprobe binary from `dir` with a clean environment.
pub fn run_geoprobe(dir: &Path, args: &[&str]) -> Output {
    run_geoprobe_with_env(dir, args, &[])
}

/// Runs the geoprobe binary from `dir` with extra environment variables.
pub fn run_geoprobe_with_env(dir: &Path, args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut command = Command::new(PathBuf::from(env!("CARGO_BIN_EXE_geoprobe")));
    command
        .current_dir(dir)
        .args(args)
        .env_remove("GEOPROBE_CONFIG")
        .env_remove("GEOPROBE_LANG")
        .env_remove("GEOPROBE_LOG")
        .env("NO_COLOR", "1");
    for (key, value) in env {
        command.env(key, value);
    }
    command.output().expect("run geoprobe")
}

/// Returns stdout as UTF-8 text.
pub fn stdout_of(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

/// Returns stderr as UTF-8 text.
pub fn stderr_of(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

// ============================================================================
// SECTION: GeoPackage Fixture
// ============================================================================

/// Creates the GeoPackage metadata tables.
fn create_metadata(conn: &Connection) {
    conn.execute_batch(
        "PRAGMA application_id = 1196444487;
        CREATE TABLE gpkg_spatial_ref_sys (
            srs_name TEXT NOT NULL,
            srs_id INTEGER PRIMARY KEY,
            organization TEXT NOT NULL,
            organization_coordsys_id INTEGER NOT NULL,
            definition TEXT NOT NULL,
            description TEXT
        );
        INSERT INTO gpkg_spatial_ref_sys VALUES
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

/// Encodes a GeoPackage point blob without a header envelope.
fn point_blob(x: f64, y: f64) -> Vec<u8> {
    let mut blob = vec![b'G', b'P', 0, 0b0000_0001];
    blob.extend_from_slice(&4326i32.to_le_bytes());
    blob.push(1);
    blob.extend_from_slice(&1u32.to_le_bytes());
    blob.extend_from_slice(&x.to_le_bytes());
    blob.extend_from_slice(&y.to_le_bytes());
    blob
}

/// Builds `amazonas.gpkg` with one six-field point layer of two features.
pub fn build_gpkg(dir: &Path) -> PathBuf {
    let path = dir.join("amazonas.gpkg");
    let conn = Connection::open(&path).unwrap();
    create_metadata(&conn);
    conn.execute_batch(
        "INSERT INTO gpkg_contents (table_name, data_type, identifier, min_x, min_y, max_x, max_y, srs_id)
            VALUES ('amazonas', 'features', 'amazonas', -74.5, -1.75, -69.25, 1.5, 4326);
        INSERT INTO gpkg_geometry_columns VALUES ('amazonas', 'geom', 'POINT', 4326, 0, 0);
        CREATE TABLE amazonas (
            fid INTEGER PRIMARY KEY AUTOINCREMENT,
            geom POINT,
            nombre TEXT(80),
            poblacion INTEGER,
            area REAL,
            codigo INTEGER,
            departamento TEXT,
            capital BOOLEAN
        );",
    )
    .unwrap();
    conn.execute(
        "INSERT INTO amazonas (geom, nombre, poblacion, area, codigo, departamento, capital)
            VALUES (?1, 'Leticia', 48144, 5968.3, 91001, 'Amazonas', 1)",
        params![point_blob(-69.94, -4.2)],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO amazonas (geom, nombre, poblacion, area, codigo, departamento, capital)
            VALUES (?1, 'Tarapacá', 4000, NULL, 91798, 'Amazonas', 0)",
        params![point_blob(-69.75, -2.88)],
    )
    .unwrap();
    path
}

/// Builds a GeoPackage with metadata tables and no layers.
pub fn build_layerless_gpkg(dir: &Path) -> PathBuf {
    let path = dir.join("layerless.gpkg");
    let conn = Connection::open(&path).unwrap();
    create_metadata(&conn);
    path
}

// ============================================================================
// SECTION: pygeoapi Stub
// ============================================================================

/// Builds one stub feature.
fn feature(index: usize) -> Value {
    json!({
        "type": "Feature",
        "id": format!("amazonas.{}", index + 1),
        "geometry": {"type": "Point", "coordinates": [-70.0, -2.0]},
        "properties": {"nombre": format!("municipio {index}")}
    })
}

/// Routes one request to a status and body.
///
/// `missing_status` is returned for unknown paths.
fn respond(raw: &str, missing_status: u16) -> (u16, String) {
    let (path, query) = raw.split_once('?').unwrap_or((raw, ""));
    let path = path.trim_end_matches('/');
    let limit = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("limit="))
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(10);
    match path {
        "" => (200, json!({"title": "pygeoapi", "links": []}).to_string()),
        "/conformance" => (200, json!({"conformsTo": []}).to_string()),
        "/openapi" => (200, json!({"openapi": "3.0.2"}).to_string()),
        "/collections" => (200, json!({"collections": [{"id": "amazonas"}]}).to_string()),
        "/collections/amazonas" => (200, json!({"id": "amazonas"}).to_string()),
        "/collections/amazonas/items" => {
            let page = limit.min(12);
            let features: Vec<Value> = (0..page).map(feature).collect();
            let body = json!({
                "type": "FeatureCollection",
                "features": features,
                "numberMatched": 12,
                "numberReturned": page
            });
            (200, body.to_string())
        }
        "/collections/amazonas/items/amazonas.1" => (200, feature(0).to_string()),
        _ => (missing_status, json!({"code": "NotFound"}).to_string()),
    }
}

/// Running stub server; stops on drop.
pub struct StubServer {
    /// Base URL of the stub.
    pub base_url: String,
    /// Server handle used to unblock the worker.
    server: Arc<Server>,
    /// Worker thread.
    handle: Option<JoinHandle<()>>,
}

impl StubServer {
    /// Starts a stub that answers unknown paths with `missing_status`.
    pub fn start(missing_status: u16) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap();
        let worker = Arc::clone(&server);
        let handle = thread::spawn(move || {
            for request in worker.incoming_requests() {
                let (status, body) = respond(request.url(), missing_status);
                let header =
                    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
                let response =
                    Response::from_string(body).with_status_code(status).with_header(header);
                let _ = request.respond(response);
            }
        });
        Self {
            base_url: format!("http://{addr}"),
            server,
            handle: Some(handle),
        }
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Returns a loopback URL with nothing listening.
pub fn unused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
