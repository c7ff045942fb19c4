// crates/geoprobe-smoke/tests/common/mod.rs
// ============================================================================
// Module: Smoke Test Stub Server
// Description: tiny_http stand-in for a pygeoapi deployment.
// Purpose: Drive the smoke suite against controllable responses.
// ============================================================================

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    reason = "Shared stub helpers; not every test binary uses every helper."
)]

use std::io::Cursor;
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::thread::JoinHandle;

use geoprobe_config::SmokeConfig;
use geoprobe_smoke::SmokeClient;
use geoprobe_smoke::SmokeSettings;
use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;
use tiny_http::StatusCode;

// ============================================================================
// SECTION: Fixed Routes
// ============================================================================

/// Answers 302 with `Location: /collections`.
pub const REDIRECT_PATH: &str = "/moved";
/// Answers an oversized body with a `Content-Length` header.
pub const OVERSIZED_PATH: &str = "/oversized";
/// Answers an oversized body with chunked transfer encoding.
pub const OVERSIZED_CHUNKED_PATH: &str = "/oversized-chunked";
/// Size of the oversized bodies in bytes.
pub const OVERSIZED_BODY_BYTES: usize = 4096;

/// Percent-encodes `raw` as one URL path segment.
pub fn encoded_segment(raw: &str) -> String {
    let mut scratch = url::Url::parse("http://stub/").unwrap();
    scratch.path_segments_mut().unwrap().clear().push(raw);
    scratch.path().trim_start_matches('/').to_string()
}

// ============================================================================
// SECTION: Stub Behaviour
// ============================================================================

/// Knobs for the stub API.
#[derive(Debug, Clone)]
pub struct StubApi {
    /// Collection served under `/collections/{id}`.
    pub collection: String,
    /// Number of features in the collection.
    pub feature_total: usize,
    /// Whether `limit` is honoured.
    pub honour_limit: bool,
    /// Serve a non-JSON body on `/conformance`.
    pub broken_conformance: bool,
    /// Status for unknown paths.
    pub missing_status: u16,
    /// Use numeric feature identifiers.
    pub numeric_ids: bool,
    /// Status for single-feature fetches.
    pub feature_status: u16,
    /// Status for bbox queries.
    pub bbox_status: u16,
    /// Status for the landing page.
    pub landing_status: u16,
    /// Identifier of the first feature, replacing the generated one.
    pub first_feature_id: Option<String>,
}

impl Default for StubApi {
    fn default() -> Self {
        Self {
            collection: "amazonas".to_string(),
            feature_total: 12,
            honour_limit: true,
            broken_conformance: false,
            missing_status: 404,
            numeric_ids: false,
            feature_status: 200,
            bbox_status: 200,
            landing_status: 200,
            first_feature_id: None,
        }
    }
}

impl StubApi {
    /// Builds the feature with the given index.
    fn feature(&self, index: usize) -> Value {
        let id = if let (0, Some(custom)) = (index, &self.first_feature_id) {
            json!(custom)
        } else if self.numeric_ids {
            json!(index + 1)
        } else {
            json!(format!("{}.{}", self.collection, index + 1))
        };
        json!({
            "type": "Feature",
            "id": id,
            "geometry": {"type": "MultiPolygon", "coordinates": []},
            "properties": {"nombre": format!("municipio {index}")}
        })
    }

    /// Routes one request path (with query) to a status and body.
    ///
    /// Paths are matched in their encoded wire form: the collection and item
    /// identifiers must each arrive as one percent-encoded segment.
    pub fn respond(&self, raw: &str) -> (u16, String) {
        let parsed = url::Url::parse(&format!("http://stub{raw}")).unwrap();
        let path = parsed.path().trim_end_matches('/');
        let collection_path = format!("/collections/{}", encoded_segment(&self.collection));
        let items_path = format!("{collection_path}/items");
        let query = |key: &str| {
            parsed.query_pairs().find(|(name, _)| name == key).map(|(_, value)| value.into_owned())
        };
        match path {
            "" => (
                self.landing_status,
                json!({"title": "pygeoapi", "description": "stub", "links": []}).to_string(),
            ),
            "/conformance" if self.broken_conformance => (200, "<html>oops</html>".to_string()),
            "/conformance" => (
                200,
                json!({"conformsTo": ["http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/core"]})
                    .to_string(),
            ),
            "/openapi" => (200, json!({"openapi": "3.0.2", "info": {}, "paths": {}}).to_string()),
            "/collections" => {
                (200, json!({"collections": [{"id": self.collection}], "links": []}).to_string())
            }
            _ if path == collection_path => {
                (200, json!({"id": self.collection, "title": "Amazonas", "links": []}).to_string())
            }
            _ if path == items_path => {
                if query("bbox").is_some() && self.bbox_status != 200 {
                    return (self.bbox_status, json!({"code": "InvalidParameterValue"}).to_string());
                }
                let limit = query("limit").and_then(|value| value.parse::<usize>().ok()).unwrap_or(10);
                let page = if self.honour_limit {
                    limit.min(self.feature_total)
                } else {
                    self.feature_total
                };
                let features: Vec<Value> = (0..page).map(|index| self.feature(index)).collect();
                (
                    200,
                    json!({
                        "type": "FeatureCollection",
                        "features": features,
                        "numberMatched": self.feature_total,
                        "numberReturned": page,
                        "links": []
                    })
                    .to_string(),
                )
            }
            _ if path.starts_with(&format!("{items_path}/")) => {
                let id = &path[items_path.len() + 1 ..];
                let known = (0..self.feature_total).map(|index| self.feature(index)).find(|feature| {
                    match &feature["id"] {
                        Value::String(text) => encoded_segment(text) == id,
                        other => other.to_string() == id,
                    }
                });
                match known {
                    Some(feature) if self.feature_status == 200 => (200, feature.to_string()),
                    _ => (
                        if self.feature_status == 200 { 404 } else { self.feature_status },
                        json!({"code": "NotFound"}).to_string(),
                    ),
                }
            }
            _ => (self.missing_status, json!({"code": "NotFound", "description": "not found"}).to_string()),
        }
    }
}

// ============================================================================
// SECTION: Stub Server
// ============================================================================

/// Running stub server; stops on drop.
pub struct StubServer {
    /// Base URL of the stub.
    pub base_url: String,
    /// Server handle used to unblock the worker.
    server: Arc<Server>,
    /// Raw request targets in arrival order.
    requests: Arc<Mutex<Vec<String>>>,
    /// Worker thread.
    handle: Option<JoinHandle<()>>,
}

/// JSON content type header.
fn json_header() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap()
}

impl StubServer {
    /// Starts a stub answering with `api`.
    pub fn start(api: StubApi) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap();
        let worker = Arc::clone(&server);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            for request in worker.incoming_requests() {
                let raw = request.url().to_string();
                log.lock().unwrap().push(raw.clone());
                let _ = match raw.as_str() {
                    REDIRECT_PATH => {
                        let location =
                            Header::from_bytes(&b"Location"[..], &b"/collections"[..]).unwrap();
                        request.respond(Response::empty(StatusCode(302)).with_header(location))
                    }
                    OVERSIZED_PATH => request.respond(
                        Response::from_string("x".repeat(OVERSIZED_BODY_BYTES))
                            .with_header(json_header()),
                    ),
                    OVERSIZED_CHUNKED_PATH => request.respond(Response::new(
                        StatusCode(200),
                        vec![json_header()],
                        Cursor::new(vec![b'x'; OVERSIZED_BODY_BYTES]),
                        None,
                        None,
                    )),
                    _ => {
                        let (status, body) = api.respond(&raw);
                        request.respond(
                            Response::from_string(body)
                                .with_status_code(status)
                                .with_header(json_header()),
                        )
                    }
                };
            }
        });
        Self {
            base_url: format!("http://{addr}"),
            server,
            requests,
            handle: Some(handle),
        }
    }

    /// Returns the raw request targets received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
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

// ============================================================================
// SECTION: Clients
// ============================================================================

/// Builds short-timeout settings for `base_url` and `collection`.
pub fn settings_for(base_url: &str, collection: &str) -> SmokeSettings {
    SmokeSettings::from_config(&SmokeConfig {
        base_url: base_url.to_string(),
        collection: collection.to_string(),
        timeout_ms: 2_000,
        preflight_timeout_ms: 1_000,
        ..SmokeConfig::default()
    })
    .unwrap()
}

/// Builds a client with short timeouts for `base_url`.
pub fn client_for(base_url: &str) -> SmokeClient {
    SmokeClient::new(settings_for(base_url, "amazonas")).unwrap()
}

/// Builds a client whose response bodies are capped at `max_bytes`.
pub fn capped_client_for(base_url: &str, max_bytes: usize) -> SmokeClient {
    let mut settings = settings_for(base_url, "amazonas");
    settings.max_response_bytes = max_bytes;
    SmokeClient::new(settings).unwrap()
}

/// Returns a loopback URL with nothing listening.
pub fn unused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
