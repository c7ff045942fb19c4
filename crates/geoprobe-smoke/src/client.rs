// crates/geoprobe-smoke/src/client.rs
// ============================================================================
// Module: Smoke HTTP Client
// Description: Blocking GET client bound to one API base URL.
// Purpose: Issue bounded requests and capture status plus body.
// Dependencies: geoprobe-config, reqwest, thiserror, tracing, url
// ============================================================================

//! ## Overview
//! [`SmokeClient`] issues plain GET requests relative to the configured base
//! URL. Every request has a timeout and a response size cap; nothing is
//! retried. Transport failures surface as [`SmokeError`] values and are
//! turned into failed checks by the suite.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use geoprobe_config::SmokeConfig;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::redirect::Policy;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of redirects followed per request.
const MAX_REDIRECTS: usize = 10;
/// Default response body cap (16 MiB).
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;
/// User agent sent with every request.
const USER_AGENT: &str = concat!("geoprobe/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Smoke client errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmokeError {
    /// The base URL or a derived endpoint URL is invalid.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// The HTTP client could not be constructed.
    #[error("http client build failed: {0}")]
    ClientBuild(String),
    /// The server did not answer the reachability check.
    #[error("cannot connect to {url}: {error}")]
    Unreachable {
        /// Queried URL.
        url: String,
        /// Transport error text.
        error: String,
    },
    /// A request failed at the transport level.
    #[error("request to {url} failed: {error}")]
    Request {
        /// Requested URL.
        url: String,
        /// Transport error text.
        error: String,
    },
    /// The response body exceeded the size cap.
    #[error("response from {url} exceeds {limit} bytes")]
    TooLarge {
        /// Requested URL.
        url: String,
        /// Configured cap in bytes.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Resolved smoke suite settings.
///
/// # Invariants
/// - `base_url` is an absolute `http`/`https` URL.
/// - `limits` is non-empty.
/// - `collection_path` is `/collections/` plus `collection` encoded as one
///   path segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SmokeSettings {
    /// API base URL.
    pub base_url: Url,
    /// Collection exercised by item checks.
    pub collection: String,
    /// Encoded path of the collection resource.
    collection_path: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Reachability check timeout.
    pub preflight_timeout: Duration,
    /// Page sizes queried by the limit filter.
    pub limits: Vec<u32>,
    /// Bounding box queried by the bbox filter.
    pub bbox: [f64; 4],
    /// Path expected to answer 404.
    pub missing_path: String,
    /// Response body cap in bytes.
    pub max_response_bytes: usize,
}

impl SmokeSettings {
    /// Builds settings from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::InvalidUrl`] when the base URL does not parse.
    pub fn from_config(config: &SmokeConfig) -> Result<Self, SmokeError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|err| SmokeError::InvalidUrl(format!("{}: {err}", config.base_url)))?;
        let collection_path =
            segment_path(&base_url, &["collections", config.collection.as_str()])?;
        Ok(Self {
            base_url,
            collection: config.collection.clone(),
            collection_path,
            timeout: Duration::from_millis(config.timeout_ms),
            preflight_timeout: Duration::from_millis(config.preflight_timeout_ms),
            limits: config.limits.clone(),
            bbox: config.bbox,
            missing_path: config.missing_path.clone(),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        })
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Returns the encoded path of the collection resource.
    #[must_use]
    pub fn collection_path(&self) -> &str {
        &self.collection_path
    }

    /// Returns the encoded path of the collection items resource.
    #[must_use]
    pub fn items_path(&self) -> String {
        format!("{}/items", self.collection_path)
    }

    /// Joins an absolute path (with optional query) onto the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::InvalidUrl`] when the result does not parse.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, SmokeError> {
        let joined = format!("{}{path}", self.base());
        Url::parse(&joined).map_err(|err| SmokeError::InvalidUrl(format!("{joined}: {err}")))
    }
}

/// Builds an absolute path from raw segments, encoding each one.
///
/// Reserved characters such as `#`, `?`, `/`, and spaces stay inside their
/// segment.
fn segment_path(base: &Url, segments: &[&str]) -> Result<String, SmokeError> {
    let mut scratch = base.clone();
    scratch
        .path_segments_mut()
        .map_err(|()| SmokeError::InvalidUrl(format!("{base} cannot hold a path")))?
        .clear()
        .extend(segments);
    Ok(scratch.path().to_string())
}

// ============================================================================
// SECTION: Replies
// ============================================================================

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// Requested URL.
    pub url: Url,
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpReply {
    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the body is not valid JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Blocking HTTP client for the smoke suite.
pub struct SmokeClient {
    /// Resolved settings.
    settings: SmokeSettings,
    /// Underlying reqwest client.
    client: Client,
}

impl SmokeClient {
    /// Builds a client for the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::ClientBuild`] when reqwest cannot build a client.
    pub fn new(settings: SmokeSettings) -> Result<Self, SmokeError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|err| SmokeError::ClientBuild(err.to_string()))?;
        Ok(Self {
            settings,
            client,
        })
    }

    /// Returns the client settings.
    #[must_use]
    pub const fn settings(&self) -> &SmokeSettings {
        &self.settings
    }

    /// Checks that the base URL answers at all.
    ///
    /// Any HTTP status counts as reachable. Returns the status observed.
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::Unreachable`] on transport failure.
    pub fn preflight(&self) -> Result<u16, SmokeError> {
        let url = self.settings.base_url.clone();
        debug!(url = %url, "preflight");
        let response = self
            .client
            .get(url.as_str())
            .timeout(self.settings.preflight_timeout)
            .send()
            .map_err(|err| SmokeError::Unreachable {
                url: self.settings.base().to_string(),
                error: err.to_string(),
            })?;
        Ok(response.status().as_u16())
    }

    /// Issues a GET for a path relative to the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError`] on invalid URLs, transport failure, or an
    /// oversized body.
    pub fn get(&self, path: &str) -> Result<HttpReply, SmokeError> {
        let url = self.settings.endpoint_url(path)?;
        self.get_url(url)
    }

    /// Issues a GET for an absolute URL.
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError`] on transport failure or an oversized body.
    pub fn get_url(&self, url: Url) -> Result<HttpReply, SmokeError> {
        debug!(url = %url, "GET");
        let mut response =
            self.client.get(url.as_str()).send().map_err(|err| SmokeError::Request {
                url: url.to_string(),
                error: err.to_string(),
            })?;
        let status = response.status().as_u16();
        let body = read_response_limited(&mut response, &url, self.settings.max_response_bytes)?;
        debug!(url = %url, status, bytes = body.len(), "response");
        Ok(HttpReply {
            url,
            status,
            body,
        })
    }
}

/// Reads a response body, enforcing a hard size cap.
fn read_response_limited(
    response: &mut Response,
    url: &Url,
    max_bytes: usize,
) -> Result<Vec<u8>, SmokeError> {
    let too_large = || SmokeError::TooLarge {
        url: url.to_string(),
        limit: max_bytes,
    };
    let max_bytes_u64 = u64::try_from(max_bytes).map_err(|_| too_large())?;
    if let Some(expected) = response.content_length()
        && expected > max_bytes_u64
    {
        return Err(too_large());
    }
    let mut buf = Vec::new();
    response.take(max_bytes_u64.saturating_add(1)).read_to_end(&mut buf).map_err(|err| {
        SmokeError::Request {
            url: url.to_string(),
            error: err.to_string(),
        }
    })?;
    if buf.len() > max_bytes {
        return Err(too_large());
    }
    Ok(buf)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
