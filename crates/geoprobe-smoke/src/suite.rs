// crates/geoprobe-smoke/src/suite.rs
// ============================================================================
// Module: Smoke Suite
// Description: Fixed plan of OGC API - Features checks.
// Purpose: Run every check in order and collect pass/fail outcomes.
// Dependencies: serde_json, tracing
// ============================================================================

//! ## Overview
//! The plan is fixed: seven endpoint checks, feature retrieval, the filter
//! queries, and a 404 check. Checks never abort the run; a transport failure
//! fails only the check that hit it.
//!
//! Invariants:
//! - Checks run sequentially in plan order.
//! - The observer sees each report exactly once, before the next check starts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use tracing::debug;
use tracing::info;

use crate::client::SmokeClient;
use crate::client::SmokeError;
use crate::client::SmokeSettings;
use crate::report::CheckDetail;
use crate::report::CheckId;
use crate::report::CheckReport;
use crate::report::SuiteReport;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of top-level JSON keys reported per response.
pub const REPORTED_KEYS: usize = 5;
/// Page size of the `limit` endpoint check.
const ITEMS_LIMITED_PAGE: u32 = 5;

// ============================================================================
// SECTION: Plan
// ============================================================================

/// One entry of the fixed plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedCheck {
    /// GET `path` expecting `expected_status`.
    Endpoint {
        /// Plan identifier.
        id: CheckId,
        /// Display name.
        name: String,
        /// Encoded path and query relative to the base URL.
        path: String,
        /// Expected status code.
        expected_status: u16,
        /// Whether the body must parse as JSON.
        check_json: bool,
    },
    /// List one item, then fetch it by identifier.
    FeatureRetrieval,
    /// Limit and bbox queries.
    Filters,
}

/// Builds the fixed plan for the configured collection.
///
/// Display names carry the raw collection id; paths carry the encoded one.
#[must_use]
pub fn plan(settings: &SmokeSettings) -> Vec<PlannedCheck> {
    let collection = &settings.collection;
    let items = settings.items_path();
    let endpoint = |id, name: String, path: String| PlannedCheck::Endpoint {
        id,
        name,
        path,
        expected_status: 200,
        check_json: true,
    };
    vec![
        endpoint(CheckId::Landing, "Landing Page".to_string(), "/".to_string()),
        endpoint(CheckId::Conformance, "Conformance".to_string(), "/conformance".to_string()),
        endpoint(CheckId::OpenApi, "OpenAPI Specification".to_string(), "/openapi".to_string()),
        endpoint(CheckId::Collections, "Collections".to_string(), "/collections".to_string()),
        endpoint(
            CheckId::Collection,
            format!("Collection {collection}"),
            settings.collection_path().to_string(),
        ),
        endpoint(CheckId::Items, format!("{collection} Items"), items.clone()),
        endpoint(
            CheckId::ItemsLimited,
            format!("{collection} Items (limit={ITEMS_LIMITED_PAGE})"),
            format!("{items}?limit={ITEMS_LIMITED_PAGE}"),
        ),
        PlannedCheck::FeatureRetrieval,
        PlannedCheck::Filters,
        PlannedCheck::Endpoint {
            id: CheckId::NotFound,
            name: "404 Not Found".to_string(),
            path: settings.missing_path.clone(),
            expected_status: 404,
            check_json: false,
        },
    ]
}

// ============================================================================
// SECTION: JSON Helpers
// ============================================================================

/// Returns up to [`REPORTED_KEYS`] top-level keys in server order.
///
/// Non-object documents have no keys.
#[must_use]
pub fn top_keys(document: &Value) -> Vec<String> {
    document
        .as_object()
        .map(|map| map.keys().take(REPORTED_KEYS).cloned().collect())
        .unwrap_or_default()
}

/// Returns the item count a page reports.
///
/// Uses `numberReturned` when it is a non-negative integer, else the length
/// of `features`, else 0.
#[must_use]
pub fn returned_count(document: &Value) -> u64 {
    if let Some(returned) = document.get("numberReturned").and_then(Value::as_u64) {
        return returned;
    }
    document
        .get("features")
        .and_then(Value::as_array)
        .map_or(0, |features| u64::try_from(features.len()).unwrap_or(u64::MAX))
}

/// Returns whether a page honours the requested limit.
#[must_use]
pub fn limit_respected(limit: u32, returned: u64) -> bool {
    returned <= u64::from(limit)
}

/// Renders a feature identifier (string or number) as text.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Reads an optional string member.
fn string_member(document: &Value, key: &str) -> Option<String> {
    document.get(key).and_then(Value::as_str).map(ToString::to_string)
}

/// Formats a bbox query value without trailing zeros.
fn bbox_param(bbox: &[f64; 4]) -> String {
    bbox.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

// ============================================================================
// SECTION: Suite
// ============================================================================

/// Runs the fixed plan against one server.
pub struct SmokeSuite<'a> {
    /// Client bound to the server under test.
    client: &'a SmokeClient,
}

impl<'a> SmokeSuite<'a> {
    /// Creates a suite over a client.
    #[must_use]
    pub const fn new(client: &'a SmokeClient) -> Self {
        Self {
            client,
        }
    }

    /// Runs every check, calling `observer` after each one.
    pub fn run<F>(&self, mut observer: F) -> SuiteReport
    where
        F: FnMut(&CheckReport),
    {
        let settings = self.client.settings();
        let mut checks = Vec::new();
        for planned in plan(settings) {
            let report = match planned {
                PlannedCheck::Endpoint {
                    id,
                    name,
                    path,
                    expected_status,
                    check_json,
                } => self.endpoint_check(id, name, path, expected_status, check_json),
                PlannedCheck::FeatureRetrieval => self.feature_retrieval(),
                PlannedCheck::Filters => self.filters(),
            };
            if report.passed {
                info!(check = %report.name, "check passed");
            } else {
                debug!(check = %report.name, details = report.details.len(), "check failed");
            }
            observer(&report);
            checks.push(report);
        }
        SuiteReport {
            base_url: settings.base().to_string(),
            collection: settings.collection.clone(),
            checks,
        }
    }

    /// Single GET with expected status and optional JSON summary.
    fn endpoint_check(
        &self,
        id: CheckId,
        name: String,
        path: String,
        expected_status: u16,
        check_json: bool,
    ) -> CheckReport {
        let mut details = Vec::new();
        let passed = match self.client.get(&path) {
            Err(err) => {
                details.push(transport_detail(&err));
                false
            }
            Ok(reply) => {
                details.push(CheckDetail::Status {
                    expected: expected_status,
                    actual: reply.status,
                });
                let status_ok = reply.status == expected_status;
                if check_json && status_ok {
                    match reply.json() {
                        Ok(document) => {
                            summarize_document(&document, &mut details);
                            true
                        }
                        Err(err) => {
                            details.push(CheckDetail::JsonInvalid {
                                error: err.to_string(),
                            });
                            false
                        }
                    }
                } else {
                    status_ok
                }
            }
        };
        CheckReport {
            id,
            name,
            endpoint: Some(path),
            kind: id.kind(),
            passed,
            details,
        }
    }

    /// Lists one feature and fetches it by identifier.
    fn feature_retrieval(&self) -> CheckReport {
        let mut details = Vec::new();
        let passed = self.feature_retrieval_steps(&mut details);
        CheckReport {
            id: CheckId::FeatureRetrieval,
            name: "Feature Retrieval".to_string(),
            endpoint: None,
            kind: CheckId::FeatureRetrieval.kind(),
            passed,
            details,
        }
    }

    /// Feature retrieval body; returns whether the check passed.
    fn feature_retrieval_steps(&self, details: &mut Vec<CheckDetail>) -> bool {
        let items = self.client.settings().items_path();
        let listing = match self.client.get(&format!("{items}?limit=1")) {
            Ok(reply) => reply,
            Err(err) => {
                details.push(transport_detail(&err));
                return false;
            }
        };
        let document = match listing.json() {
            Ok(document) => document,
            Err(err) => {
                details.push(CheckDetail::ListingUnusable {
                    reason: err.to_string(),
                });
                return false;
            }
        };
        let Some(first) =
            document.get("features").and_then(Value::as_array).and_then(|features| features.first())
        else {
            details.push(CheckDetail::NoFeatures);
            return true;
        };
        let Some(id) = first.get("id").and_then(id_text) else {
            details.push(CheckDetail::ListingUnusable {
                reason: "first feature has no id".to_string(),
            });
            return false;
        };
        details.push(CheckDetail::FeatureId {
            id: id.clone(),
        });
        let url = match self.feature_url(&items, &id) {
            Ok(url) => url,
            Err(err) => {
                details.push(transport_detail(&err));
                return false;
            }
        };
        let reply = match self.client.get_url(url) {
            Ok(reply) => reply,
            Err(err) => {
                details.push(transport_detail(&err));
                return false;
            }
        };
        if reply.status != 200 {
            details.push(CheckDetail::FeatureFetchFailed {
                status: reply.status,
            });
            return false;
        }
        match reply.json() {
            Ok(feature) => {
                details.push(CheckDetail::FeatureSummary {
                    id: feature.get("id").and_then(id_text),
                    feature_type: string_member(&feature, "type"),
                    geometry_type: feature
                        .get("geometry")
                        .and_then(|geometry| string_member(geometry, "type")),
                });
                true
            }
            Err(err) => {
                details.push(CheckDetail::JsonInvalid {
                    error: err.to_string(),
                });
                false
            }
        }
    }

    /// Builds the item URL with the identifier as an encoded path segment.
    fn feature_url(&self, items: &str, id: &str) -> Result<url::Url, SmokeError> {
        let mut url = self.client.settings().endpoint_url(items)?;
        let shown = url.to_string();
        url.path_segments_mut()
            .map_err(|()| SmokeError::InvalidUrl(format!("{shown} cannot hold a path")))?
            .push(id);
        Ok(url)
    }

    /// Limit and bbox queries; passes when every query passes.
    ///
    /// Each query detail is followed by the error detail that failed it.
    fn filters(&self) -> CheckReport {
        let settings = self.client.settings();
        let items = settings.items_path();
        let mut details = Vec::new();
        let mut all_passed = true;
        for &limit in &settings.limits {
            let mut failure = None;
            let returned = match self.client.get(&format!("{items}?limit={limit}")) {
                Err(err) => {
                    failure = Some(transport_detail(&err));
                    None
                }
                Ok(reply) => match reply.json() {
                    Ok(document) => Some(returned_count(&document)),
                    Err(err) => {
                        failure = Some(CheckDetail::JsonInvalid {
                            error: err.to_string(),
                        });
                        None
                    }
                },
            };
            let passed = returned.is_some_and(|returned| limit_respected(limit, returned));
            all_passed &= passed;
            details.push(CheckDetail::LimitQuery {
                limit,
                returned,
                passed,
            });
            details.extend(failure);
        }

        let bbox = settings.bbox;
        let mut failure = None;
        let (status, returned) =
            match self.client.get(&format!("{items}?bbox={}", bbox_param(&bbox))) {
                Err(err) => {
                    failure = Some(transport_detail(&err));
                    (None, None)
                }
                Ok(reply) if reply.status == 200 => match reply.json() {
                    Ok(document) => (Some(reply.status), Some(returned_count(&document))),
                    Err(err) => {
                        failure = Some(CheckDetail::JsonInvalid {
                            error: err.to_string(),
                        });
                        (Some(reply.status), None)
                    }
                },
                Ok(reply) => (Some(reply.status), None),
            };
        let passed = status == Some(200) && returned.is_some();
        all_passed &= passed;
        details.push(CheckDetail::BboxQuery {
            bbox,
            status,
            returned,
            passed,
        });
        details.extend(failure);

        CheckReport {
            id: CheckId::Filters,
            name: "Filters and Parameters".to_string(),
            endpoint: None,
            kind: CheckId::Filters.kind(),
            passed: all_passed,
            details,
        }
    }
}

/// Appends the JSON summary facts for a response document.
fn summarize_document(document: &Value, details: &mut Vec<CheckDetail>) {
    details.push(CheckDetail::JsonValid {
        keys: top_keys(document),
    });
    if let Some(features) = document.get("features").and_then(Value::as_array) {
        details.push(CheckDetail::FeatureCount {
            count: features.len(),
        });
    }
    if let Some(value) = document.get("numberMatched") {
        details.push(CheckDetail::NumberMatched {
            value: value.clone(),
        });
    }
    if let Some(value) = document.get("numberReturned") {
        details.push(CheckDetail::NumberReturned {
            value: value.clone(),
        });
    }
}

/// Converts a client error into a transport detail.
fn transport_detail(err: &SmokeError) -> CheckDetail {
    CheckDetail::TransportError {
        error: err.to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
