// crates/geoprobe-smoke/src/report.rs
// ============================================================================
// Module: Smoke Reports
// Description: Per-check outcomes and the suite summary.
// Purpose: Carry structured results from the suite to renderers.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`CheckReport`] records what one check observed as an ordered list of
//! [`CheckDetail`] facts. Renderers decide how each fact is worded; the suite
//! only decides `passed`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Check Reports
// ============================================================================

/// Stable identifiers for the checks in the fixed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckId {
    /// `GET /`.
    Landing,
    /// `GET /conformance`.
    Conformance,
    /// `GET /openapi`.
    OpenApi,
    /// `GET /collections`.
    Collections,
    /// `GET /collections/{id}`.
    Collection,
    /// `GET /collections/{id}/items`.
    Items,
    /// `GET /collections/{id}/items?limit=5`.
    ItemsLimited,
    /// Single feature retrieval.
    FeatureRetrieval,
    /// Limit and bbox queries.
    Filters,
    /// Missing path answering 404.
    NotFound,
}

impl CheckId {
    /// Returns the check family.
    #[must_use]
    pub const fn kind(self) -> CheckKind {
        match self {
            Self::FeatureRetrieval => CheckKind::FeatureRetrieval,
            Self::Filters => CheckKind::Filters,
            _ => CheckKind::Endpoint,
        }
    }
}

/// Check families in the fixed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Single GET with an expected status and optional JSON check.
    Endpoint,
    /// List one item then fetch it by identifier.
    FeatureRetrieval,
    /// Limit and bbox query parameter checks.
    Filters,
}

/// A fact observed while running a check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "detail", rename_all = "snake_case")]
pub enum CheckDetail {
    /// Status code comparison.
    Status {
        /// Expected status.
        expected: u16,
        /// Observed status.
        actual: u16,
    },
    /// Body parsed as JSON.
    JsonValid {
        /// Up to five top-level keys in server order.
        keys: Vec<String>,
    },
    /// Body did not parse as JSON.
    JsonInvalid {
        /// Parser error text.
        error: String,
    },
    /// Length of the `features` array.
    FeatureCount {
        /// Number of features in the response.
        count: usize,
    },
    /// `numberMatched` as sent by the server.
    NumberMatched {
        /// Raw value.
        value: Value,
    },
    /// `numberReturned` as sent by the server.
    NumberReturned {
        /// Raw value.
        value: Value,
    },
    /// Identifier taken from the first listed feature.
    FeatureId {
        /// Identifier rendered as text.
        id: String,
    },
    /// Feature fetched by identifier.
    FeatureSummary {
        /// `id` member, if present.
        id: Option<String>,
        /// `type` member, if present.
        feature_type: Option<String>,
        /// `geometry.type` member, if present.
        geometry_type: Option<String>,
    },
    /// Fetching the feature by identifier did not return 200.
    FeatureFetchFailed {
        /// Observed status.
        status: u16,
    },
    /// The listing returned no features to fetch.
    NoFeatures,
    /// The listing response could not be used.
    ListingUnusable {
        /// Reason text.
        reason: String,
    },
    /// One `limit` query.
    LimitQuery {
        /// Requested limit.
        limit: u32,
        /// Returned count, absent when the request failed.
        returned: Option<u64>,
        /// Whether the query passed.
        passed: bool,
    },
    /// The `bbox` query.
    BboxQuery {
        /// Queried bounding box.
        bbox: [f64; 4],
        /// Observed status, absent when the request failed.
        status: Option<u16>,
        /// `numberReturned` when the response was JSON.
        returned: Option<u64>,
        /// Whether the query passed.
        passed: bool,
    },
    /// Transport-level failure.
    TransportError {
        /// Error text.
        error: String,
    },
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckReport {
    /// Plan identifier.
    pub id: CheckId,
    /// Display name.
    pub name: String,
    /// Endpoint path (with query) for endpoint checks.
    pub endpoint: Option<String>,
    /// Check family.
    pub kind: CheckKind,
    /// Whether the check passed.
    pub passed: bool,
    /// Observed facts in order.
    pub details: Vec<CheckDetail>,
}

// ============================================================================
// SECTION: Suite Report
// ============================================================================

/// Outcome of a full suite run.
///
/// # Invariants
/// - `checks` preserves plan order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteReport {
    /// Base URL under test.
    pub base_url: String,
    /// Collection exercised.
    pub collection: String,
    /// Check outcomes in plan order.
    pub checks: Vec<CheckReport>,
}

impl SuiteReport {
    /// Number of checks run.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.checks.len()
    }

    /// Number of passing checks.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|check| check.passed).count()
    }

    /// Number of failing checks.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// True when every check passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }
}
