// crates/geoprobe-cli/src/render.rs
// ============================================================================
// Module: CLI Text Rendering
// Description: Localized text renderings of inspection and smoke reports.
// Purpose: Keep wording and layout out of the command dispatcher.
// Dependencies: geoprobe-gpkg, geoprobe-smoke, serde_json
// ============================================================================

//! ## Overview
//! Renderers take report values and return finished text. Every string goes
//! through [`t!`](crate::t); colors are applied by a [`Palette`] that is a
//! no-op when color is disabled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use geoprobe_gpkg::AccessReport;
use geoprobe_gpkg::GeoPackageReport;
use geoprobe_gpkg::LayerReport;
use geoprobe_smoke::CheckDetail;
use geoprobe_smoke::CheckId;
use geoprobe_smoke::CheckKind;
use geoprobe_smoke::CheckReport;
use geoprobe_smoke::SuiteReport;
use serde_json::Value;

use crate::t;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Rule width for inspection output.
const INSPECT_RULE_WIDTH: usize = 70;
/// Rule width for check and smoke output.
const CHECK_RULE_WIDTH: usize = 60;
/// Maximum sample values listed by the access check.
pub const ACCESS_FIELD_PREVIEW: usize = 5;

// ============================================================================
// SECTION: Palette
// ============================================================================

/// ANSI color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Whether escape codes are emitted.
    enabled: bool,
}

impl Palette {
    /// Creates a palette.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled,
        }
    }

    /// Wraps text in an ANSI color code.
    fn paint(self, code: &str, text: &str) -> String {
        if self.enabled { format!("\u{1b}[{code}m{text}\u{1b}[0m") } else { text.to_string() }
    }

    /// Success color.
    #[must_use]
    pub fn green(self, text: &str) -> String {
        self.paint("92", text)
    }

    /// Failure color.
    #[must_use]
    pub fn red(self, text: &str) -> String {
        self.paint("91", text)
    }

    /// Warning color.
    #[must_use]
    pub fn yellow(self, text: &str) -> String {
        self.paint("93", text)
    }

    /// Heading color.
    #[must_use]
    pub fn blue(self, text: &str) -> String {
        self.paint("94", text)
    }
}

/// Accumulates output lines.
#[derive(Default)]
struct Lines(Vec<String>);

impl Lines {
    /// Appends one line.
    fn push(&mut self, line: impl Into<String>) {
        self.0.push(line.into());
    }

    /// Appends a blank line.
    fn blank(&mut self) {
        self.0.push(String::new());
    }

    /// Joins lines with a trailing newline.
    fn finish(self) -> String {
        let mut text = self.0.join("\n");
        text.push('\n');
        text
    }
}

/// Returns a horizontal rule.
fn rule(ch: char, width: usize) -> String {
    std::iter::repeat_n(ch, width).collect()
}

// ============================================================================
// SECTION: Inspect
// ============================================================================

/// Renders the full inspection report.
#[must_use]
pub fn inspect_text(report: &GeoPackageReport) -> String {
    let mut lines = Lines::default();
    lines.push(t!("inspect.header", path = report.path));
    lines.push(t!("inspect.layer_count", count = report.layers.len()));
    lines.push(rule('=', INSPECT_RULE_WIDTH));
    for layer in &report.layers {
        render_layer(layer, &mut lines);
    }
    lines.blank();
    lines.push(rule('=', INSPECT_RULE_WIDTH));
    lines.push(t!("inspect.done"));
    lines.finish()
}

/// Renders one layer block.
fn render_layer(layer: &LayerReport, lines: &mut Lines) {
    lines.blank();
    lines.push(t!("inspect.layer.header", index = layer.index, name = layer.name));
    lines.push(rule('-', INSPECT_RULE_WIDTH));
    lines.push(t!("inspect.layer.features", count = layer.feature_count));
    lines.push(t!("inspect.layer.geometry", geometry = layer.geometry_type));
    match &layer.spatial_ref {
        Some(srs) => {
            let label = srs.authority().unwrap_or_else(|| srs.name.clone());
            lines.push(t!("inspect.layer.srs", srs = label));
        }
        None => lines.push(t!("inspect.layer.srs_none")),
    }
    match &layer.extent {
        Some(extent) => {
            lines.push(t!("inspect.layer.extent"));
            lines.push(t!(
                "inspect.layer.extent_x",
                min = format!("{:.6}", extent.min_x),
                max = format!("{:.6}", extent.max_x)
            ));
            lines.push(t!(
                "inspect.layer.extent_y",
                min = format!("{:.6}", extent.min_y),
                max = format!("{:.6}", extent.max_y)
            ));
            let [min_x, min_y, max_x, max_y] = extent.bbox();
            lines.push(t!(
                "inspect.layer.bbox",
                min_x = format!("{min_x:.2}"),
                min_y = format!("{min_y:.2}"),
                max_x = format!("{max_x:.2}"),
                max_y = format!("{max_y:.2}")
            ));
        }
        None => lines.push(t!("inspect.layer.extent_none")),
    }
    lines.push(t!("inspect.layer.fields", count = layer.fields.len()));
    for field in &layer.fields {
        lines.push(t!(
            "inspect.layer.field",
            name = field.name,
            field_type = field.field_type,
            width = field.width
        ));
    }
    if let Some(sample) = &layer.sample {
        lines.push(t!("inspect.layer.sample", fid = sample.fid));
        for (name, value) in &sample.values {
            lines.push(t!("inspect.layer.sample_value", name = name, value = value));
        }
    }
}

// ============================================================================
// SECTION: Check
// ============================================================================

/// Renders the access check header.
#[must_use]
pub fn check_header_text(path: &str) -> String {
    let mut lines = Lines::default();
    lines.push(t!("check.header", path = path));
    lines.push(rule('=', CHECK_RULE_WIDTH));
    lines.finish()
}

/// Renders the open failure with remediation hints.
#[must_use]
pub fn check_open_failed_text(error: &str, palette: Palette) -> String {
    let mut lines = Lines::default();
    lines.push(palette.red(&t!("check.open_failed", error = error)));
    lines.push(t!("check.hint.header"));
    lines.push(t!("check.hint.exists"));
    lines.push(t!("check.hint.permissions"));
    lines.push(t!("check.hint.format"));
    lines.finish()
}

/// Renders a successful access check.
#[must_use]
pub fn access_text(report: &AccessReport, palette: Palette) -> String {
    let mut lines = Lines::default();
    lines.push(palette.green(&t!("check.layer_count", count = report.layer_count)));
    lines.push(palette.green(&t!("check.layer", name = report.layer)));
    lines.push(palette.green(&t!("check.features", count = report.feature_count)));
    match &report.sample {
        None => lines.push(palette.yellow(&t!("check.empty_layer"))),
        Some(sample) => {
            lines.push(palette.green(&t!("check.feature_read", fid = sample.fid)));
            lines.push(palette.green(&t!("check.field_count", count = report.field_count)));
            if report.field_count > 0 {
                lines.push(t!("check.fields_header"));
                for (name, value) in sample.values.iter().take(ACCESS_FIELD_PREVIEW) {
                    lines.push(t!("check.field", name = name, value = value));
                }
                if report.field_count > ACCESS_FIELD_PREVIEW {
                    lines.push(t!(
                        "check.more_fields",
                        count = report.field_count - ACCESS_FIELD_PREVIEW
                    ));
                }
            }
        }
    }
    lines.push(rule('=', CHECK_RULE_WIDTH));
    lines.push(palette.green(&t!("check.done")));
    lines.blank();
    lines.push(t!("check.ready"));
    lines.finish()
}

// ============================================================================
// SECTION: Smoke
// ============================================================================

/// Renders the smoke banner.
#[must_use]
pub fn smoke_banner_text(collection: &str) -> String {
    let mut lines = Lines::default();
    lines.push(rule('=', CHECK_RULE_WIDTH));
    lines.push(t!("smoke.banner", collection = collection));
    lines.push(rule('=', CHECK_RULE_WIDTH));
    lines.finish()
}

/// Renders the reachable preflight line.
#[must_use]
pub fn smoke_reachable_text(url: &str, palette: Palette) -> String {
    let mut lines = Lines::default();
    lines.push(palette.green(&t!("smoke.reachable", url = url)));
    lines.finish()
}

/// Renders the unreachable preflight failure.
#[must_use]
pub fn smoke_unreachable_text(url: &str, palette: Palette) -> String {
    let mut lines = Lines::default();
    lines.push(palette.red(&t!("smoke.unreachable", url = url)));
    lines.blank();
    lines.push(t!("smoke.unreachable_hint"));
    lines.push(t!("smoke.unreachable_command"));
    lines.finish()
}

/// Returns the localized display name of a check.
#[must_use]
pub fn check_name(id: CheckId, collection: &str) -> String {
    match id {
        CheckId::Landing => t!("smoke.name.landing"),
        CheckId::Conformance => t!("smoke.name.conformance"),
        CheckId::OpenApi => t!("smoke.name.openapi"),
        CheckId::Collections => t!("smoke.name.collections"),
        CheckId::Collection => t!("smoke.name.collection", collection = collection),
        CheckId::Items => t!("smoke.name.items", collection = collection),
        CheckId::ItemsLimited => t!("smoke.name.items_limited", collection = collection),
        CheckId::FeatureRetrieval => t!("smoke.name.feature_retrieval"),
        CheckId::Filters => t!("smoke.name.filters"),
        CheckId::NotFound => t!("smoke.name.not_found"),
    }
}

/// Renders one check block.
#[must_use]
pub fn check_text(check: &CheckReport, collection: &str, palette: Palette) -> String {
    let mut lines = Lines::default();
    lines.blank();
    lines.push(palette.blue(&t!("smoke.check.header", name = check_name(check.id, collection))));
    if let Some(endpoint) = &check.endpoint {
        lines.push(t!("smoke.check.endpoint", endpoint = endpoint));
    }
    lines.push(rule('-', CHECK_RULE_WIDTH));
    let mut limit_header_done = false;
    for detail in &check.details {
        if matches!(detail, CheckDetail::LimitQuery { .. }) && !limit_header_done {
            limit_header_done = true;
            lines.blank();
            lines.push(t!("smoke.filters.limit_header"));
        }
        render_detail(detail, check.id.kind(), palette, &mut lines);
    }
    lines.finish()
}

/// Renders a single check detail.
fn render_detail(detail: &CheckDetail, kind: CheckKind, palette: Palette, lines: &mut Lines) {
    match detail {
        CheckDetail::Status {
            expected,
            actual,
        } => {
            if expected == actual {
                lines.push(palette.green(&t!("smoke.status_ok", status = actual)));
            } else {
                lines.push(palette.red(&t!(
                    "smoke.status_bad",
                    status = actual,
                    expected = expected
                )));
            }
        }
        CheckDetail::JsonValid {
            keys,
        } => {
            lines.push(palette.green(&t!("smoke.json_ok")));
            lines.push(t!("smoke.json_keys", keys = keys.join(", ")));
        }
        CheckDetail::JsonInvalid {
            ..
        } => lines.push(palette.red(&t!("smoke.json_invalid"))),
        CheckDetail::FeatureCount {
            count,
        } => lines.push(t!("smoke.feature_count", count = count)),
        CheckDetail::NumberMatched {
            value,
        } => lines.push(t!("smoke.number_matched", value = plain_value(value))),
        CheckDetail::NumberReturned {
            value,
        } => lines.push(t!("smoke.number_returned", value = plain_value(value))),
        CheckDetail::FeatureId {
            id,
        } => lines.push(t!("smoke.feature.id", id = id)),
        CheckDetail::FeatureSummary {
            id,
            feature_type,
            geometry_type,
        } => {
            lines.push(palette.green(&t!("smoke.feature.ok")));
            lines.push(t!("smoke.feature.summary_id", value = or_none(id.as_deref())));
            lines.push(t!("smoke.feature.summary_type", value = or_none(feature_type.as_deref())));
            lines.push(t!(
                "smoke.feature.summary_geometry",
                value = or_none(geometry_type.as_deref())
            ));
        }
        CheckDetail::FeatureFetchFailed {
            status,
        } => lines.push(palette.red(&t!("smoke.feature.fetch_failed", status = status))),
        CheckDetail::NoFeatures => lines.push(palette.yellow(&t!("smoke.feature.none"))),
        CheckDetail::ListingUnusable {
            reason,
        } => lines.push(palette.red(&t!("smoke.feature.listing_unusable", reason = reason))),
        CheckDetail::LimitQuery {
            limit,
            returned,
            ..
        } => match returned {
            Some(returned) => {
                lines.push(t!("smoke.filters.limit", limit = limit, returned = returned));
            }
            None => lines.push(palette.red(&t!("smoke.filters.limit_failed", limit = limit))),
        },
        CheckDetail::BboxQuery {
            returned,
            passed,
            ..
        } => {
            lines.blank();
            lines.push(t!("smoke.filters.bbox_header"));
            if *passed {
                lines.push(palette.green(&t!("smoke.filters.bbox_ok")));
                lines.push(t!("smoke.filters.bbox_returned", count = returned.unwrap_or(0)));
            } else {
                lines.push(palette.red(&t!("smoke.filters.bbox_failed")));
            }
        }
        CheckDetail::TransportError {
            error,
        } => {
            let line = t!("smoke.transport_error", error = error);
            if kind == CheckKind::Filters {
                lines.push(palette.red(&format!("   {line}")));
            } else {
                lines.push(palette.red(&line));
            }
        }
    }
}

/// Renders the run summary and closing hints.
#[must_use]
pub fn summary_text(report: &SuiteReport, palette: Palette) -> String {
    let mut lines = Lines::default();
    lines.blank();
    lines.push(rule('=', CHECK_RULE_WIDTH));
    lines.push(t!("smoke.summary.header"));
    lines.push(rule('=', CHECK_RULE_WIDTH));
    lines.push(t!("smoke.summary.total", count = report.total()));
    lines.push(palette.green(&t!("smoke.summary.passed", count = report.passed())));
    let failed = t!("smoke.summary.failed", count = report.failed());
    lines.push(if report.failed() > 0 { palette.red(&failed) } else { failed });
    lines.blank();
    lines.push(rule('=', CHECK_RULE_WIDTH));
    let url = report.base_url.as_str();
    if report.all_passed() {
        lines.push(palette.green(&t!("smoke.summary.all_passed")));
        lines.blank();
        lines.push(t!("smoke.summary.server_ok"));
        lines.blank();
        lines.push(t!("smoke.summary.links"));
        lines.push(t!("smoke.summary.link_landing", url = url));
        lines.push(t!("smoke.summary.link_docs", url = url));
        lines.push(t!("smoke.summary.link_collections", url = url));
        lines.push(t!("smoke.summary.link_items", url = url, collection = report.collection));
    } else {
        lines.push(palette.red(&t!("smoke.summary.some_failed")));
        lines.blank();
        lines.push(t!("smoke.summary.logs_hint"));
        lines.push(t!("smoke.summary.logs_command"));
    }
    lines.finish()
}

/// Renders a JSON scalar without string quotes.
fn plain_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Substitutes the localized "none" label for a missing member.
fn or_none(value: Option<&str>) -> String {
    value.map_or_else(|| t!("smoke.value.none"), ToString::to_string)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[path = "tests/render.rs"]
mod tests;
