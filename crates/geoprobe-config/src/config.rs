// crates/geoprobe-config/src/config.rs
// ============================================================================
// Module: geoprobe Configuration
// Description: Configuration loading and validation for geoprobe.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Resolution order: explicit path, then [`CONFIG_ENV_VAR`], then
//! `geoprobe.toml` in the working directory. Only the last source is optional;
//! when it is absent the built-in defaults apply.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "geoprobe.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "GEOPROBE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default GeoPackage inspected when no path argument is given.
pub const DEFAULT_GPKG_PATH: &str = "datos/amazonas.gpkg";
/// Default base URL of the API under test.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
/// Default collection exercised by the smoke suite.
pub const DEFAULT_COLLECTION: &str = "amazonas";
/// Default `SQLite` busy timeout (ms).
pub(crate) const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum `SQLite` busy timeout (ms).
pub(crate) const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;
/// Default per-request timeout (ms).
pub(crate) const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
/// Default reachability check timeout (ms).
pub(crate) const DEFAULT_PREFLIGHT_TIMEOUT_MS: u64 = 5_000;
/// Minimum accepted HTTP timeout (ms).
pub(crate) const MIN_HTTP_TIMEOUT_MS: u64 = 100;
/// Maximum accepted HTTP timeout (ms).
pub(crate) const MAX_HTTP_TIMEOUT_MS: u64 = 120_000;
/// Maximum number of limit queries.
pub(crate) const MAX_LIMIT_QUERIES: usize = 16;
/// Maximum length of a collection identifier.
pub(crate) const MAX_COLLECTION_LENGTH: usize = 256;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Root configuration for geoprobe tools.
///
/// # Invariants
/// - All sections are validated by [`GeoprobeConfig::validate`] before use.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeoprobeConfig {
    /// GeoPackage inspection settings.
    #[serde(default)]
    pub inspect: InspectConfig,
    /// API smoke test settings.
    #[serde(default)]
    pub smoke: SmokeConfig,
}

impl GeoprobeConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Returns the built-in defaults when neither an explicit path nor the
    /// environment override is set and `geoprobe.toml` does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(resolved) = resolve_path(path)? else {
            return Ok(Self::default());
        };
        Self::load_file(&resolved)
    }

    /// Loads and validates configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is unreadable or invalid.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.inspect.validate()?;
        self.smoke.validate()
    }
}

/// GeoPackage inspection settings.
///
/// # Invariants
/// - `default_path` is non-empty and within path length limits.
/// - `busy_timeout_ms` is at most 60 seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InspectConfig {
    /// GeoPackage opened when no path argument is given.
    #[serde(default = "default_gpkg_path")]
    pub default_path: PathBuf,
    /// `SQLite` busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            default_path: default_gpkg_path(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl InspectConfig {
    /// Validates inspection settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("inspect.default_path", &self.default_path.to_string_lossy())?;
        if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "inspect.busy_timeout_ms must be at most {MAX_BUSY_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }
}

/// API smoke test settings.
///
/// # Invariants
/// - `base_url` is an absolute `http`/`https` URL with a host.
/// - `collection` is non-empty, has no surrounding whitespace, and contains
///   no `/`.
/// - Timeouts fall within `[100, 120000]` milliseconds.
/// - `limits` holds 1..=16 positive values.
/// - `bbox` is `[min_x, min_y, max_x, max_y]` with finite, ordered bounds.
/// - `missing_path` starts with `/`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SmokeConfig {
    /// Base URL of the API under test.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Collection identifier exercised by item checks.
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub timeout_ms: u64,
    /// Reachability check timeout in milliseconds.
    #[serde(default = "default_preflight_timeout_ms")]
    pub preflight_timeout_ms: u64,
    /// Page sizes queried by the limit filter check.
    #[serde(default = "default_limits")]
    pub limits: Vec<u32>,
    /// Bounding box queried by the bbox filter check.
    #[serde(default = "default_bbox")]
    pub bbox: [f64; 4],
    /// Path expected to return 404.
    #[serde(default = "default_missing_path")]
    pub missing_path: String,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            collection: default_collection(),
            timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            preflight_timeout_ms: DEFAULT_PREFLIGHT_TIMEOUT_MS,
            limits: default_limits(),
            bbox: default_bbox(),
            missing_path: default_missing_path(),
        }
    }
}

impl SmokeConfig {
    /// Validates smoke test settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url(&self.base_url)?;
        validate_collection(&self.collection)?;
        validate_timeout("smoke.timeout_ms", self.timeout_ms)?;
        validate_timeout("smoke.preflight_timeout_ms", self.preflight_timeout_ms)?;
        if self.limits.is_empty() || self.limits.len() > MAX_LIMIT_QUERIES {
            return Err(ConfigError::Invalid(format!(
                "smoke.limits must hold between 1 and {MAX_LIMIT_QUERIES} entries"
            )));
        }
        if self.limits.contains(&0) {
            return Err(ConfigError::Invalid("smoke.limits entries must be positive".to_string()));
        }
        let [min_x, min_y, max_x, max_y] = self.bbox;
        if self.bbox.iter().any(|value| !value.is_finite()) {
            return Err(ConfigError::Invalid("smoke.bbox values must be finite".to_string()));
        }
        if min_x > max_x || min_y > max_y {
            return Err(ConfigError::Invalid(
                "smoke.bbox must be ordered as [min_x, min_y, max_x, max_y]".to_string(),
            ));
        }
        if !self.missing_path.starts_with('/') {
            return Err(ConfigError::Invalid("smoke.missing_path must start with '/'".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default GeoPackage path.
fn default_gpkg_path() -> PathBuf {
    PathBuf::from(DEFAULT_GPKG_PATH)
}

/// Default `SQLite` busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Default base URL.
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Default collection identifier.
fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

/// Default per-request timeout.
const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

/// Default reachability check timeout.
const fn default_preflight_timeout_ms() -> u64 {
    DEFAULT_PREFLIGHT_TIMEOUT_MS
}

/// Default limit queries.
fn default_limits() -> Vec<u32> {
    vec![1, 5, 10]
}

/// Default bbox (covers the Amazonas department).
const fn default_bbox() -> [f64; 4] {
    [-75.0, -2.0, -70.0, 2.0]
}

/// Default path expected to answer 404.
fn default_missing_path() -> String {
    "/noexiste".to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
///
/// Returns `None` when only the implicit default applies and it does not exist.
fn resolve_path(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let default_path = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(default_path.is_file().then_some(default_path))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let path = Path::new(trimmed);
    for component in path.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates that the base URL is an absolute HTTP(S) URL.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the URL cannot serve as an API root.
pub fn validate_base_url(value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|err| ConfigError::Invalid(format!("smoke.base_url is not a valid url: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid("smoke.base_url must use http or https".to_string()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Invalid("smoke.base_url must include a host".to_string()));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(ConfigError::Invalid(
            "smoke.base_url must not embed credentials".to_string(),
        ));
    }
    Ok(())
}

/// Validates a collection identifier.
fn validate_collection(value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid("smoke.collection must be non-empty".to_string()));
    }
    if trimmed.len() != value.len() {
        return Err(ConfigError::Invalid(
            "smoke.collection must not have leading or trailing whitespace".to_string(),
        ));
    }
    if trimmed.len() > MAX_COLLECTION_LENGTH {
        return Err(ConfigError::Invalid("smoke.collection exceeds max length".to_string()));
    }
    if trimmed.contains('/') {
        return Err(ConfigError::Invalid("smoke.collection must not contain '/'".to_string()));
    }
    Ok(())
}

/// Validates an HTTP timeout against the accepted range.
fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if !(MIN_HTTP_TIMEOUT_MS ..= MAX_HTTP_TIMEOUT_MS).contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {MIN_HTTP_TIMEOUT_MS} and {MAX_HTTP_TIMEOUT_MS}"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
