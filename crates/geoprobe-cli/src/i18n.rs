// crates/geoprobe-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Message catalog and translation utilities for the CLI.
// Purpose: Route every user-facing string through one localized catalog.
// Dependencies: Standard library collections.
// ============================================================================

//! ## Overview
//! geoprobe keeps its user-facing strings in a static catalog with English
//! and Spanish entries. All runtime output goes through the [`t!`](crate::t)
//! macro.
//!
//! ## Invariants
//! - The locale is chosen once per process and read-only thereafter.
//! - Missing keys fall back to English and then to the key itself.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Supported CLI locales.
///
/// # Invariants
/// - [`Locale::En`] is the default fallback locale.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Locale {
    /// English (default).
    En,
    /// Spanish.
    Es,
}

impl Locale {
    /// Returns the canonical locale label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }

    /// Parses a locale value (case-insensitive, tolerant of region tags).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let normalized = value.to_ascii_lowercase();
        let lang = normalized.split(['-', '_', '.']).next().unwrap_or("");
        match lang {
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }
}

/// Ordered list of supported CLI locales.
pub const SUPPORTED_LOCALES: &[Locale] = &[Locale::En, Locale::Es];

/// A formatted message argument captured by the [`macro@crate::t`] macro.
///
/// # Invariants
/// - `key` matches a placeholder name without braces (for example, `path`).
#[derive(Clone)]
pub struct MessageArg {
    /// Placeholder name used in message templates.
    pub key: &'static str,
    /// Formatted value substituted for the placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Locale Selection
// ============================================================================

/// Global locale selection for CLI output.
static CURRENT_LOCALE: OnceLock<Locale> = OnceLock::new();

/// Sets the CLI locale. Only the first call wins.
pub fn set_locale(locale: Locale) {
    let _ = CURRENT_LOCALE.set(locale);
}

/// Returns the current CLI locale (defaults to English).
#[must_use]
pub fn current_locale() -> Locale {
    CURRENT_LOCALE.get().copied().unwrap_or(Locale::En)
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// English catalog.
const CATALOG_EN: &[(&str, &str)] = &[
    ("main.version", "geoprobe {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("output.json_failed", "Failed to serialize output: {error}"),
    ("i18n.lang.invalid_env", "Invalid value for {env}: {value}. Expected 'en' or 'es'."),
    ("logging.filter_invalid", "Invalid log filter in {env}: {error}"),
    ("config.load_failed", "Failed to load configuration: {error}"),
    ("config.override_invalid", "Invalid command-line setting: {error}"),
    ("inspect.failed", "ERROR: Could not open {path}: {error}"),
    ("inspect.not_found", "ERROR: File not found: {path}"),
    ("inspect.header", "GeoPackage: {path}"),
    ("inspect.layer_count", "Number of layers: {count}"),
    ("inspect.layer.header", "Layer {index}: {name}"),
    ("inspect.layer.features", "  Number of features: {count}"),
    ("inspect.layer.geometry", "  Geometry type: {geometry}"),
    ("inspect.layer.srs", "  Spatial reference: {srs}"),
    ("inspect.layer.srs_none", "  Spatial reference: not defined"),
    ("inspect.layer.extent", "  Extent (minx, maxx, miny, maxy):"),
    ("inspect.layer.extent_x", "    X: [{min}, {max}]"),
    ("inspect.layer.extent_y", "    Y: [{min}, {max}]"),
    ("inspect.layer.bbox", "  Bbox for pygeoapi: [{min_x}, {min_y}, {max_x}, {max_y}]"),
    ("inspect.layer.extent_none", "  Extent: not available"),
    ("inspect.layer.fields", "  Fields ({count}):"),
    ("inspect.layer.field", "    - {name} ({field_type}, width: {width})"),
    ("inspect.layer.sample", "  Sample feature (ID: {fid}):"),
    ("inspect.layer.sample_value", "    {name}: {value}"),
    ("inspect.done", "Inspection complete"),
    ("check.header", "Testing access to: {path}"),
    ("check.opened", "✓ GeoPackage opened successfully"),
    ("check.open_failed", "✗ ERROR: Could not open the GeoPackage: {error}"),
    ("check.hint.header", "Check that:"),
    ("check.hint.exists", "  - The file exists"),
    ("check.hint.permissions", "  - You have read permission"),
    ("check.hint.format", "  - The file is a valid GeoPackage"),
    ("check.layer_count", "✓ Number of layers: {count}"),
    ("check.no_layers", "✗ ERROR: The GeoPackage contains no layers"),
    ("check.layer", "✓ Layer: {name}"),
    ("check.features", "✓ Features: {count}"),
    ("check.empty_layer", "⚠ WARNING: The layer contains no features"),
    ("check.feature_read", "✓ Feature read succeeded (ID: {fid})"),
    ("check.feature_unreadable", "✗ Could not read a feature"),
    ("check.field_count", "✓ Number of fields: {count}"),
    ("check.fields_header", "  Available fields:"),
    ("check.field", "    - {name}: {value}"),
    ("check.more_fields", "    ... and {count} more fields"),
    ("check.failed", "✗ ERROR: {error}"),
    ("check.done", "✓ Test completed successfully"),
    ("check.ready", "The GeoPackage is ready to use with pygeoapi"),
    ("smoke.banner", "pygeoapi tests - collection {collection}"),
    ("smoke.settings_invalid", "Invalid smoke settings: {error}"),
    ("smoke.reachable", "✓ Server reachable at {url}"),
    ("smoke.unreachable", "✗ Error: Cannot connect to {url}"),
    ("smoke.unreachable_hint", "Make sure the server is running:"),
    ("smoke.unreachable_command", "  ./start.sh"),
    ("smoke.name.landing", "Landing Page"),
    ("smoke.name.conformance", "Conformance"),
    ("smoke.name.openapi", "OpenAPI Specification"),
    ("smoke.name.collections", "Collections"),
    ("smoke.name.collection", "Collection {collection}"),
    ("smoke.name.items", "{collection} Items"),
    ("smoke.name.items_limited", "{collection} Items (limit=5)"),
    ("smoke.name.feature_retrieval", "Single Feature Retrieval"),
    ("smoke.name.filters", "Filters and Parameters"),
    ("smoke.name.not_found", "404 Not Found"),
    ("smoke.check.header", "Testing: {name}"),
    ("smoke.check.endpoint", "Endpoint: {endpoint}"),
    ("smoke.status_ok", "✓ Status Code: {status}"),
    ("smoke.status_bad", "✗ Status Code: {status} (expected {expected})"),
    ("smoke.json_ok", "✓ Valid JSON response"),
    ("smoke.json_keys", "  Main fields: {keys}"),
    ("smoke.json_invalid", "✗ Response is not valid JSON"),
    ("smoke.feature_count", "  Number of features: {count}"),
    ("smoke.number_matched", "  Total matched: {value}"),
    ("smoke.number_returned", "  Total returned: {value}"),
    ("smoke.transport_error", "✗ Connection error: {error}"),
    ("smoke.feature.id", "Feature ID obtained: {id}"),
    ("smoke.feature.ok", "✓ Feature retrieved successfully"),
    ("smoke.feature.summary_id", "  ID: {value}"),
    ("smoke.feature.summary_type", "  Type: {value}"),
    ("smoke.feature.summary_geometry", "  Geometry: {value}"),
    ("smoke.feature.fetch_failed", "✗ Error retrieving feature (status {status})"),
    ("smoke.feature.none", "⚠ No features available to test"),
    ("smoke.feature.listing_unusable", "✗ Error: {reason}"),
    ("smoke.value.none", "None"),
    ("smoke.filters.limit_header", "1. limit parameter:"),
    ("smoke.filters.limit", "   limit={limit}: {returned} features returned"),
    ("smoke.filters.limit_failed", "   Error with limit={limit}"),
    ("smoke.filters.bbox_header", "2. bbox parameter:"),
    ("smoke.filters.bbox_ok", "✓ bbox filter works"),
    ("smoke.filters.bbox_returned", "   Features returned: {count}"),
    ("smoke.filters.bbox_failed", "✗ Error with bbox filter"),
    ("smoke.summary.header", "TEST SUMMARY"),
    ("smoke.summary.total", "Total tests: {count}"),
    ("smoke.summary.passed", "Passed: {count}"),
    ("smoke.summary.failed", "Failed: {count}"),
    ("smoke.summary.all_passed", "✓ All tests passed"),
    ("smoke.summary.server_ok", "The pygeoapi server is working correctly."),
    ("smoke.summary.links", "You can access:"),
    ("smoke.summary.link_landing", "  - Landing page:    {url}"),
    ("smoke.summary.link_docs", "  - Documentation:   {url}/openapi?f=html"),
    ("smoke.summary.link_collections", "  - Collections:     {url}/collections"),
    ("smoke.summary.link_items", "  - {collection} items:  {url}/collections/{collection}/items"),
    ("smoke.summary.some_failed", "✗ Some tests failed"),
    ("smoke.summary.logs_hint", "Check the logs for more information:"),
    ("smoke.summary.logs_command", "  tail -f logs/pygeoapi.log"),
];

/// Spanish catalog.
const CATALOG_ES: &[(&str, &str)] = &[
    ("main.version", "geoprobe {version}"),
    ("output.stream.stdout", "salida estándar"),
    ("output.stream.stderr", "salida de errores"),
    ("output.stream.unknown", "salida"),
    ("output.write_failed", "No se pudo escribir en {stream}: {error}"),
    ("output.json_failed", "No se pudo serializar la salida: {error}"),
    ("i18n.lang.invalid_env", "Valor no válido para {env}: {value}. Se esperaba 'en' o 'es'."),
    ("logging.filter_invalid", "Filtro de log no válido en {env}: {error}"),
    ("config.load_failed", "No se pudo cargar la configuración: {error}"),
    ("config.override_invalid", "Valor no válido en la línea de comandos: {error}"),
    ("inspect.failed", "ERROR: No se pudo abrir {path}: {error}"),
    ("inspect.not_found", "ERROR: No se encuentra el archivo {path}"),
    ("inspect.header", "GeoPackage: {path}"),
    ("inspect.layer_count", "Número de capas: {count}"),
    ("inspect.layer.header", "Capa {index}: {name}"),
    ("inspect.layer.features", "  Número de features: {count}"),
    ("inspect.layer.geometry", "  Tipo de geometría: {geometry}"),
    ("inspect.layer.srs", "  Sistema de referencia: {srs}"),
    ("inspect.layer.srs_none", "  Sistema de referencia: No definido"),
    ("inspect.layer.extent", "  Extensión (minx, maxx, miny, maxy):"),
    ("inspect.layer.extent_x", "    X: [{min}, {max}]"),
    ("inspect.layer.extent_y", "    Y: [{min}, {max}]"),
    ("inspect.layer.bbox", "  Bbox para pygeoapi: [{min_x}, {min_y}, {max_x}, {max_y}]"),
    ("inspect.layer.extent_none", "  Extensión: No disponible"),
    ("inspect.layer.fields", "  Campos ({count}):"),
    ("inspect.layer.field", "    - {name} ({field_type}, ancho: {width})"),
    ("inspect.layer.sample", "  Feature de ejemplo (ID: {fid}):"),
    ("inspect.layer.sample_value", "    {name}: {value}"),
    ("inspect.done", "Inspección completada"),
    ("check.header", "Probando acceso a: {path}"),
    ("check.opened", "✓ GeoPackage abierto correctamente"),
    ("check.open_failed", "✗ ERROR: No se pudo abrir el GeoPackage: {error}"),
    ("check.hint.header", "Verifica que:"),
    ("check.hint.exists", "  - El archivo existe"),
    ("check.hint.permissions", "  - Tienes permisos de lectura"),
    ("check.hint.format", "  - El archivo es un GeoPackage válido"),
    ("check.layer_count", "✓ Número de capas: {count}"),
    ("check.no_layers", "✗ ERROR: El GeoPackage no contiene capas"),
    ("check.layer", "✓ Capa: {name}"),
    ("check.features", "✓ Features: {count}"),
    ("check.empty_layer", "⚠ ADVERTENCIA: La capa no contiene features"),
    ("check.feature_read", "✓ Lectura de feature exitosa (ID: {fid})"),
    ("check.feature_unreadable", "✗ No se pudo leer feature"),
    ("check.field_count", "✓ Número de campos: {count}"),
    ("check.fields_header", "  Campos disponibles:"),
    ("check.field", "    - {name}: {value}"),
    ("check.more_fields", "    ... y {count} campos más"),
    ("check.failed", "✗ ERROR: {error}"),
    ("check.done", "✓ Prueba completada exitosamente"),
    ("check.ready", "El GeoPackage está listo para usarse con pygeoapi"),
    ("smoke.banner", "Pruebas de pygeoapi - Colección {collection}"),
    ("smoke.settings_invalid", "Configuración de pruebas no válida: {error}"),
    ("smoke.reachable", "✓ Servidor accesible en {url}"),
    ("smoke.unreachable", "✗ Error: No se puede conectar a {url}"),
    ("smoke.unreachable_hint", "Asegúrate de que el servidor está ejecutándose:"),
    ("smoke.unreachable_command", "  ./start.sh"),
    ("smoke.name.landing", "Landing Page"),
    ("smoke.name.conformance", "Conformance"),
    ("smoke.name.openapi", "OpenAPI Specification"),
    ("smoke.name.collections", "Collections"),
    ("smoke.name.collection", "Colección {collection}"),
    ("smoke.name.items", "Items de {collection}"),
    ("smoke.name.items_limited", "Items de {collection} (limit=5)"),
    ("smoke.name.feature_retrieval", "Recuperación de Feature Individual"),
    ("smoke.name.filters", "Filtros y Parámetros"),
    ("smoke.name.not_found", "404 Not Found"),
    ("smoke.check.header", "Probando: {name}"),
    ("smoke.check.endpoint", "Endpoint: {endpoint}"),
    ("smoke.status_ok", "✓ Status Code: {status}"),
    ("smoke.status_bad", "✗ Status Code: {status} (esperado {expected})"),
    ("smoke.json_ok", "✓ Respuesta JSON válida"),
    ("smoke.json_keys", "  Campos principales: {keys}"),
    ("smoke.json_invalid", "✗ Respuesta no es JSON válido"),
    ("smoke.feature_count", "  Número de features: {count}"),
    ("smoke.number_matched", "  Total matched: {value}"),
    ("smoke.number_returned", "  Total returned: {value}"),
    ("smoke.transport_error", "✗ Error de conexión: {error}"),
    ("smoke.feature.id", "Feature ID obtenido: {id}"),
    ("smoke.feature.ok", "✓ Feature recuperado exitosamente"),
    ("smoke.feature.summary_id", "  ID: {value}"),
    ("smoke.feature.summary_type", "  Tipo: {value}"),
    ("smoke.feature.summary_geometry", "  Geometría: {value}"),
    ("smoke.feature.fetch_failed", "✗ Error al recuperar feature (status {status})"),
    ("smoke.feature.none", "⚠ No hay features disponibles para probar"),
    ("smoke.feature.listing_unusable", "✗ Error: {reason}"),
    ("smoke.value.none", "None"),
    ("smoke.filters.limit_header", "1. Parámetro limit:"),
    ("smoke.filters.limit", "   limit={limit}: {returned} features devueltos"),
    ("smoke.filters.limit_failed", "   Error con limit={limit}"),
    ("smoke.filters.bbox_header", "2. Parámetro bbox:"),
    ("smoke.filters.bbox_ok", "✓ Filtro bbox funciona"),
    ("smoke.filters.bbox_returned", "   Features devueltos: {count}"),
    ("smoke.filters.bbox_failed", "✗ Error con filtro bbox"),
    ("smoke.summary.header", "RESUMEN DE PRUEBAS"),
    ("smoke.summary.total", "Total de pruebas: {count}"),
    ("smoke.summary.passed", "Exitosas: {count}"),
    ("smoke.summary.failed", "Fallidas: {count}"),
    ("smoke.summary.all_passed", "✓ Todas las pruebas pasaron exitosamente"),
    ("smoke.summary.server_ok", "El servidor pygeoapi está funcionando correctamente."),
    ("smoke.summary.links", "Puedes acceder a:"),
    ("smoke.summary.link_landing", "  - Landing page:    {url}"),
    ("smoke.summary.link_docs", "  - Documentación:   {url}/openapi?f=html"),
    ("smoke.summary.link_collections", "  - Colecciones:     {url}/collections"),
    ("smoke.summary.link_items", "  - Items {collection}:  {url}/collections/{collection}/items"),
    ("smoke.summary.some_failed", "✗ Algunas pruebas fallaron"),
    ("smoke.summary.logs_hint", "Revisa los logs para más información:"),
    ("smoke.summary.logs_command", "  tail -f logs/pygeoapi.log"),
];

/// Returns the raw catalog entries for a locale.
#[cfg(test)]
pub(crate) const fn catalog_entries_for(locale: Locale) -> &'static [(&'static str, &'static str)] {
    match locale {
        Locale::En => CATALOG_EN,
        Locale::Es => CATALOG_ES,
    }
}

/// Returns the message catalog for the requested locale.
pub(crate) fn catalog_for(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_EN_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static CATALOG_ES_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    match locale {
        Locale::En => CATALOG_EN_MAP.get_or_init(|| CATALOG_EN.iter().copied().collect()),
        Locale::Es => CATALOG_ES_MAP.get_or_init(|| CATALOG_ES.iter().copied().collect()),
    }
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` using the selected locale while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    translate_in(current_locale(), key, args)
}

/// Translates `key` in an explicit locale.
///
/// Placeholders are filled in one left-to-right pass over the template, so
/// braces inside substituted values are never expanded. Unknown placeholders
/// stay as written.
#[must_use]
pub fn translate_in(locale: Locale, key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog_for(locale)
        .get(key)
        .copied()
        .or_else(|| catalog_for(Locale::En).get(key).copied())
        .unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = String::with_capacity(template.len());
    let mut rest = template;
    while let Some((before, after)) = rest.split_once('{') {
        result.push_str(before);
        let filled = after.split_once('}').and_then(|(name, tail)| {
            args.iter().find(|arg| arg.key == name).map(|arg| (arg.value.as_str(), tail))
        });
        if let Some((value, tail)) = filled {
            result.push_str(value);
            rest = tail;
        } else {
            result.push('{');
            rest = after;
        }
    }
    result.push_str(rest);
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[path = "tests/i18n.rs"]
mod tests;
