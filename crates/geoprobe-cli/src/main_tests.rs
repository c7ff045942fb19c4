// crates/geoprobe-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for locale, color, log filter, and override helpers.
// Purpose: Pin the resolution rules applied before any command runs.
// Dependencies: geoprobe-cli main helpers
// ============================================================================

//! ## Overview
//! Covers the pure helpers in the entry point: locale and color resolution,
//! log filter parsing, and command-line overrides of smoke settings.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use clap::Parser;

use super::Cli;
use super::ColorArg;
use super::Commands;
use super::GeoprobeConfig;
use super::GpkgPathArgs;
use super::LangArg;
use super::Locale;
use super::OutputFormat;
use super::apply_smoke_overrides;
use super::build_log_filter;
use super::resolve_color;
use super::resolve_gpkg_path;
use super::resolve_locale;

// ============================================================================
// SECTION: Locale
// ============================================================================

#[test]
fn locale_flag_wins_over_environment() {
    let locale = resolve_locale(Some(LangArg::Es), Some("en")).unwrap();
    assert_eq!(locale, Locale::Es);
}

#[test]
fn locale_reads_environment_with_region_suffix() {
    let locale = resolve_locale(None, Some("es_CO.UTF-8")).unwrap();
    assert_eq!(locale, Locale::Es);
}

#[test]
fn locale_defaults_to_english() {
    assert_eq!(resolve_locale(None, None).unwrap(), Locale::En);
}

#[test]
fn locale_rejects_unknown_environment_value() {
    let err = resolve_locale(None, Some("fr")).unwrap_err();
    assert!(err.to_string().contains("GEOPROBE_LANG"));
    assert!(err.to_string().contains("fr"));
}

// ============================================================================
// SECTION: Color
// ============================================================================

#[test]
fn color_auto_follows_terminal_and_no_color() {
    assert!(resolve_color(ColorArg::Auto, true, false));
    assert!(!resolve_color(ColorArg::Auto, true, true));
    assert!(!resolve_color(ColorArg::Auto, false, false));
}

#[test]
fn color_explicit_choices_ignore_environment() {
    assert!(resolve_color(ColorArg::Always, false, true));
    assert!(!resolve_color(ColorArg::Never, true, false));
}

// ============================================================================
// SECTION: Logging
// ============================================================================

#[test]
fn log_filter_defaults_when_unset_or_blank() {
    assert!(build_log_filter(None).is_ok());
    assert!(build_log_filter(Some("  ")).is_ok());
}

#[test]
fn log_filter_accepts_directives() {
    assert!(build_log_filter(Some("geoprobe_smoke=debug,warn")).is_ok());
}

#[test]
fn log_filter_rejects_malformed_directives() {
    let err = build_log_filter(Some("geoprobe_smoke=loud")).unwrap_err();
    assert!(err.to_string().contains("GEOPROBE_LOG"));
}

// ============================================================================
// SECTION: Overrides
// ============================================================================

#[test]
fn smoke_overrides_replace_url_and_collection() {
    let mut config = GeoprobeConfig::default();
    apply_smoke_overrides(
        &mut config,
        Some("http://127.0.0.1:8080/api".to_string()),
        Some("rios".to_string()),
    )
    .unwrap();
    assert_eq!(config.smoke.base_url, "http://127.0.0.1:8080/api");
    assert_eq!(config.smoke.collection, "rios");
}

#[test]
fn smoke_overrides_keep_config_when_absent() {
    let mut config = GeoprobeConfig::default();
    apply_smoke_overrides(&mut config, None, None).unwrap();
    assert_eq!(config, GeoprobeConfig::default());
}

#[test]
fn smoke_overrides_reject_non_http_url() {
    let mut config = GeoprobeConfig::default();
    let err =
        apply_smoke_overrides(&mut config, Some("ftp://localhost".to_string()), None).unwrap_err();
    assert!(err.to_string().starts_with("Invalid command-line setting"));
}

#[test]
fn smoke_overrides_reject_empty_collection() {
    let mut config = GeoprobeConfig::default();
    assert!(apply_smoke_overrides(&mut config, None, Some(String::new())).is_err());
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn gpkg_path_falls_back_to_config_default() {
    let config = GeoprobeConfig::default();
    let args = GpkgPathArgs {
        path: None,
    };
    assert_eq!(resolve_gpkg_path(&args, &config), PathBuf::from("datos/amazonas.gpkg"));
    let args = GpkgPathArgs {
        path: Some(PathBuf::from("other.gpkg")),
    };
    assert_eq!(resolve_gpkg_path(&args, &config), PathBuf::from("other.gpkg"));
}

#[test]
fn global_flags_parse_after_subcommand() {
    let cli = Cli::try_parse_from([
        "geoprobe",
        "smoke",
        "http://localhost:5001",
        "--collection",
        "rios",
        "--format",
        "json",
        "--color",
        "never",
    ])
    .unwrap();
    assert_eq!(cli.format, OutputFormat::Json);
    assert_eq!(cli.color, ColorArg::Never);
    let Some(Commands::Smoke(command)) = cli.command else {
        panic!("expected smoke command");
    };
    assert_eq!(command.url.as_deref(), Some("http://localhost:5001"));
    assert_eq!(command.collection.as_deref(), Some("rios"));
}

#[test]
fn cli_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
