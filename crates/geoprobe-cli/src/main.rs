// crates/geoprobe-cli/src/main.rs
// ============================================================================
// Module: geoprobe CLI Entry Point
// Description: Command dispatcher for GeoPackage inspection and API smoke runs.
// Purpose: Provide a localized CLI over the geoprobe libraries.
// Dependencies: clap, geoprobe-config, geoprobe-gpkg, geoprobe-smoke, serde, tracing.
// ============================================================================

//! ## Overview
//! `geoprobe` exposes three commands: `inspect` prints a full report of a
//! GeoPackage, `check` runs the minimal access check on its first layer, and
//! `smoke` runs the fixed pygeoapi endpoint suite. All user-facing strings are
//! routed through the i18n catalog. Diagnostics go to stderr through
//! `tracing`; stdout carries only report output.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::IsTerminal;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use geoprobe_cli::i18n::Locale;
use geoprobe_cli::i18n::set_locale;
use geoprobe_cli::render;
use geoprobe_cli::render::Palette;
use geoprobe_cli::t;
use geoprobe_config::GeoprobeConfig;
use geoprobe_gpkg::GeoPackage;
use geoprobe_gpkg::GpkgError;
use geoprobe_gpkg::GpkgOptions;
use geoprobe_smoke::SmokeClient;
use geoprobe_smoke::SmokeSettings;
use geoprobe_smoke::SmokeSuite;
use geoprobe_smoke::SuiteReport;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable for CLI locale selection.
const LANG_ENV: &str = "GEOPROBE_LANG";
/// Environment variable for the log filter.
const LOG_ENV: &str = "GEOPROBE_LOG";
/// Log filter used when [`LOG_ENV`] is unset.
const DEFAULT_LOG_FILTER: &str = "warn";
/// Environment variable that disables colored output when set.
const NO_COLOR_ENV: &str = "NO_COLOR";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "geoprobe", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Preferred output language (overrides `GEOPROBE_LANG`).
    #[arg(long, value_enum, value_name = "LANG", global = true)]
    lang: Option<LangArg>,
    /// Configuration file (overrides `GEOPROBE_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,
    /// When to color text output.
    #[arg(long, value_enum, default_value_t = ColorArg::Auto, global = true)]
    color: ColorArg,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print layers, fields, spatial references, extents, and a sample feature.
    Inspect(GpkgPathArgs),
    /// Verify that the first layer of a GeoPackage can be read.
    Check(GpkgPathArgs),
    /// Run the pygeoapi endpoint smoke suite.
    Smoke(SmokeCommand),
}

/// GeoPackage path argument shared by `inspect` and `check`.
#[derive(Args, Debug)]
struct GpkgPathArgs {
    /// GeoPackage path (defaults to `inspect.default_path`).
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,
}

/// Arguments for `smoke`.
#[derive(Args, Debug)]
struct SmokeCommand {
    /// API base URL (defaults to `smoke.base_url`).
    #[arg(value_name = "URL")]
    url: Option<String>,
    /// Collection exercised by item checks (defaults to `smoke.collection`).
    #[arg(long, value_name = "ID")]
    collection: Option<String>,
}

/// Output formats for report commands.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// JSON output.
    Json,
    /// Human-readable text output.
    Text,
}

/// Color selection for text output.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum ColorArg {
    /// Color when stdout is a terminal and `NO_COLOR` is unset.
    Auto,
    /// Always emit ANSI colors.
    Always,
    /// Never emit ANSI colors.
    Never,
}

/// Supported CLI language selections.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum LangArg {
    /// English.
    En,
    /// Spanish.
    Es,
}

/// Converts CLI language selections into locales.
impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Es => Self::Es,
        }
    }
}

/// JSON rendering of a smoke run.
#[derive(Debug, Serialize)]
struct SmokeOutput<'a> {
    /// Per-check outcomes.
    #[serde(flatten)]
    report: &'a SuiteReport,
    /// Number of checks run.
    total: usize,
    /// Number of passing checks.
    passed: usize,
    /// Number of failing checks.
    failed: usize,
    /// True when every check passed.
    all_passed: bool,
}

impl<'a> SmokeOutput<'a> {
    /// Builds the output view of a suite report.
    fn new(report: &'a SuiteReport) -> Self {
        Self {
            report,
            total: report.total(),
            passed: report.passed(),
            failed: report.failed(),
            all_passed: report.all_passed(),
        }
    }
}

/// Resolved output settings shared by all commands.
#[derive(Debug, Clone, Copy)]
struct OutputOptions {
    /// Selected format.
    format: OutputFormat,
    /// Colors for text output.
    palette: Palette,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang, env_lang.as_deref())?;
    set_locale(locale);
    let env_log = std::env::var(LOG_ENV).ok();
    init_logging(env_log.as_deref())?;

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let config = GeoprobeConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let no_color = std::env::var_os(NO_COLOR_ENV).is_some_and(|value| !value.is_empty());
    let output = OutputOptions {
        format: cli.format,
        palette: Palette::new(resolve_color(cli.color, std::io::stdout().is_terminal(), no_color)),
    };

    match command {
        Commands::Inspect(args) => command_inspect(&args, &config, output),
        Commands::Check(args) => command_check(&args, &config, output),
        Commands::Smoke(command) => command_smoke(command, config, output),
    }
}

/// Installs the stderr log subscriber.
fn init_logging(env_filter: Option<&str>) -> CliResult<()> {
    let filter = build_log_filter(env_filter)?;
    // A subscriber may already be installed when embedded; keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    Ok(())
}

/// Parses the log filter from the environment value or the default.
fn build_log_filter(env_filter: Option<&str>) -> CliResult<EnvFilter> {
    match env_filter {
        Some(value) if !value.trim().is_empty() => EnvFilter::try_new(value)
            .map_err(|err| CliError::new(t!("logging.filter_invalid", env = LOG_ENV, error = err))),
        _ => Ok(EnvFilter::new(DEFAULT_LOG_FILTER)),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Inspect Command
// ============================================================================

/// Executes the `inspect` command.
fn command_inspect(
    args: &GpkgPathArgs,
    config: &GeoprobeConfig,
    output: OutputOptions,
) -> CliResult<ExitCode> {
    let path = resolve_gpkg_path(args, config);
    let gpkg = open_gpkg(&path, config).map_err(|err| inspect_error(&path, &err))?;
    let report = gpkg.inspect().map_err(|err| inspect_error(&path, &err))?;
    debug!(path = %path.display(), layers = report.layers.len(), "inspection finished");
    match output.format {
        OutputFormat::Json => write_json(&report)?,
        OutputFormat::Text => write_stdout_text(&render::inspect_text(&report))?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Maps inspection failures to localized CLI messages.
fn inspect_error(path: &Path, error: &GpkgError) -> CliError {
    match error {
        GpkgError::NotFound(_) => CliError::new(t!("inspect.not_found", path = path.display())),
        other => CliError::new(t!("inspect.failed", path = path.display(), error = other)),
    }
}

// ============================================================================
// SECTION: Check Command
// ============================================================================

/// Executes the `check` command.
fn command_check(
    args: &GpkgPathArgs,
    config: &GeoprobeConfig,
    output: OutputOptions,
) -> CliResult<ExitCode> {
    let path = resolve_gpkg_path(args, config);
    if output.format == OutputFormat::Json {
        let gpkg = open_gpkg(&path, config).map_err(|err| inspect_error(&path, &err))?;
        let report = gpkg
            .check_access()
            .map_err(|err| CliError::new(t!("check.failed", error = err)))?;
        write_json(&report)?;
        return Ok(ExitCode::SUCCESS);
    }

    let palette = output.palette;
    write_stdout_text(&render::check_header_text(&path.display().to_string()))?;
    let gpkg = match open_gpkg(&path, config) {
        Ok(gpkg) => gpkg,
        Err(err) => {
            write_stdout_text(&render::check_open_failed_text(&err.to_string(), palette))?;
            return Ok(ExitCode::FAILURE);
        }
    };
    write_stdout_line(&palette.green(&t!("check.opened")))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;

    match gpkg.check_access() {
        Ok(report) => {
            write_stdout_text(&render::access_text(&report, palette))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(GpkgError::NoLayers) => {
            write_stdout_line(&palette.green(&t!("check.layer_count", count = 0)))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            write_stdout_line(&palette.red(&t!("check.no_layers")))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::FAILURE)
        }
        Err(GpkgError::FeatureUnreadable(reason)) => {
            debug!(reason = %reason, "feature read failed");
            write_stdout_line(&palette.red(&t!("check.feature_unreadable")))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::FAILURE)
        }
        Err(err) => {
            write_stdout_line(&palette.red(&t!("check.failed", error = err)))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

// ============================================================================
// SECTION: Smoke Command
// ============================================================================

/// Executes the `smoke` command.
fn command_smoke(
    command: SmokeCommand,
    mut config: GeoprobeConfig,
    output: OutputOptions,
) -> CliResult<ExitCode> {
    apply_smoke_overrides(&mut config, command.url, command.collection)?;
    let settings = SmokeSettings::from_config(&config.smoke)
        .map_err(|err| CliError::new(t!("smoke.settings_invalid", error = err)))?;
    let collection = settings.collection.clone();
    let base = settings.base().to_string();
    let client = SmokeClient::new(settings)
        .map_err(|err| CliError::new(t!("smoke.settings_invalid", error = err)))?;
    let text = output.format == OutputFormat::Text;
    let palette = output.palette;

    if text {
        write_stdout_text(&render::smoke_banner_text(&collection))?;
    }
    if let Err(err) = client.preflight() {
        debug!(error = %err, "preflight failed");
        if !text {
            return Err(CliError::new(t!("smoke.unreachable", url = base)));
        }
        write_stdout_text(&render::smoke_unreachable_text(&base, palette))?;
        return Ok(ExitCode::FAILURE);
    }
    if text {
        write_stdout_text(&render::smoke_reachable_text(&base, palette))?;
    }

    let mut write_failure: Option<CliError> = None;
    let report = SmokeSuite::new(&client).run(|check| {
        if !text || write_failure.is_some() {
            return;
        }
        if let Err(err) = write_stdout_text(&render::check_text(check, &collection, palette)) {
            write_failure = Some(err);
        }
    });
    if let Some(err) = write_failure {
        return Err(err);
    }

    match output.format {
        OutputFormat::Json => write_json(&SmokeOutput::new(&report))?,
        OutputFormat::Text => write_stdout_text(&render::summary_text(&report, palette))?,
    }
    Ok(if report.all_passed() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Applies positional URL and `--collection` overrides, then revalidates.
fn apply_smoke_overrides(
    config: &mut GeoprobeConfig,
    url: Option<String>,
    collection: Option<String>,
) -> CliResult<()> {
    if let Some(url) = url {
        config.smoke.base_url = url;
    }
    if let Some(collection) = collection {
        config.smoke.collection = collection;
    }
    config.validate().map_err(|err| CliError::new(t!("config.override_invalid", error = err)))
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Resolves the GeoPackage path from the argument or configuration.
fn resolve_gpkg_path(args: &GpkgPathArgs, config: &GeoprobeConfig) -> PathBuf {
    args.path.clone().unwrap_or_else(|| config.inspect.default_path.clone())
}

/// Opens a GeoPackage with configured connection options.
fn open_gpkg(path: &Path, config: &GeoprobeConfig) -> Result<GeoPackage, GpkgError> {
    let options = GpkgOptions {
        busy_timeout_ms: config.inspect.busy_timeout_ms,
    };
    GeoPackage::open_with(path, &options)
}

/// Resolves the CLI locale from flags or environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

/// Decides whether text output is colored.
const fn resolve_color(choice: ColorArg, stdout_is_terminal: bool, no_color: bool) -> bool {
    match choice {
        ColorArg::Always => true,
        ColorArg::Never => false,
        ColorArg::Auto => stdout_is_terminal && !no_color,
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes pre-rendered text (already newline terminated) to stdout.
fn write_stdout_text(text: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(text.as_bytes()).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a value as pretty JSON to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(t!("output.json_failed", error = err)))?;
    rendered.push('\n');
    write_stdout_text(&rendered)
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
