use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Report, Result, WrapErr};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use confaudit::{
    DocumentFormat, OutputDestination, ReportFormat, compile_schema, load_document,
    load_schema_file, looks_like_json_schema, run_checks, validate_document, write_payload,
};

#[derive(Debug, Parser)]
#[command(
    name = "confaudit",
    version,
    about = "Audit configuration files for schema violations and insecure defaults"
)]
struct Cli {
    /// Configuration file to audit, or "-" for stdin
    #[arg(value_name = "CONFIG")]
    config: String,

    /// JSON Schema to validate against; validation is skipped when omitted
    #[arg(short = 's', long = "schema", value_name = "PATH")]
    schema: Option<PathBuf>,

    /// Configuration format; auto-detected from the file extension if omitted
    #[arg(short = 't', long = "type", value_name = "FORMAT")]
    config_type: Option<FormatArg>,

    /// Logging verbosity (logs go to stderr)
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: LevelArg,

    /// Report rendering
    #[arg(short = 'f', long = "format", value_name = "FMT", default_value = "text")]
    format: ReportFormatArg,

    /// Write the report to a file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: Option<PathBuf>,

    /// Emit compact JSON rather than pretty formatting
    #[arg(long = "no-pretty")]
    no_pretty: bool,

    /// Skip the built-in insecure-default ruleset
    #[arg(long = "no-checks")]
    no_checks: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    #[cfg(feature = "yaml")]
    Yaml,
    #[cfg(feature = "toml")]
    Toml,
}

impl From<FormatArg> for DocumentFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => DocumentFormat::Json,
            #[cfg(feature = "yaml")]
            FormatArg::Yaml => DocumentFormat::Yaml,
            #[cfg(feature = "toml")]
            FormatArg::Toml => DocumentFormat::Toml,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LevelArg {
    fn as_str(self) -> &'static str {
        match self {
            LevelArg::Error => "error",
            LevelArg::Warn => "warn",
            LevelArg::Info => "info",
            LevelArg::Debug => "debug",
            LevelArg::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormatArg {
    Text,
    Json,
}

impl From<ReportFormatArg> for ReportFormat {
    fn from(arg: ReportFormatArg) -> Self {
        match arg {
            ReportFormatArg::Text => ReportFormat::Text,
            ReportFormatArg::Json => ReportFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = color_eyre::install() {
        eprintln!("{err}");
        return ExitCode::from(2);
    }
    if let Err(err) = init_tracing(cli.log_level) {
        eprintln!("{err}");
        return ExitCode::from(2);
    }

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(level: LevelArg) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .wrap_err("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Returns whether the audit came back clean.
fn run(cli: &Cli) -> Result<bool> {
    let format_override = cli.config_type.map(DocumentFormat::from);
    let document = load_document(&cli.config, format_override).map_err(to_eyre)?;

    let violations = match cli.schema.as_ref() {
        Some(schema_path) => {
            let schema = load_schema_file(schema_path).map_err(to_eyre)?;
            if !looks_like_json_schema(&schema) {
                warn!(
                    path = %schema_path.display(),
                    "schema document does not look like a JSON Schema"
                );
            }
            let validator = compile_schema(&schema).map_err(to_eyre)?;
            let violations = validate_document(&validator, &document);
            if violations.is_empty() {
                info!("configuration is valid according to the schema");
            }
            violations
        }
        None => {
            warn!("no schema file provided; skipping validation");
            Vec::new()
        }
    };

    let findings = if cli.no_checks {
        Vec::new()
    } else {
        run_checks(&document)
    };

    let report = confaudit::Report::new(violations, findings, cli.schema.is_some());
    let payload = report
        .render(cli.format.into(), !cli.no_pretty)
        .map_err(to_eyre)?;

    let destination = match cli.output.as_ref() {
        Some(path) => OutputDestination::file(path),
        None => OutputDestination::Stdout,
    };
    write_payload(&destination, &payload).map_err(to_eyre)?;

    Ok(report.clean())
}

// The library reports through anyhow; flatten the context chain into eyre.
fn to_eyre(err: anyhow::Error) -> Report {
    Report::msg(format!("{err:#}"))
}
