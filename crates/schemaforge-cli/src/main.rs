mod atomic;
mod commands;
mod config;
mod logging;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use schemaforge_parse::SupportedFormat;
use thiserror::Error;

use atomic::write_bytes_atomic;
use commands::Context;
use config::{CliConfig, DEFAULT_CONFIG_FILE, DeparseTarget, OutputFormat, load_config, save_config};
use logging::init_logging;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("config encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[error("core error: {0}")]
    Core(#[from] schemaforge_core::Error),
    #[error("patch error: {0}")]
    Patch(#[from] schemaforge_operation::PatchError),
    #[error("invalid operations: {0}")]
    InvalidOperations(String),
    #[error("{path}: parser reported {errors} error(s)")]
    Parse { path: String, errors: usize },
    #[error("deparse failed: {0}")]
    Deparse(String),
    #[error("cannot tell the format of {0}; pass --format")]
    UnknownFormat(String),
    #[error("logging setup failed: {0}")]
    Logging(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type CliResult<T> = Result<T, CliError>;

#[derive(Parser, Debug)]
#[command(name = "schemaforge", version, about = "Schema conversion, diff and migration toolkit")]
struct Cli {
    /// Config file with defaults for the flags below.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Append JSON log lines to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    /// Log level or filter directive when SCHEMAFORGE_LOG is unset.
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a source file into the canonical schema.
    Parse(ParseArgs),
    /// Compare two schema files.
    Diff(DiffArgs),
    /// Render a schema, or an operation list, as DDL or YAML.
    Deparse(DeparseArgs),
    /// Apply an operation list to a schema.
    Apply(ApplyArgs),
    /// Validate a schema and report fingerprint, relationships and FK order.
    Inspect(InspectArgs),
    /// Write a config file holding the defaults.
    Init(InitArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Input format; detected from the file name when omitted.
    #[arg(long, short)]
    format: Option<SupportedFormat>,
    /// Fail when the parser reports errors.
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Write the result here instead of stdout.
    #[arg(long, short)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ParseArgs {
    input: PathBuf,
    #[arg(long)]
    output: Option<OutputFormat>,
    #[command(flatten)]
    common: InputArgs,
}

#[derive(Args, Debug)]
struct DiffArgs {
    before: PathBuf,
    after: PathBuf,
    /// Emit raw patch operations instead of classified diff items.
    #[arg(long, default_value_t = false)]
    patch: bool,
    #[command(flatten)]
    common: InputArgs,
}

#[derive(Args, Debug)]
struct DeparseArgs {
    input: PathBuf,
    #[arg(long)]
    target: Option<DeparseTarget>,
    /// Treat the input as a JSON operation list.
    #[arg(long, default_value_t = false)]
    operations: bool,
    #[command(flatten)]
    common: InputArgs,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    input: PathBuf,
    /// JSON operation list.
    operations: PathBuf,
    #[arg(long)]
    output: Option<OutputFormat>,
    #[command(flatten)]
    common: InputArgs,
}

#[derive(Args, Debug)]
struct InspectArgs {
    input: PathBuf,
    #[command(flatten)]
    common: InputArgs,
}

#[derive(Args, Debug)]
struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(long, default_value_t = false)]
    force: bool,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging(level, cli.log_file.as_deref())?;

    tracing::debug!(event = "config_loaded", path = %cli.config.display());

    match cli.command {
        Command::Parse(args) => {
            let ctx = context(&config, &args.common, args.output)?;
            emit(args.common.out.as_deref(), &commands::run_parse(&ctx, &args.input)?)
        }
        Command::Diff(args) => {
            let ctx = context(&config, &args.common, None)?;
            let text = commands::run_diff(&ctx, &args.before, &args.after, args.patch)?;
            emit(args.common.out.as_deref(), &text)
        }
        Command::Deparse(args) => {
            let ctx = context(&config, &args.common, None)?;
            let target = args.target.unwrap_or(config.deparse_target);
            let text = commands::run_deparse(&ctx, &args.input, target, args.operations)?;
            emit(args.common.out.as_deref(), &text)
        }
        Command::Apply(args) => {
            let ctx = context(&config, &args.common, args.output)?;
            let text = commands::run_apply(&ctx, &args.input, &args.operations)?;
            emit(args.common.out.as_deref(), &text)
        }
        Command::Inspect(args) => {
            let ctx = context(&config, &args.common, None)?;
            emit(args.common.out.as_deref(), &commands::run_inspect(&ctx, &args.input)?)
        }
        Command::Init(args) => run_init(&cli.config, args.force),
    }
}

fn context(
    config: &CliConfig,
    common: &InputArgs,
    output: Option<OutputFormat>,
) -> CliResult<Context> {
    Context::new(config, common.format, output, common.strict)
}

fn run_init(path: &Path, force: bool) -> CliResult<()> {
    if path.exists() && !force {
        return Err(CliError::InvalidConfig(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }
    save_config(path, &CliConfig::default())?;
    tracing::info!(event = "config_written", path = %path.display());
    Ok(())
}

fn emit(out: Option<&Path>, text: &str) -> CliResult<()> {
    let mut text = text.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    match out {
        Some(path) => {
            write_bytes_atomic(path, text.as_bytes())?;
            tracing::info!(event = "output_written", path = %path.display());
        }
        None => io::stdout().lock().write_all(text.as_bytes())?,
    }
    Ok(())
}
