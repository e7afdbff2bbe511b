/**
 * CSS Modules CLI - css-modules
 *
 * Scopes every input stylesheet and writes `x.css` / `x.css.json` pairs.
 */
use anyhow::Context;
use clap::{Parser, ValueEnum};
use css_modules_cli::batch::{self, BatchOptions};
use css_modules_cli::config;
use css_modules_cli::modules::{ConsoleLogger, LogLevel, Logger};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevelArg> for LogLevel {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Error => LogLevel::Error,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "css-modules", version, about = "Scope CSS class names as CSS Modules")]
struct Cli {
    /// Input files or glob patterns
    #[arg(required = true, value_name = "FILES")]
    inputs: Vec<String>,

    /// Path to css-modules.json
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory receiving x.css and x.css.json
    #[arg(short = 'o', long = "out-dir", value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Print the export maps as JSON
    #[arg(long)]
    json: bool,

    /// Inline dependency CSS ahead of each entry's CSS
    #[arg(long)]
    bundle: bool,

    /// Drop rules left without declarations
    #[arg(long = "remove-empty-rules")]
    remove_empty_rules: bool,

    /// Prepend an :export rule to the output CSS
    #[arg(long = "export-rule")]
    export_rule: bool,

    #[arg(long = "log-level", value_enum, default_value_t = LogLevelArg::Warn)]
    log_level: LogLevelArg,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("cannot read the current directory")?;
    let logger: Arc<dyn Logger + Send + Sync> = Arc::new(ConsoleLogger::new(cli.log_level.into()));

    let mut options = config::discover(cli.config.as_deref(), &cwd)?.into_options()?;
    options.emit_export_rule |= cli.export_rule;
    options.inline_dependencies |= cli.bundle;
    options.remove_empty_rules |= cli.remove_empty_rules;

    let inputs = batch::expand_inputs(&cli.inputs, &cwd)?;
    logger.debug(&format!("processing {} input(s)", inputs.len()));

    let batch_options = BatchOptions {
        out_dir: cli.out_dir,
    };
    let outputs = batch::run(&inputs, &cwd, &options, &batch_options, logger)?;

    if cli.json {
        let exports = batch::exports_by_input(&outputs);
        println!("{}", serde_json::to_string_pretty(&exports)?);
    }
    Ok(())
}
