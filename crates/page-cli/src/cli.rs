//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "pagecodec",
    version,
    about = "Inspect and convert interactive page files",
    long_about = "Read interactive page files, load their images and model state,\n\
                  connect controls to their models, and write them back out."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// JSON configuration file for the decoder, encoder and loader.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow document text (titles, link keys) in log output.
    #[arg(long = "log-text", global = true)]
    pub log_text: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load a page and report its structure and load problems.
    Inspect(InspectArgs),

    /// Load a page and write it to a new location with its resources.
    Convert(ConvertArgs),

    /// List every component type the decoder understands.
    Components,
}

#[derive(Parser)]
pub struct InspectArgs {
    #[arg(value_name = "PAGE")]
    pub page: PathBuf,

    /// Print the load report as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct ConvertArgs {
    #[arg(value_name = "PAGE")]
    pub page: PathBuf,

    /// Destination page file; resources and model state land beside it.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: PathBuf,

    /// Indent nested elements by this many spaces.
    #[arg(long = "indent", value_name = "N")]
    pub indent: Option<usize>,

    /// Keep resource references as they are instead of copying the files.
    #[arg(long = "no-copy")]
    pub no_copy: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
