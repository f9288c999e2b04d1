//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "datasnap",
    version,
    about = "DataSnap - infer column types and run batch jobs over CSV data",
    long_about = "Infer semantic column types of tabular data and run cleaning,\n\
                  validation, transformation, profiling and analysis jobs over it.\n\n\
                  Input files are CSV with a header row."
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

    /// Scheduler configuration (TOML): concurrency limit and job defaults.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Infer the semantic type of every column.
    Infer(InferArgs),

    /// Impute missing values, trim text, promote numeric columns and drop duplicates.
    Clean(CleanArgs),

    /// Check rows against validation rules from a JSON file.
    Validate(ValidateArgs),

    /// Apply filter, map, sort and aggregate steps from a JSON file.
    Transform(TransformArgs),

    /// Print per-column statistics and anomalies.
    Profile(InputArgs),

    /// Summarize the dataset, list insights and suggest charts.
    Analyze(AnalyzeArgs),
}

#[derive(Parser)]
pub struct InputArgs {
    /// CSV file with a header row.
    #[arg(value_name = "CSV")]
    pub input: PathBuf,
}

#[derive(Parser)]
pub struct InferArgs {
    /// CSV file with a header row.
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Rows sampled per column (default: min(1000, rows)).
    #[arg(long = "sample-size", value_name = "N")]
    pub sample_size: Option<usize>,

    /// Confidence below which a column is flagged for review.
    #[arg(long = "threshold", value_name = "SCORE")]
    pub threshold: Option<f64>,

    /// Score only the basic types (skip email, url, uuid and friends).
    #[arg(long = "basic-only")]
    pub basic_only: bool,

    /// Print the full inference session as JSON.
    #[arg(long = "json")]
    pub json: bool,

    /// Accept every suggested type and write the converted rows to this CSV file.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct CleanArgs {
    /// CSV file with a header row.
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Write the cleaned rows to this CSV file.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Leave missing values empty instead of imputing the column mode.
    #[arg(long = "no-impute")]
    pub no_impute: bool,

    /// Rows processed between checkpoints.
    #[arg(long = "chunk-size", value_name = "N")]
    pub chunk_size: Option<usize>,
}

#[derive(Parser)]
pub struct AnalyzeArgs {
    /// CSV file with a header row.
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// JSON array of hypothesis tests (t-tests, one-way ANOVA) to run.
    #[arg(long = "tests", value_name = "PATH")]
    pub tests: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// CSV file with a header row.
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// JSON array of validation rules.
    #[arg(long = "rules", value_name = "PATH")]
    pub rules: PathBuf,
}

#[derive(Parser)]
pub struct TransformArgs {
    /// CSV file with a header row.
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// JSON array of transformation steps.
    #[arg(long = "steps", value_name = "PATH")]
    pub steps: PathBuf,

    /// Write the transformed rows to this CSV file.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
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
