use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use matcap_core::Scenario;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "matcap", author, version, about = "Material-constrained capacity expansion planning", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan capacity for one scenario
    Solve(SolveArgs),
    /// Check a configuration for errors and warnings
    Validate {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Report material bottlenecks and reliability issues of a plan
    Bottlenecks(BottlenecksArgs),
    /// Solve several scenarios in parallel and compare them
    Compare(CompareArgs),
    /// Write the built-in reference configuration
    Reference(ReferenceArgs),
}

/// Where the planning input comes from.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Configuration file (YAML, JSON or TOML)
    #[arg(value_hint = ValueHint::FilePath)]
    pub config: PathBuf,
    /// Partial tables layered over the configuration
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub overrides: Option<PathBuf>,
    /// Market data overrides (supply, price, disruption per material)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub market: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Scenario to plan (defaults to the configuration's own tag)
    #[arg(long)]
    pub scenario: Option<Scenario>,
    /// Cap on feasibility repair passes
    #[arg(long, default_value_t = 50)]
    pub max_iterations: usize,
    /// Write the full solution as JSON
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct BottlenecksArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[arg(long)]
    pub scenario: Option<Scenario>,
    #[arg(long, default_value_t = 50)]
    pub max_iterations: usize,
    /// Write the bottleneck report as JSON
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Comma separated scenarios (defaults to all of them)
    #[arg(long, value_delimiter = ',')]
    pub scenarios: Vec<Scenario>,
    /// Threading hint (`auto` or integer)
    #[arg(long, default_value = "auto")]
    pub threads: String,
    #[arg(long, default_value_t = 50)]
    pub max_iterations: usize,
    /// Write the comparison as JSON
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ReferenceArgs {
    /// Output file; the extension picks the format
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub out: Option<PathBuf>,
    /// Format when printing to stdout
    #[arg(long, value_enum, default_value = "yaml")]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
    Toml,
}
