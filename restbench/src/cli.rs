use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    HumanReadable,
    /// Emit a JSON summary line to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "restbench",
    author,
    version,
    about = "REST API benchmark/load testing tool",
    long_about = "restbench repeatedly drives a declarative HTTP request flow against a service.\n\nA flow file defines five stage lists (before, beforeMain, main, afterMain, after); `main` runs once per iteration with `#{INDEX}` replaced by the iteration index. `requests` iterations run with at most `limit` concurrently in flight.",
    after_help = "Examples:\n  restbench run flow.yaml --requests 1000 --limit 10\n  restbench run flow.json --requests 100 --limit 1 --output json"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a benchmark flow
    #[command(
        long_about = "Run a flow file. CLI flags override values from the file's `options` table."
    )]
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Flow definition file (.yaml, .yml or .json)
    pub flow: PathBuf,

    /// Total number of iterations to run
    #[arg(long)]
    pub requests: Option<u64>,

    /// Max concurrently in-flight iterations
    #[arg(long)]
    pub limit: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,

    /// Suppress the per-failure error lines on stderr
    #[arg(long)]
    pub quiet_errors: bool,
}
