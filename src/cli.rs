// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `coderunner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "coderunner",
    version,
    about = "Compile and run source files in many languages.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML). A missing default file means defaults.
    #[arg(long, global = true, value_name = "PATH", default_value = "Coderunner.toml")]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CODERUNNER_LOG` or `warn` is used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Execute a source file and print its output.
    Run(RunArgs),
    /// List known languages and whether they can be executed.
    Languages,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Source file to execute.
    pub file: PathBuf,

    /// Language id or alias; inferred from the file extension if omitted.
    #[arg(long, short)]
    pub language: Option<String>,

    /// Execution key; defaults to the file path.
    #[arg(long)]
    pub key: Option<String>,

    /// Run timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print the full result as JSON instead of the program output.
    #[arg(long)]
    pub json: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
