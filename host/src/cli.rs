//! CLI surface (spec.md §6): a `clap` derive with long flags,
//! `require_equals`, and an `env` fallback for the log level.

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Local,
    Cluster,
}

#[derive(Debug, Parser)]
#[command(name = "eas-host", about = "Task-orchestration engine for the transit-detection testbench")]
pub struct RunArgs {
    /// Path to the job descriptor to expand and run.
    #[arg(long, require_equals = true)]
    pub tasks: String,

    /// Dispatch mode: run in-process, or publish to the broker for a
    /// worker pool to consume.
    #[arg(long, value_enum, require_equals = true, default_value = "local")]
    pub mode: Mode,

    /// Path to the key:value engine configuration file.
    #[arg(long, require_equals = true, default_value = "eas.conf")]
    pub config: String,

    #[arg(long, env = "EAS_LOG_LEVEL", require_equals = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Parser)]
pub struct DrainArgs {
    #[arg(long, require_equals = true, default_value = "eas.conf")]
    pub config: String,

    #[arg(long, env = "EAS_LOG_LEVEL", require_equals = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Parser)]
pub struct InitArgs {
    #[arg(long, require_equals = true, default_value = "eas.conf")]
    pub config: String,

    /// Drop and recreate every dimension and fact table.
    #[arg(long)]
    pub refresh: bool,

    #[arg(long, env = "EAS_LOG_LEVEL", require_equals = true, default_value = "info")]
    pub log_level: String,
}
