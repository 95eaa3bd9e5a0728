//! Command-line interface orchestration for sitegraph.
//!
//! The `run` command loads a Parquet site table, builds neighbourhood graphs,
//! partitions them into train/validation/test splits, and writes the four
//! output tables.

mod commands;

pub use commands::{
    Cli, CliError, Command, EdgeScopeArg, ExecutionSummary, RunCommand, StrategyKind,
    render_summary, run_cli,
};
