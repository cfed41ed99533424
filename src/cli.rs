//! CLI argument parsing for the startup sequencer.
//!
//! Every flag is optional: a bare `handoff` runs the built-in plan, which is
//! what a container entrypoint invokes.
use crate::plan::MigrationPreset;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "handoff",
    version,
    about = "Run database migrations, then exec into the application server",
    after_help = "Commands:\n  run   Migrate, then replace this process with the server (default)\n  show  Print the resolved plan without running anything\n\nEnvironment:\n  HANDOFF_CONFIG       Plan file path (same as --config)\n  HANDOFF_PRESET       flask-db | script\n  HANDOFF_MIGRATE_CMD  Migration command line\n  HANDOFF_SERVE_CMD    Server command line\n  RUST_LOG             Diagnostic filter (default: handoff=warn)\n\nExamples:\n  handoff\n  handoff --preset script\n  handoff --serve 'gunicorn --bind 0.0.0.0:5000 app:app'\n  handoff show --json"
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub plan: PlanArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Run(RunArgs),
    Show(ShowArgs),
}

/// Plan overrides shared by every command.
///
/// Unset flags fall through to the environment, then the plan file, then the
/// preset defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct PlanArgs {
    /// JSON plan file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Built-in migrate/serve pair to start from
    #[arg(long, value_enum, global = true)]
    pub preset: Option<MigrationPreset>,

    /// Migration command line (shell quoting rules, no shell expansion)
    #[arg(long, value_name = "CMD", global = true)]
    pub migrate: Option<String>,

    /// Server command line (shell quoting rules, no shell expansion)
    #[arg(long, value_name = "CMD", global = true)]
    pub serve: Option<String>,
}

#[derive(Parser, Debug)]
#[command(about = "Run migrations, then replace this process with the server")]
pub struct RunArgs {}

#[derive(Parser, Debug)]
#[command(about = "Print the resolved plan without running anything")]
pub struct ShowArgs {
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}
