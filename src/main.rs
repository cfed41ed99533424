use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod command;
mod launch;
mod plan;
mod sequencer;

use cli::{Command, RootArgs, ShowArgs};
use launch::SystemLauncher;
use plan::{MigrationPreset, Origin, ResolvedPlan};
use sequencer::Sequencer;

const DEFAULT_LOG_FILTER: &str = "handoff=warn";

fn main() -> ExitCode {
    init_tracing();
    let args = RootArgs::parse();

    let result = match &args.command {
        None | Some(Command::Run(_)) => cmd_run(&args.plan),
        Some(Command::Show(show)) => cmd_show(&args.plan, show),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr so stdout carries only progress lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn cmd_run(plan_args: &cli::PlanArgs) -> Result<ExitCode> {
    let resolved = plan::resolve(plan_args)?;
    tracing::info!(
        migrate = %resolved.plan.migrate,
        serve = %resolved.plan.serve,
        preset = resolved.preset.name(),
        "resolved startup plan"
    );
    let mut sequencer = Sequencer::new(resolved.plan, SystemLauncher);
    let outcome = sequencer.run();
    tracing::debug!(phase = %sequencer.phase(), code = outcome.code(), "sequencer returned");
    Ok(ExitCode::from(exit_status_byte(outcome.code())))
}

#[derive(Serialize)]
struct PlanView<'a> {
    preset: MigrationPreset,
    config: Option<&'a PathBuf>,
    migrate: StepView,
    serve: StepView,
}

#[derive(Serialize)]
struct StepView {
    command_line: String,
    argv: Vec<String>,
    origin: Origin,
}

fn cmd_show(plan_args: &cli::PlanArgs, args: &ShowArgs) -> Result<ExitCode> {
    let resolved = plan::resolve(plan_args)?;
    if args.json {
        let view = plan_view(&resolved);
        let text = serde_json::to_string_pretty(&view).context("serialize plan")?;
        println!("{text}");
        return Ok(ExitCode::SUCCESS);
    }

    println!("preset: {}", resolved.preset.name());
    match &resolved.config_path {
        Some(path) => println!("config: {}", path.display()),
        None => println!("config: <none>"),
    }
    println!(
        "migrate: {} ({})",
        resolved.plan.migrate,
        resolved.migrate_origin.name()
    );
    println!(
        "serve: {} ({})",
        resolved.plan.serve,
        resolved.serve_origin.name()
    );
    Ok(ExitCode::SUCCESS)
}

fn plan_view(resolved: &ResolvedPlan) -> PlanView<'_> {
    let step = |cmd: &command::StepCommand, origin: Origin| StepView {
        command_line: cmd.to_string(),
        argv: cmd.argv().into_iter().map(str::to_string).collect(),
        origin,
    };
    PlanView {
        preset: resolved.preset,
        config: resolved.config_path.as_ref(),
        migrate: step(&resolved.plan.migrate, resolved.migrate_origin),
        serve: step(&resolved.plan.serve, resolved.serve_origin),
    }
}

/// Exit statuses outside 0..=255 cannot be reported verbatim.
fn exit_status_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}
