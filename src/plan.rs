//! Resolution of the two fixed commands into a startup plan.
//!
//! Sources are layered, lowest precedence first: built-in preset, JSON plan
//! file, environment, command line. Nothing here executes anything.
use crate::cli::PlanArgs;
use crate::command::StepCommand;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const PLAN_SCHEMA_VERSION: u32 = 1;

pub const ENV_CONFIG: &str = "HANDOFF_CONFIG";
pub const ENV_PRESET: &str = "HANDOFF_PRESET";
pub const ENV_MIGRATE: &str = "HANDOFF_MIGRATE_CMD";
pub const ENV_SERVE: &str = "HANDOFF_SERVE_CMD";

const DEFAULT_SERVE: &str = "gunicorn app:app";

/// Built-in migrate/serve pairs.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationPreset {
    /// Upgrade through the framework's migration CLI
    #[default]
    FlaskDb,
    /// Upgrade through a standalone migration script
    Script,
}

impl MigrationPreset {
    pub fn migrate_line(self) -> &'static str {
        match self {
            MigrationPreset::FlaskDb => "flask db upgrade",
            MigrationPreset::Script => "python migrate.py",
        }
    }

    pub fn serve_line(self) -> &'static str {
        DEFAULT_SERVE
    }

    pub fn name(self) -> &'static str {
        match self {
            MigrationPreset::FlaskDb => "flask-db",
            MigrationPreset::Script => "script",
        }
    }

    fn from_name(name: &str) -> Result<Self> {
        let name = name.trim();
        [MigrationPreset::FlaskDb, MigrationPreset::Script]
            .into_iter()
            .find(|preset| preset.name() == name)
            .ok_or_else(|| anyhow!("unknown preset {name:?} (expected flask-db or script)"))
    }
}

/// On-disk plan, every field but the schema version optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanFile {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<MigrationPreset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serve: Option<String>,
}

/// The two commands for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupPlan {
    pub migrate: StepCommand,
    pub serve: StepCommand,
}

/// Where each command line came from, for `show` output and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Preset,
    File,
    Env,
    Cli,
}

impl Origin {
    pub fn name(self) -> &'static str {
        match self {
            Origin::Preset => "preset",
            Origin::File => "file",
            Origin::Env => "env",
            Origin::Cli => "cli",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlan {
    pub plan: StartupPlan,
    pub preset: MigrationPreset,
    pub config_path: Option<PathBuf>,
    pub migrate_origin: Origin,
    pub serve_origin: Origin,
}

/// Load and validate a plan file.
pub fn load_plan_file(path: &Path) -> Result<PlanFile> {
    let bytes = fs::read(path).with_context(|| format!("read plan file {}", path.display()))?;
    let file: PlanFile = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse plan file {}", path.display()))?;
    if file.schema_version != PLAN_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported plan schema_version {} in {}",
            file.schema_version,
            path.display()
        ));
    }
    Ok(file)
}

/// Resolve the plan from the process environment.
pub fn resolve(args: &PlanArgs) -> Result<ResolvedPlan> {
    resolve_with_env(args, |key| std::env::var(key).ok())
}

/// Resolve the plan with an explicit environment lookup.
pub fn resolve_with_env<F>(args: &PlanArgs, env: F) -> Result<ResolvedPlan>
where
    F: Fn(&str) -> Option<String>,
{
    let env_value = |key: &str| env(key).filter(|value| !value.trim().is_empty());
    let cli_value = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());

    let config_path = args
        .config
        .clone()
        .or_else(|| env_value(ENV_CONFIG).map(PathBuf::from));
    let file = match &config_path {
        Some(path) => Some(load_plan_file(path)?),
        None => None,
    };
    let file = file.unwrap_or_default();

    let preset = match (args.preset, env_value(ENV_PRESET)) {
        (Some(preset), _) => preset,
        (None, Some(name)) => {
            MigrationPreset::from_name(&name).with_context(|| format!("read {ENV_PRESET}"))?
        }
        (None, None) => file.preset.unwrap_or_default(),
    };

    let pick = |cli: Option<String>, env_key: &str, from_file: &Option<String>, preset: &str| {
        if let Some(line) = cli {
            return (line, Origin::Cli);
        }
        if let Some(line) = env_value(env_key) {
            return (line, Origin::Env);
        }
        if let Some(line) = from_file.clone().filter(|v| !v.trim().is_empty()) {
            return (line, Origin::File);
        }
        (preset.to_string(), Origin::Preset)
    };

    let (migrate_line, migrate_origin) = pick(
        cli_value(&args.migrate),
        ENV_MIGRATE,
        &file.migrate,
        preset.migrate_line(),
    );
    let (serve_line, serve_origin) = pick(
        cli_value(&args.serve),
        ENV_SERVE,
        &file.serve,
        preset.serve_line(),
    );

    let migrate = StepCommand::parse(&migrate_line).context("resolve migration command")?;
    let serve = StepCommand::parse(&serve_line).context("resolve server command")?;

    Ok(ResolvedPlan {
        plan: StartupPlan { migrate, serve },
        preset,
        config_path,
        migrate_origin,
        serve_origin,
    })
}
