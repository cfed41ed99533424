//! Process launching: run a step to completion, or become it.
use crate::command::{exit_code, spawn_failure_code, StepCommand, EXIT_NOT_FOUND};
use std::io::{self, Write};
use std::process::Command;
use std::time::Instant;

/// The seam between the sequencer and the operating system.
pub trait Launcher {
    /// Run `step` as a child with inherited stdio and block until it exits.
    ///
    /// Returns the shell-style exit code; there is no timeout.
    fn run(&mut self, step: &StepCommand) -> i32;

    /// Replace the current process with `step`.
    ///
    /// Only returns when control came back, i.e. the hand-off did not replace
    /// the process. The returned code is what the caller should exit with.
    fn exec(&mut self, step: &StepCommand) -> i32;
}

/// Launches real processes.
#[derive(Debug, Default)]
pub struct SystemLauncher;

impl SystemLauncher {
    fn command(step: &StepCommand) -> Result<Command, i32> {
        let program = match step.resolve_program() {
            Ok(program) => program,
            Err(err) => {
                eprintln!("handoff: {err:#}");
                return Err(EXIT_NOT_FOUND);
            }
        };
        tracing::debug!(program = %program.display(), "resolved program");
        let mut command = Command::new(program);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // argv[0] stays the configured word, not the resolved path.
            command.arg0(&step.program);
        }
        command.args(&step.args);
        Ok(command)
    }
}

impl Launcher for SystemLauncher {
    fn run(&mut self, step: &StepCommand) -> i32 {
        let mut command = match Self::command(step) {
            Ok(command) => command,
            Err(code) => return code,
        };
        let start = Instant::now();
        let status = match command.status() {
            Ok(status) => status,
            Err(err) => {
                eprintln!("handoff: {}: {err}", step.program);
                return spawn_failure_code(&err);
            }
        };
        let elapsed_ms = start.elapsed().as_millis();
        let code = exit_code(&status);
        tracing::info!(elapsed_ms, code, %status, "step exited");
        code
    }

    #[cfg(unix)]
    fn exec(&mut self, step: &StepCommand) -> i32 {
        use std::os::unix::process::CommandExt;

        let mut command = match Self::command(step) {
            Ok(command) => command,
            Err(code) => return code,
        };
        // Nothing buffered may be lost when the image is replaced.
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        let err = command.exec();
        eprintln!("handoff: {}: {err}", step.program);
        spawn_failure_code(&err)
    }

    #[cfg(not(unix))]
    fn exec(&mut self, step: &StepCommand) -> i32 {
        tracing::warn!("process replacement is unavailable; running server as a child");
        let _ = io::stdout().flush();
        self.run(step)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> StepCommand {
        StepCommand::new("sh", ["-c", script])
    }

    #[test]
    fn run_reports_exit_codes() {
        let mut launcher = SystemLauncher;
        assert_eq!(launcher.run(&sh("exit 0")), 0);
        assert_eq!(launcher.run(&sh("exit 7")), 7);
    }

    #[test]
    fn run_maps_signals() {
        let mut launcher = SystemLauncher;
        assert_eq!(launcher.run(&sh("kill -TERM $$")), 143);
    }

    #[test]
    fn run_reports_missing_programs() {
        let mut launcher = SystemLauncher;
        let step = StepCommand::new("handoff-no-such-program-xyz", Vec::<String>::new());
        assert_eq!(launcher.run(&step), EXIT_NOT_FOUND);
    }

    #[test]
    fn exec_of_missing_program_returns() {
        let mut launcher = SystemLauncher;
        let step = StepCommand::new("/nonexistent/handoff-server", Vec::<String>::new());
        assert_eq!(launcher.exec(&step), EXIT_NOT_FOUND);
    }

    #[test]
    fn run_passes_configured_name_as_argv0() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("argv0");
        let step = sh(&format!("echo \"$0\" > '{}'", out.display()));
        let mut launcher = SystemLauncher;
        assert_eq!(launcher.run(&step), 0);
        assert_eq!(std::fs::read_to_string(&out).unwrap().trim(), "sh");
    }

    #[test]
    fn run_of_non_executable_file_cannot_execute() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migrate.sh");
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        let step = StepCommand::new(path.to_str().unwrap(), Vec::<String>::new());
        let mut launcher = SystemLauncher;
        assert_eq!(launcher.run(&step), crate::command::EXIT_CANNOT_EXECUTE);
    }
}
