//! Shared helpers for driving the built `handoff` binary.

use std::path::Path;
use std::process::{Command, Output};

pub fn handoff_bin() -> &'static str {
    env!("CARGO_BIN_EXE_handoff")
}

/// A `handoff` command isolated from the caller's plan environment.
pub fn handoff(cwd: &Path) -> Command {
    let mut command = Command::new(handoff_bin());
    command
        .current_dir(cwd)
        .env_remove("HANDOFF_CONFIG")
        .env_remove("HANDOFF_PRESET")
        .env_remove("HANDOFF_MIGRATE_CMD")
        .env_remove("HANDOFF_SERVE_CMD")
        .env_remove("RUST_LOG");
    command
}

/// Quote a `/bin/sh -c` script as a single command line.
#[allow(dead_code)]
pub fn sh_line(script: &str) -> String {
    shell_words::join(["sh", "-c", script])
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}
