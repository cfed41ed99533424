//! A single external command and the exit-code conventions used for it.
use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Exit code reported when the program could not be found.
pub const EXIT_NOT_FOUND: i32 = 127;
/// Exit code reported when the program exists but could not be started.
pub const EXIT_CANNOT_EXECUTE: i32 = 126;
/// Offset added to a terminating signal number.
#[cfg(unix)]
const SIGNAL_EXIT_BASE: i32 = 128;

/// One external command: a program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl StepCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a command line with POSIX shell quoting rules.
    ///
    /// No expansion happens: `$VAR`, globs and redirections stay literal.
    pub fn parse(line: &str) -> Result<Self> {
        let mut words =
            shell_words::split(line).with_context(|| format!("parse command line: {line}"))?;
        if words.is_empty() {
            return Err(anyhow!("command line is empty"));
        }
        let program = words.remove(0);
        if program.is_empty() {
            return Err(anyhow!("command line has an empty program name"));
        }
        Ok(Self::new(program, words))
    }

    /// Locate the program the way a shell would.
    ///
    /// Names containing a path separator are used as given; bare names are
    /// searched on `PATH`.
    pub fn resolve_program(&self) -> Result<PathBuf> {
        let path = Path::new(&self.program);
        if path.components().count() > 1 {
            return Ok(path.to_path_buf());
        }
        which::which(&self.program).with_context(|| format!("{}: command not found", self.program))
    }

    /// The full argv, program first.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for StepCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_words::join(self.argv()))
    }
}

/// Convert a finished child's status into a shell-style exit code.
pub fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return SIGNAL_EXIT_BASE + signal;
        }
    }
    1
}

/// Exit code for a command that never started.
pub fn spawn_failure_code(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::NotFound => EXIT_NOT_FOUND,
        _ => EXIT_CANNOT_EXECUTE,
    }
}
