//! The migrate-then-serve state machine.
//!
//! `NotStarted -> Migrating -> (Migrated | Aborted) -> Serving`. A failed
//! migration is terminal; the server is never launched after it.
use crate::launch::Launcher;
use crate::plan::StartupPlan;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Migrating,
    Migrated,
    Aborted,
    Serving,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::NotStarted => "not_started",
            Phase::Migrating => "migrating",
            Phase::Migrated => "migrated",
            Phase::Aborted => "aborted",
            Phase::Serving => "serving",
        };
        f.write_str(name)
    }
}

/// How a run ended, as seen by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Migration failed with `code`; the server was not launched.
    Aborted { code: i32 },
    /// The server was launched and control came back with `code`.
    Served { code: i32 },
}

impl Outcome {
    pub fn code(self) -> i32 {
        match self {
            Outcome::Aborted { code } | Outcome::Served { code } => code,
        }
    }
}

pub struct Sequencer<L> {
    plan: StartupPlan,
    launcher: L,
    phase: Phase,
}

impl<L: Launcher> Sequencer<L> {
    pub fn new(plan: StartupPlan, launcher: L) -> Self {
        Self {
            plan,
            launcher,
            phase: Phase::NotStarted,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Migrate, then hand off to the server.
    ///
    /// On unix the hand-off replaces the process, so this only returns on a
    /// failed migration or a failed exec.
    pub fn run(&mut self) -> Outcome {
        self.enter(Phase::Migrating);
        println!("==> Running database migrations: {}", self.plan.migrate);
        let code = self.launcher.run(&self.plan.migrate);
        if code != 0 {
            self.enter(Phase::Aborted);
            tracing::info!(code, "migration failed; not starting server");
            return Outcome::Aborted { code };
        }
        self.enter(Phase::Migrated);
        println!("==> Migrations complete. Starting server: {}", self.plan.serve);

        self.enter(Phase::Serving);
        let code = self.launcher.exec(&self.plan.serve);
        Outcome::Served { code }
    }

    fn enter(&mut self, next: Phase) {
        tracing::debug!(from = %self.phase, to = %next, "phase transition");
        self.phase = next;
    }
}
