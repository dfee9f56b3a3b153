//! Step orchestration: sequential execution with abort-on-error semantics.
//!
//! The runner executes a fixed ordered list of named steps against one
//! target system. One step runs to completion before the next begins; there
//! are no retries and no rollback of completed side effects beyond the mount
//! unwind. On the first failing required step the registered mounts are
//! released in reverse order and the run terminates with an error naming the
//! failing step.

pub mod mounts;
pub mod signal;

pub use mounts::MountTable;

use crate::error::{InstallError, Result, StepError};
use crate::hardware::SystemReport;
use crate::models::InstallState;
use crate::prompt::{Prompter, ScriptedPrompter};
use crate::steps::Step;
use crate::system::Runner;
use std::path::PathBuf;

/// Everything a step body can touch, threaded by reference through the run.
///
/// There are no process-wide singletons; shared state between steps is
/// exactly what lives here.
pub struct InstallContext {
    pub state: InstallState,
    pub report: SystemReport,
    pub runner: Runner,
    pub mounts: MountTable,
    pub prompter: Box<dyn Prompter>,
}

impl InstallContext {
    /// Context for a real installation run.
    pub fn new(report: SystemReport, prompter: Box<dyn Prompter>) -> Self {
        InstallContext {
            state: InstallState::new(),
            report,
            runner: Runner::new(),
            mounts: MountTable::new(),
            prompter,
        }
    }

    /// Context with a no-op runner and scripted answers, for tests.
    pub fn scripted<I, S>(report: SystemReport, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        InstallContext {
            state: InstallState::new(),
            report,
            runner: Runner::noop(),
            mounts: MountTable::noop(),
            prompter: Box::new(ScriptedPrompter::new(answers)),
        }
    }
}

/// Executes an ordered list of steps, reporting progress and aborting the
/// whole run on the first required failure.
pub struct StepRunner {
    steps: Vec<Step>,
    snapshot_path: PathBuf,
}

impl StepRunner {
    pub fn new(steps: Vec<Step>) -> Self {
        StepRunner {
            steps,
            snapshot_path: PathBuf::from("ironstrap-state.json"),
        }
    }

    pub fn with_snapshot_path(mut self, path: PathBuf) -> Self {
        self.snapshot_path = path;
        self
    }

    /// Run every step in insertion order.
    ///
    /// Progress `(index, total, name)` is emitted before each step; it is
    /// purely observational. A failing required step releases the mounts and
    /// surfaces as `StepError` naming the step. A failing optional step asks
    /// the operator whether to continue and logs the decision either way.
    pub fn run(&self, ctx: &mut InstallContext) -> Result<()> {
        let total = self.steps.len();

        for (index, step) in self.steps.iter().enumerate() {
            if signal::interrupted() {
                log::warn!("interrupt received, unwinding mounts");
                return self.abort(ctx, InstallError::Interrupted);
            }

            log::info!("[{}/{}] {}", index + 1, total, step.name);

            match step.run(ctx) {
                Ok(()) => {}
                Err(source) if step.required => {
                    log::error!("step '{}' failed: {:#}", step.name, source);
                    return self.abort(
                        ctx,
                        StepError {
                            step: step.name.to_string(),
                            source,
                        }
                        .into(),
                    );
                }
                Err(source) => {
                    log::warn!("optional step '{}' failed: {:#}", step.name, source);
                    let go_on = ctx
                        .prompter
                        .confirm(
                            &format!("step '{}' failed; continue without it?", step.name),
                            false,
                        )
                        .unwrap_or(false);
                    if go_on {
                        log::warn!(
                            "operator chose to continue after failure of '{}'",
                            step.name
                        );
                    } else {
                        log::error!("operator aborted after failure of '{}'", step.name);
                        return self.abort(
                            ctx,
                            StepError {
                                step: step.name.to_string(),
                                source,
                            }
                            .into(),
                        );
                    }
                }
            }
        }

        ctx.mounts.unmount_all();
        self.write_snapshot(ctx);
        log::info!("all {} steps completed", total);
        Ok(())
    }

    fn abort(&self, ctx: &mut InstallContext, err: InstallError) -> Result<()> {
        ctx.mounts.unmount_all();
        self.write_snapshot(ctx);
        Err(err)
    }

    /// Best-effort diagnostic snapshot of the final state, for post-mortem
    /// inspection. Passwords never enter `InstallState`, so nothing secret
    /// can leak here.
    fn write_snapshot(&self, ctx: &InstallContext) {
        if ctx.runner.is_noop() {
            return;
        }
        match serde_json::to_string_pretty(&ctx.state) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.snapshot_path, json) {
                    log::warn!(
                        "failed to write state snapshot {}: {}",
                        self.snapshot_path.display(),
                        e
                    );
                }
            }
            Err(e) => log::warn!("failed to serialize state snapshot: {}", e),
        }
    }
}
