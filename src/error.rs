//! Unified error type hierarchy for ironstrap
//!
//! Provides structured error handling with PreconditionError, MountError and
//! StepError, plus the top-level InstallError that maps every failure to the
//! process exit code reported to the operator.

use std::io;
use thiserror::Error;

/// Failures detected before any destructive action is taken.
///
/// These always terminate the run with exit code 1 and never trigger the
/// mount unwind path, because nothing has been mounted yet.
#[derive(Error, Debug)]
pub enum PreconditionError {
    #[error("must be run as root (euid != 0)")]
    NotRoot,

    #[error("required tool not found in PATH: {0}")]
    MissingTool(String),

    #[error("system did not boot in UEFI mode (/sys/firmware/efi missing)")]
    NotEfi,

    #[error("network verification failed and operator declined to continue")]
    NoNetwork,

    #[error("insufficient memory: {found} MiB available, {required} MiB required")]
    LowMemory { found: u64, required: u64 },

    #[error("not a block device: {0}")]
    NotABlockDevice(String),

    #[error("operator declined: {0}")]
    Declined(String),
}

/// Mount table operation errors.
#[derive(Error, Debug)]
pub enum MountError {
    #[error("failed to create mount target {target}: {source}")]
    CreateTarget {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("mount of {source_dev} on {target} failed: {reason}")]
    MountFailed {
        source_dev: String,
        target: String,
        reason: String,
    },
}

/// A named installation step failed.
///
/// Wraps the underlying cause so the failing step is always identifiable in
/// the final error message, as the runner contract requires.
#[derive(Error, Debug)]
#[error("step '{step}' failed: {source}")]
pub struct StepError {
    pub step: String,
    #[source]
    pub source: anyhow::Error,
}

/// Top-level error type for the whole installation run.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Mount(#[from] MountError),

    #[error(transparent)]
    Step(#[from] StepError),

    #[error("installation interrupted by operator")]
    Interrupted,
}

impl InstallError {
    /// Process exit code for this failure.
    ///
    /// Formatting, partitioning and mounting failures exit 2; every other
    /// failure (preconditions, declined confirmations, configuration steps)
    /// exits 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallError::Mount(_) => 2,
            InstallError::Step(e) if is_provisioning_step(&e.step) => 2,
            _ => 1,
        }
    }
}

/// Steps that wipe, format or mount the target disk.
fn is_provisioning_step(name: &str) -> bool {
    matches!(name, "partition-disk" | "format-partitions" | "mount-filesystems")
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, InstallError>;
