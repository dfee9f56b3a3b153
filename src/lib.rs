//! ironstrap: interactive Arch Linux installation orchestrator.
//!
//! The crate runs a fixed ordered list of named steps against one target
//! system: disk partitioning, filesystem creation, base-system bootstrap,
//! in-chroot configuration and bootloader installation. Control flow is
//! strictly sequential with abort-on-error semantics; the only unwinding
//! performed on failure is releasing the mounts registered during the run,
//! in reverse order.
//!
//! The system is organized into functional modules:
//! - **error**: unified error type hierarchy and exit-code mapping
//! - **models**: installation state and core data types
//! - **logging**: stderr + session-file log sink for the `log` facade
//! - **prompt**: operator interaction seam (terminal and scripted)
//! - **system**: validated command execution and chroot helpers
//! - **hardware**: firmware/disk/memory detection
//! - **orchestrator**: step runner and mount lifecycle tracking
//! - **steps**: the installation step bodies, in execution order

pub mod error;
pub mod models;

pub mod logging;
pub mod prompt;

// OS abstraction: command execution with input validation
pub mod system;

// Preflight hardware detection
pub mod hardware;

// Step runner, mount table, interrupt flag
pub mod orchestrator;

// Installation step bodies
pub mod steps;

// Re-export the log crate for macro usage
pub use log;

pub use error::{InstallError, MountError, PreconditionError, Result, StepError};

pub use models::{Bootloader, DiskInfo, FirmwareMode, InstallState, NetworkStack};

pub use hardware::SystemReport;

pub use orchestrator::{InstallContext, MountTable, StepRunner};

pub use prompt::{Prompter, ScriptedPrompter, TerminalPrompter};

pub use steps::{default_steps, Step};

pub use system::Runner;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
