//! System module: validated command execution and chroot helpers.
//!
//! Every external tool the installer touches (sgdisk, mkfs.*, pacstrap,
//! arch-chroot, systemctl, ...) is treated as an opaque collaborator: the
//! call either succeeds or the surrounding step fails. The `Runner` records
//! each invocation so a run can be reconstructed from the session log, and
//! supports a no-op mode that the test suites use to exercise the step
//! sequence without touching the machine.

use anyhow::{bail, Context};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::process::{Command, Stdio};

use crate::models::INSTALL_ROOT;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_-]{0,31}$").expect("username regex"));

static HOSTNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$").expect("hostname regex"));

/// Validate a username before it reaches any command line.
///
/// Arguments are always passed as separate argv entries, never interpolated
/// into a shell string; the validation still rejects values that useradd or
/// chpasswd would choke on.
pub fn validate_username(name: &str) -> anyhow::Result<()> {
    if USERNAME_RE.is_match(name) {
        Ok(())
    } else {
        bail!(
            "invalid username '{}': lowercase letters, digits, '-' and '_' only",
            name
        )
    }
}

/// Validate a hostname against the usual single-label rules.
pub fn validate_hostname(name: &str) -> anyhow::Result<()> {
    if HOSTNAME_RE.is_match(name) {
        Ok(())
    } else {
        bail!("invalid hostname '{}'", name)
    }
}

/// Check whether `tool` resolves in PATH.
pub fn tool_exists(tool: &str) -> bool {
    match Command::new("which").arg(tool).output() {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

/// Executes external commands, recording every invocation.
///
/// In no-op mode commands are recorded and logged but never spawned; capture
/// calls return empty output. All step bodies and the mount table go through
/// this type, which is what makes the abort/unwind properties testable.
pub struct Runner {
    noop: bool,
    history: Vec<String>,
}

impl Runner {
    /// Runner that actually executes commands.
    pub fn new() -> Self {
        Runner {
            noop: false,
            history: Vec::new(),
        }
    }

    /// Runner that records invocations without executing them.
    pub fn noop() -> Self {
        Runner {
            noop: true,
            history: Vec::new(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.noop
    }

    /// Every invocation so far, rendered one per entry.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    fn record(&mut self, program: &str, args: &[&str]) -> String {
        let rendered = if args.is_empty() {
            program.to_string()
        } else {
            format!("{} {}", program, args.join(" "))
        };
        log::debug!("exec: {}", rendered);
        self.history.push(rendered.clone());
        rendered
    }

    /// Run a command to completion, failing if it exits non-zero.
    pub fn run(&mut self, program: &str, args: &[&str]) -> anyhow::Result<()> {
        let rendered = self.record(program, args);
        if self.noop {
            return Ok(());
        }

        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to execute {}", program))?;

        log_captured(program, &output.stdout, &output.stderr);

        if output.status.success() {
            Ok(())
        } else {
            bail!("'{}' exited with status {:?}", rendered, output.status.code())
        }
    }

    /// Run a command and return its trimmed stdout.
    pub fn run_capture(&mut self, program: &str, args: &[&str]) -> anyhow::Result<String> {
        let rendered = self.record(program, args);
        if self.noop {
            return Ok(String::new());
        }

        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to execute {}", program))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            log_captured(program, &output.stdout, &output.stderr);
            bail!("'{}' exited with status {:?}", rendered, output.status.code())
        }
    }

    /// Run a command feeding `input` to its stdin.
    ///
    /// The input is never logged; this is the path used for chpasswd.
    pub fn run_with_stdin(
        &mut self,
        program: &str,
        args: &[&str],
        input: &str,
    ) -> anyhow::Result<()> {
        let rendered = self.record(program, args);
        if self.noop {
            return Ok(());
        }

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to execute {}", program))?;

        child
            .stdin
            .take()
            .context("child stdin unavailable")?
            .write_all(input.as_bytes())
            .with_context(|| format!("failed to write to {} stdin", program))?;

        let output = child
            .wait_with_output()
            .with_context(|| format!("failed to wait for {}", program))?;

        log_captured(program, &output.stdout, &output.stderr);

        if output.status.success() {
            Ok(())
        } else {
            bail!("'{}' exited with status {:?}", rendered, output.status.code())
        }
    }

    /// Run a command inside the target root via arch-chroot.
    pub fn run_in_target(&mut self, program: &str, args: &[&str]) -> anyhow::Result<()> {
        let mut chroot_args = vec![INSTALL_ROOT, program];
        chroot_args.extend_from_slice(args);
        self.run("arch-chroot", &chroot_args)
    }

    /// As `run_in_target`, with stdin data (chpasswd inside the chroot).
    pub fn run_in_target_with_stdin(
        &mut self,
        program: &str,
        args: &[&str],
        input: &str,
    ) -> anyhow::Result<()> {
        let mut chroot_args = vec![INSTALL_ROOT, program];
        chroot_args.extend_from_slice(args);
        self.run_with_stdin("arch-chroot", &chroot_args, input)
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

fn log_captured(program: &str, stdout: &[u8], stderr: &[u8]) {
    let stdout = String::from_utf8_lossy(stdout);
    if !stdout.trim().is_empty() {
        log::debug!("[{}] stdout: {}", program, stdout.trim_end());
    }
    let stderr = String::from_utf8_lossy(stderr);
    if !stderr.trim().is_empty() {
        log::debug!("[{}] stderr: {}", program, stderr.trim_end());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_validation_valid() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("_svc-user").is_ok());
        assert!(validate_username("a1_b2").is_ok());
    }

    #[test]
    fn test_username_validation_invalid() {
        assert!(validate_username("Alice").is_err()); // uppercase
        assert!(validate_username("1user").is_err()); // leading digit
        assert!(validate_username("me; rm -rf /").is_err()); // shell injection
        assert!(validate_username("").is_err());
    }

    #[test]
    fn test_hostname_validation() {
        assert!(validate_hostname("archbox").is_ok());
        assert!(validate_hostname("web-01").is_ok());
        assert!(validate_hostname("-bad").is_err());
        assert!(validate_hostname("bad-").is_err());
        assert!(validate_hostname("host name").is_err());
    }

    #[test]
    fn test_noop_runner_records_without_executing() {
        let mut runner = Runner::noop();
        runner
            .run("sgdisk", &["--zap-all", "/dev/sda"])
            .expect("noop run always succeeds");
        assert_eq!(runner.history(), ["sgdisk --zap-all /dev/sda"]);
    }

    #[test]
    fn test_noop_capture_is_empty() {
        let mut runner = Runner::noop();
        let out = runner.run_capture("lsblk", &["-J"]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_run_in_target_prepends_chroot() {
        let mut runner = Runner::noop();
        runner.run_in_target("locale-gen", &[]).unwrap();
        assert_eq!(runner.history(), ["arch-chroot /mnt locale-gen"]);
    }

    #[test]
    fn test_real_runner_checks_exit_status() {
        let mut runner = Runner::new();
        // `false` is universally available and always exits 1.
        assert!(runner.run("false", &[]).is_err());
        assert!(runner.run("true", &[]).is_ok());
    }

    #[test]
    fn test_run_capture_returns_stdout() {
        let mut runner = Runner::new();
        let out = runner.run_capture("echo", &["hello"]).unwrap();
        assert_eq!(out, "hello");
    }
}
