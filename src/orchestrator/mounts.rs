//! Mount lifecycle tracking.
//!
//! Every mount performed during installation is registered here so it can be
//! released on exit, success or failure. The one real invariant of the whole
//! pipeline lives in this file: targets are unmounted in reverse order of
//! mounting, the unwind is best effort and never fails, and running it twice
//! is harmless. `Drop` invokes the unwind as well, so the release is scoped
//! to the table's lifetime even on unexpected exits.

use crate::error::MountError;
use crate::system::Runner;
use std::path::Path;

/// Ordered set of (source, target) pairs for active mounts.
pub struct MountTable {
    mounts: Vec<(String, String)>,
    released: Vec<String>,
    noop: bool,
}

impl MountTable {
    /// Table backed by real mount/umount calls.
    pub fn new() -> Self {
        MountTable {
            mounts: Vec::new(),
            released: Vec::new(),
            noop: false,
        }
    }

    /// Table that tracks ordering without touching the kernel, for tests.
    pub fn noop() -> Self {
        MountTable {
            mounts: Vec::new(),
            released: Vec::new(),
            noop: true,
        }
    }

    /// Currently registered mounts, oldest first.
    pub fn mounts(&self) -> &[(String, String)] {
        &self.mounts
    }

    /// Targets released so far, in release order.
    pub fn released(&self) -> &[String] {
        &self.released
    }

    /// Mount `source` on `target`, creating the target directory first.
    ///
    /// On success the pair is appended to the table; a failure of either the
    /// directory creation or the mount call is an error and nothing is
    /// registered.
    pub fn mount(
        &mut self,
        runner: &mut Runner,
        source: &str,
        target: &str,
        options: Option<&str>,
    ) -> Result<(), MountError> {
        if !self.noop {
            std::fs::create_dir_all(target).map_err(|e| MountError::CreateTarget {
                target: target.to_string(),
                source: e,
            })?;
        }

        let result = match options {
            Some(opts) => runner.run("mount", &["-o", opts, source, target]),
            None => runner.run("mount", &[source, target]),
        };

        result.map_err(|e| MountError::MountFailed {
            source_dev: source.to_string(),
            target: target.to_string(),
            reason: format!("{:#}", e),
        })?;

        log::info!("mounted {} on {}", source, target);
        self.mounts.push((source.to_string(), target.to_string()));
        Ok(())
    }

    /// Release every registered mount in reverse order.
    ///
    /// Individual failures are logged and ignored; this path runs during
    /// unwind and must not itself fail. Unmounting an already-unmounted
    /// target counts as success. Calling this twice is a no-op the second
    /// time.
    pub fn unmount_all(&mut self) {
        while let Some((source, target)) = self.mounts.pop() {
            self.released.push(target.clone());
            if self.noop {
                log::debug!("skipping umount of {} (no-op table)", target);
                continue;
            }
            match nix::mount::umount(Path::new(&target)) {
                Ok(()) => log::info!("unmounted {}", target),
                Err(nix::errno::Errno::EINVAL) | Err(nix::errno::Errno::ENOENT) => {
                    // Not mounted (or already gone); that is what we wanted.
                    log::debug!("{} was not mounted", target)
                }
                Err(e) => log::warn!("failed to unmount {} (was {}): {}", target, source, e),
            }
        }
    }
}

impl Default for MountTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MountTable {
    fn drop(&mut self) {
        self.unmount_all();
    }
}
