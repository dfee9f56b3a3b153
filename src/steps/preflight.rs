//! Preconditions checked before any destructive action.

use crate::error::PreconditionError;
use crate::hardware::MIN_MEMORY_MIB;
use crate::models::FirmwareMode;
use crate::orchestrator::InstallContext;
use crate::system::tool_exists;

/// External tools the step bodies shell out to. Checked up front so a
/// missing tool surfaces before the disk is touched, not halfway through.
pub const REQUIRED_TOOLS: [&str; 11] = [
    "sgdisk",
    "partprobe",
    "mkfs.fat",
    "mkfs.btrfs",
    "mkfs.ext4",
    "pacstrap",
    "genfstab",
    "arch-chroot",
    "lsblk",
    "mount",
    "systemctl",
];

/// Verify privileges, firmware mode, memory, tooling and network before the
/// run proceeds.
pub fn run_preflight(ctx: &mut InstallContext) -> anyhow::Result<()> {
    log::info!("system report:\n{}", ctx.report.summary());

    if ctx.report.firmware != FirmwareMode::Efi {
        return Err(PreconditionError::NotEfi.into());
    }

    if ctx.report.total_memory_mib < MIN_MEMORY_MIB {
        return Err(PreconditionError::LowMemory {
            found: ctx.report.total_memory_mib,
            required: MIN_MEMORY_MIB,
        }
        .into());
    }

    // Host assertions are skipped under the no-op runner: tests exercise
    // sequencing, not the live environment.
    if !ctx.runner.is_noop() {
        if !nix::unistd::Uid::effective().is_root() {
            return Err(PreconditionError::NotRoot.into());
        }

        for tool in REQUIRED_TOOLS {
            if !tool_exists(tool) {
                return Err(PreconditionError::MissingTool(tool.to_string()).into());
            }
        }
    }

    verify_network(ctx)
}

/// Network reachability check.
///
/// A failed verification is not silently waved through: the operator makes
/// an explicit decision and the decision is logged before the run acts on
/// it.
fn verify_network(ctx: &mut InstallContext) -> anyhow::Result<()> {
    match ctx
        .runner
        .run("ping", &["-c", "1", "-W", "3", "archlinux.org"])
    {
        Ok(()) => {
            log::info!("network verified");
            Ok(())
        }
        Err(e) => {
            log::warn!("network verification failed: {:#}", e);
            let go_on = ctx
                .prompter
                .confirm("could not verify network; continue anyway?", false)?;
            if go_on {
                log::warn!("operator chose to continue without verified network");
                Ok(())
            } else {
                log::error!("operator aborted after failed network verification");
                Err(PreconditionError::NoNetwork.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::SystemReport;
    use crate::models::DiskInfo;

    fn efi_report() -> SystemReport {
        SystemReport {
            firmware: FirmwareMode::Efi,
            disks: vec![DiskInfo {
                name: "sda".to_string(),
                size: "500G".to_string(),
                model: String::new(),
            }],
            total_memory_mib: 2048,
        }
    }

    #[test]
    fn test_preflight_passes_under_noop_runner() {
        let mut ctx = InstallContext::scripted(efi_report(), Vec::<String>::new());
        run_preflight(&mut ctx).unwrap();
    }

    #[test]
    fn test_bios_firmware_is_rejected() {
        let mut report = efi_report();
        report.firmware = FirmwareMode::Bios;
        let mut ctx = InstallContext::scripted(report, Vec::<String>::new());
        let err = run_preflight(&mut ctx).unwrap_err();
        assert!(err.downcast_ref::<PreconditionError>().is_some());
    }

    #[test]
    fn test_low_memory_is_rejected() {
        let mut report = efi_report();
        report.total_memory_mib = 128;
        let mut ctx = InstallContext::scripted(report, Vec::<String>::new());
        let err = run_preflight(&mut ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PreconditionError>(),
            Some(PreconditionError::LowMemory { .. })
        ));
    }
}
