//! Base system bootstrap and fstab generation.

use crate::models::{Bootloader, BASE_PACKAGES, INSTALL_ROOT};
use crate::orchestrator::InstallContext;
use crate::steps::write_target_file;

/// Microcode package for the running CPU, from /proc/cpuinfo content.
pub fn microcode_package(cpuinfo: &str) -> Option<&'static str> {
    if cpuinfo.contains("GenuineIntel") {
        Some("intel-ucode")
    } else if cpuinfo.contains("AuthenticAMD") {
        Some("amd-ucode")
    } else {
        None
    }
}

/// The full package set for this installation: base packages plus microcode,
/// network stack and bootloader packages as chosen.
pub fn package_list(ctx: &InstallContext, cpuinfo: &str) -> Vec<&'static str> {
    let mut packages: Vec<&'static str> = BASE_PACKAGES.to_vec();

    if let Some(ucode) = microcode_package(cpuinfo) {
        packages.push(ucode);
    }

    if let Some(stack) = ctx.state.network_stack {
        if let Some(pkg) = stack.package() {
            packages.push(pkg);
        }
    }

    if ctx.state.bootloader == Some(Bootloader::GeneratedConfig) {
        packages.push("grub");
        packages.push("efibootmgr");
    }

    packages
}

/// Run pacstrap against the mounted target. This is the long pole of the
/// whole run; it blocks until the package bootstrapper exits.
pub fn install_base(ctx: &mut InstallContext) -> anyhow::Result<()> {
    let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").unwrap_or_default();
    if let Some(ucode) = microcode_package(&cpuinfo) {
        ctx.state.microcode = Some(ucode.to_string());
    }

    let packages = package_list(ctx, &cpuinfo);
    log::info!("bootstrapping {} packages", packages.len());

    let mut args = vec!["-K", INSTALL_ROOT];
    args.extend(packages);
    ctx.runner.run("pacstrap", &args)
}

/// Capture `genfstab -U` output and persist it as the target's fstab.
pub fn generate_fstab(ctx: &mut InstallContext) -> anyhow::Result<()> {
    let fstab = ctx.runner.run_capture("genfstab", &["-U", INSTALL_ROOT])?;
    write_target_file(ctx, "etc/fstab", &format!("{}\n", fstab.trim_end()))
}
