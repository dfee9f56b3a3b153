//! Mounting the freshly formatted filesystems under the install root.

use crate::models::{INSTALL_ROOT, ROOT_MOUNT_OPTIONS};
use crate::orchestrator::InstallContext;
use anyhow::Context;

/// Mount root, ESP and the optional data partition, registering each with
/// the mount table so the unwind order is the reverse of this sequence.
pub fn mount_filesystems(ctx: &mut InstallContext) -> anyhow::Result<()> {
    let root = ctx.state.require_root_partition()?.to_string();
    let efi = ctx
        .state
        .efi_partition
        .clone()
        .context("EFI partition not set; partition step did not run")?;

    ctx.mounts
        .mount(&mut ctx.runner, &root, INSTALL_ROOT, Some(ROOT_MOUNT_OPTIONS))?;

    let boot_target = format!("{}/boot", INSTALL_ROOT);
    ctx.mounts.mount(&mut ctx.runner, &efi, &boot_target, None)?;

    if let Some(data) = ctx.state.data_partition.clone() {
        let data_target = format!("{}/data", INSTALL_ROOT);
        ctx.mounts
            .mount(&mut ctx.runner, &data, &data_target, None)?;
    }

    Ok(())
}
