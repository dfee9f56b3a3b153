//! Disk selection, partitioning and formatting.
//!
//! The layout is fixed: a 512 MiB EFI system partition followed by one Btrfs
//! partition consuming the rest of the disk. An optional second disk becomes
//! a single ext4 data partition. Nothing destructive happens before the
//! operator types the disk's name back at the erasure warning.

use crate::error::PreconditionError;
use crate::hardware::is_block_device;
use crate::models::{DiskInfo, ESP_SIZE_MIB};
use crate::orchestrator::InstallContext;
use crate::prompt::Prompter;
use anyhow::Context;

/// Prompt for the installation target (and optionally a data disk), with the
/// typed-back erasure confirmation in front of each.
pub fn select_disk(ctx: &mut InstallContext) -> anyhow::Result<()> {
    let disks = ctx.report.disks.clone();
    if disks.is_empty() {
        anyhow::bail!("no installation targets detected (lsblk reported no internal disks)");
    }

    let labels: Vec<String> = disks.iter().map(DiskInfo::label).collect();
    let index = ctx.prompter.select("select installation disk", &labels)?;
    let target = disks[index].clone();

    if !ctx.runner.is_noop() && !is_block_device(&target.device_path()) {
        return Err(PreconditionError::NotABlockDevice(target.device_path()).into());
    }

    confirm_erasure(ctx.prompter.as_mut(), &target)?;
    log::info!("installation target: {}", target.device_path());
    ctx.state.target_disk = Some(target.clone());

    let others: Vec<DiskInfo> = disks
        .into_iter()
        .filter(|d| d.name != target.name)
        .collect();
    if !others.is_empty()
        && ctx
            .prompter
            .confirm("set up a separate data disk?", false)?
    {
        let labels: Vec<String> = others.iter().map(DiskInfo::label).collect();
        let index = ctx.prompter.select("select data disk", &labels)?;
        let data = others[index].clone();
        if !ctx.runner.is_noop() && !is_block_device(&data.device_path()) {
            return Err(PreconditionError::NotABlockDevice(data.device_path()).into());
        }
        confirm_erasure(ctx.prompter.as_mut(), &data)?;
        log::info!("data disk: {}", data.device_path());
        ctx.state.data_disk = Some(data);
    }

    Ok(())
}

/// The operator must type the disk name back. A wrong answer re-prompts; 'q'
/// aborts the run before anything was destroyed.
fn confirm_erasure(prompter: &mut dyn Prompter, disk: &DiskInfo) -> anyhow::Result<()> {
    loop {
        let answer = prompter.ask(&format!(
            "ALL data on {} will be erased; type '{}' to confirm, 'q' to abort",
            disk.device_path(),
            disk.name
        ))?;
        if answer == disk.name {
            log::info!("operator confirmed erasure of {}", disk.device_path());
            return Ok(());
        }
        if answer == "q" {
            log::warn!("operator declined erasure of {}", disk.device_path());
            return Err(PreconditionError::Declined(format!(
                "erasure of {}",
                disk.device_path()
            ))
            .into());
        }
    }
}

/// Wipe and repartition the chosen disks.
pub fn partition_disk(ctx: &mut InstallContext) -> anyhow::Result<()> {
    let disk = ctx.state.require_target_disk()?.clone();
    let dev = disk.device_path();

    let esp_spec = format!("1:0:+{}M", ESP_SIZE_MIB);
    ctx.runner.run("sgdisk", &["--zap-all", &dev])?;
    ctx.runner
        .run("sgdisk", &["-n", &esp_spec, "-t", "1:ef00", "-c", "1:EFI", &dev])?;
    ctx.runner
        .run("sgdisk", &["-n", "2:0:0", "-t", "2:8300", "-c", "2:root", &dev])?;
    ctx.runner.run("partprobe", &[&dev])?;

    ctx.state.efi_partition = Some(disk.partition_path(1));
    ctx.state.root_partition = Some(disk.partition_path(2));

    if let Some(data) = ctx.state.data_disk.clone() {
        let ddev = data.device_path();
        ctx.runner.run("sgdisk", &["--zap-all", &ddev])?;
        ctx.runner
            .run("sgdisk", &["-n", "1:0:0", "-t", "1:8300", "-c", "1:data", &ddev])?;
        ctx.runner.run("partprobe", &[&ddev])?;
        ctx.state.data_partition = Some(data.partition_path(1));
    }

    Ok(())
}

/// Format the partitions created by `partition_disk`. Filesystem types are
/// fixed per role: FAT32 for the ESP, compressed Btrfs for root, ext4 for
/// the data disk.
pub fn format_partitions(ctx: &mut InstallContext) -> anyhow::Result<()> {
    let efi = ctx
        .state
        .efi_partition
        .clone()
        .context("EFI partition not set; partition step did not run")?;
    let root = ctx.state.require_root_partition()?.to_string();

    ctx.runner.run("mkfs.fat", &["-F", "32", "-n", "EFI", &efi])?;
    ctx.runner.run("mkfs.btrfs", &["-f", "-L", "archroot", &root])?;

    if let Some(data) = ctx.state.data_partition.clone() {
        ctx.runner.run("mkfs.ext4", &["-F", "-L", "data", &data])?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::SystemReport;
    use crate::models::FirmwareMode;

    fn two_disk_report() -> SystemReport {
        SystemReport {
            firmware: FirmwareMode::Efi,
            disks: vec![
                DiskInfo {
                    name: "nvme0n1".to_string(),
                    size: "1.9T".to_string(),
                    model: "Samsung 970 EVO".to_string(),
                },
                DiskInfo {
                    name: "sdb".to_string(),
                    size: "4T".to_string(),
                    model: "WD Red".to_string(),
                },
            ],
            total_memory_mib: 8192,
        }
    }

    #[test]
    fn test_select_disk_with_typed_confirmation() {
        // choice 1, confirm by typing the name, no data disk.
        let mut ctx = InstallContext::scripted(two_disk_report(), ["1", "nvme0n1", "n"]);
        select_disk(&mut ctx).unwrap();
        assert_eq!(ctx.state.target_disk.as_ref().unwrap().name, "nvme0n1");
        assert!(ctx.state.data_disk.is_none());
    }

    #[test]
    fn test_select_disk_wrong_name_reprompts() {
        // A mistyped name is not a failure; the prompt loops.
        let mut ctx =
            InstallContext::scripted(two_disk_report(), ["1", "nvme", "nvme0n1", "n"]);
        select_disk(&mut ctx).unwrap();
        assert!(ctx.state.target_disk.is_some());
    }

    #[test]
    fn test_select_disk_decline_aborts() {
        let mut ctx = InstallContext::scripted(two_disk_report(), ["1", "q"]);
        let err = select_disk(&mut ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PreconditionError>(),
            Some(PreconditionError::Declined(_))
        ));
    }

    #[test]
    fn test_select_data_disk() {
        let mut ctx = InstallContext::scripted(
            two_disk_report(),
            ["1", "nvme0n1", "y", "1", "sdb"],
        );
        select_disk(&mut ctx).unwrap();
        assert_eq!(ctx.state.data_disk.as_ref().unwrap().name, "sdb");
    }

    #[test]
    fn test_partition_disk_derives_partition_paths() {
        let mut ctx = InstallContext::scripted(two_disk_report(), Vec::<String>::new());
        ctx.state.target_disk = Some(ctx.report.disks[0].clone());
        partition_disk(&mut ctx).unwrap();

        assert_eq!(ctx.state.efi_partition.as_deref(), Some("/dev/nvme0n1p1"));
        assert_eq!(ctx.state.root_partition.as_deref(), Some("/dev/nvme0n1p2"));
        assert!(ctx
            .runner
            .history()
            .iter()
            .any(|c| c == "sgdisk --zap-all /dev/nvme0n1"));
    }

    #[test]
    fn test_partition_disk_covers_data_disk() {
        let mut ctx = InstallContext::scripted(two_disk_report(), Vec::<String>::new());
        ctx.state.target_disk = Some(ctx.report.disks[0].clone());
        ctx.state.data_disk = Some(ctx.report.disks[1].clone());
        partition_disk(&mut ctx).unwrap();

        assert_eq!(ctx.state.data_partition.as_deref(), Some("/dev/sdb1"));
    }

    #[test]
    fn test_format_partitions_fixed_types() {
        let mut ctx = InstallContext::scripted(two_disk_report(), Vec::<String>::new());
        ctx.state.efi_partition = Some("/dev/sda1".to_string());
        ctx.state.root_partition = Some("/dev/sda2".to_string());
        format_partitions(&mut ctx).unwrap();

        assert_eq!(
            ctx.runner.history(),
            [
                "mkfs.fat -F 32 -n EFI /dev/sda1",
                "mkfs.btrfs -f -L archroot /dev/sda2",
            ]
        );
    }

    #[test]
    fn test_format_requires_partition_step() {
        let mut ctx = InstallContext::scripted(two_disk_report(), Vec::<String>::new());
        assert!(format_partitions(&mut ctx).is_err());
    }
}
