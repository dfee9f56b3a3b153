//! Bootloader installation, three mutually exclusive mechanisms.
//!
//! All three variants embed the identical kernel command line; it is built
//! in exactly one place (`kernel_cmdline`) and only rendered differently.
//! The variants also write to disjoint paths on the target, so switching
//! mechanisms between runs cannot leave one interfering with another.

use crate::models::{Bootloader, ROOT_MOUNT_OPTIONS};
use crate::orchestrator::InstallContext;
use crate::steps::write_target_file;
use anyhow::Context;

/// The kernel command line shared by every boot mechanism.
///
/// Root partition identifier plus the mount options the root filesystem was
/// created with. Any change here propagates to all three variants.
pub fn kernel_cmdline(root_partition: &str) -> String {
    format!(
        "root={} rw rootflags={}",
        root_partition, ROOT_MOUNT_OPTIONS
    )
}

/// Primary artifact written by each variant, relative to the target root.
pub fn artifact_path(variant: Bootloader) -> &'static str {
    match variant {
        Bootloader::UnifiedImage => "boot/EFI/Linux/arch-linux.efi",
        Bootloader::BootEntry => "boot/loader/entries/ironstrap.conf",
        Bootloader::GeneratedConfig => "boot/grub/grub.cfg",
    }
}

/// systemd-boot loader entry.
pub fn render_loader_entry(cmdline: &str, microcode: Option<&str>) -> String {
    let mut out = String::from("title\tArch Linux\nlinux\t/vmlinuz-linux\n");
    if let Some(ucode) = microcode {
        out.push_str(&format!("initrd\t/{}.img\n", ucode));
    }
    out.push_str("initrd\t/initramfs-linux.img\n");
    out.push_str(&format!("options\t{}\n", cmdline));
    out
}

/// systemd-boot loader.conf pointing at our entry.
pub fn render_loader_conf() -> String {
    "default ironstrap.conf\ntimeout 3\nconsole-mode keep\n".to_string()
}

/// mkinitcpio preset producing a unified kernel image on the ESP.
pub fn render_uki_preset() -> String {
    "# mkinitcpio preset file for the 'linux' package\n\
     ALL_kver=\"/boot/vmlinuz-linux\"\n\
     PRESETS=('default')\n\
     default_uki=\"/boot/EFI/Linux/arch-linux.efi\"\n\
     default_options=\"\"\n"
        .to_string()
}

/// /etc/default/grub carrying the shared command line.
pub fn render_default_grub(cmdline: &str) -> String {
    format!(
        "GRUB_DEFAULT=0\nGRUB_TIMEOUT=3\nGRUB_DISTRIBUTOR=\"Arch\"\nGRUB_CMDLINE_LINUX=\"{}\"\n",
        cmdline
    )
}

/// Install exactly the mechanism the operator selected.
pub fn install_bootloader(ctx: &mut InstallContext) -> anyhow::Result<()> {
    let variant = ctx
        .state
        .bootloader
        .context("bootloader not chosen; settings step did not run")?;
    let root = ctx.state.require_root_partition()?.to_string();
    let cmdline = kernel_cmdline(&root);

    log::info!("installing bootloader: {}", variant);

    match variant {
        Bootloader::UnifiedImage => install_unified_image(ctx, &cmdline),
        Bootloader::BootEntry => install_boot_entry(ctx, &cmdline),
        Bootloader::GeneratedConfig => install_generated_config(ctx, &cmdline),
    }
}

fn install_unified_image(ctx: &mut InstallContext, cmdline: &str) -> anyhow::Result<()> {
    write_target_file(ctx, "etc/kernel/cmdline", &format!("{}\n", cmdline))?;
    write_target_file(ctx, "etc/mkinitcpio.d/linux.preset", &render_uki_preset())?;

    let uki_dir = format!("{}/boot/EFI/Linux", crate::models::INSTALL_ROOT);
    ctx.runner.run("mkdir", &["-p", &uki_dir])?;
    ctx.runner.run_in_target("mkinitcpio", &["-P"])?;

    let disk = ctx.state.require_target_disk()?.clone();
    ctx.runner.run(
        "efibootmgr",
        &[
            "--create",
            "--disk",
            &disk.device_path(),
            "--part",
            "1",
            "--label",
            "Arch Linux (ironstrap)",
            "--loader",
            "\\EFI\\Linux\\arch-linux.efi",
        ],
    )
}

fn install_boot_entry(ctx: &mut InstallContext, cmdline: &str) -> anyhow::Result<()> {
    ctx.runner.run_in_target("bootctl", &["install"])?;
    write_target_file(ctx, "boot/loader/loader.conf", &render_loader_conf())?;
    let microcode = ctx.state.microcode.clone();
    write_target_file(
        ctx,
        artifact_path(Bootloader::BootEntry),
        &render_loader_entry(cmdline, microcode.as_deref()),
    )
}

fn install_generated_config(ctx: &mut InstallContext, cmdline: &str) -> anyhow::Result<()> {
    write_target_file(ctx, "etc/default/grub", &render_default_grub(cmdline))?;
    ctx.runner.run_in_target(
        "grub-install",
        &[
            "--target=x86_64-efi",
            "--efi-directory=/boot",
            "--bootloader-id=GRUB",
        ],
    )?;
    ctx.runner
        .run_in_target("grub-mkconfig", &["-o", "/boot/grub/grub.cfg"])
}
