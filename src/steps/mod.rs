//! Installation step bodies, in execution order.
//!
//! A step is a named, callable unit; insertion order in `default_steps` is
//! execution order. Step bodies receive the whole `InstallContext` and
//! return `anyhow::Result`, so they can attach context freely; the runner
//! wraps failures into `StepError` with the step name.

pub mod base;
pub mod bootloader;
pub mod configure;
pub mod disk;
pub mod mount;
pub mod network;
pub mod preflight;
pub mod settings;

use crate::orchestrator::InstallContext;
use std::path::Path;

/// One named unit of the installation sequence.
pub struct Step {
    pub name: &'static str,
    /// Required steps abort the run on failure; optional ones put the
    /// decision to the operator.
    pub required: bool,
    action: Box<dyn Fn(&mut InstallContext) -> anyhow::Result<()>>,
}

impl Step {
    pub fn new<F>(name: &'static str, required: bool, action: F) -> Self
    where
        F: Fn(&mut InstallContext) -> anyhow::Result<()> + 'static,
    {
        Step {
            name,
            required,
            action: Box::new(action),
        }
    }

    pub fn run(&self, ctx: &mut InstallContext) -> anyhow::Result<()> {
        (self.action)(ctx)
    }
}

/// The fixed installation sequence.
///
/// Defined at startup, executed once, discarded after the run. Step names
/// are part of the interface: the exit-code mapping in `error.rs` keys off
/// the provisioning step names.
pub fn default_steps() -> Vec<Step> {
    vec![
        Step::new("preflight", true, preflight::run_preflight),
        Step::new("select-disk", true, disk::select_disk),
        Step::new("collect-settings", true, settings::collect_settings),
        Step::new("partition-disk", true, disk::partition_disk),
        Step::new("format-partitions", true, disk::format_partitions),
        Step::new("mount-filesystems", true, mount::mount_filesystems),
        Step::new("install-base", true, base::install_base),
        Step::new("generate-fstab", true, base::generate_fstab),
        Step::new("configure-system", true, configure::configure_system),
        Step::new("create-user", true, configure::create_user),
        Step::new("configure-network", true, network::configure_network),
        Step::new("enable-zram", false, configure::enable_zram),
        Step::new("install-bootloader", true, bootloader::install_bootloader),
    ]
}

/// Write a file under the target root, replacing any existing content.
///
/// No-op runners skip artifact writes entirely; the rendered content is
/// still exercised by the render functions' own tests.
pub(crate) fn write_target_file(
    ctx: &mut InstallContext,
    relative: &str,
    contents: &str,
) -> anyhow::Result<()> {
    let path = Path::new(crate::models::INSTALL_ROOT).join(relative);
    log::info!("writing {}", path.display());
    if ctx.runner.is_noop() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, contents)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {}", path.display(), e))
}

/// Append a line to a file under the target root.
pub(crate) fn append_target_file(
    ctx: &mut InstallContext,
    relative: &str,
    line: &str,
) -> anyhow::Result<()> {
    use std::io::Write;

    let path = Path::new(crate::models::INSTALL_ROOT).join(relative);
    log::info!("appending to {}", path.display());
    if ctx.runner.is_noop() {
        return Ok(());
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {}", path.display(), e))?;
    writeln!(file, "{}", line)
        .map_err(|e| anyhow::anyhow!("failed to append to {}: {}", path.display(), e))
}
