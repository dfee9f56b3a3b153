//! Network stack enablement in the target.
//!
//! The stack's package was already pulled in by pacstrap; this step only
//! enables the services so the installed system comes up connected.

use crate::orchestrator::InstallContext;
use anyhow::Context;

pub fn configure_network(ctx: &mut InstallContext) -> anyhow::Result<()> {
    let stack = ctx
        .state
        .network_stack
        .context("network stack not chosen; settings step did not run")?;

    for service in stack.services() {
        ctx.runner.run_in_target("systemctl", &["enable", service])?;
    }

    log::info!("enabled {} services", stack.as_str());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::SystemReport;
    use crate::models::{FirmwareMode, NetworkStack};

    fn ctx() -> InstallContext {
        let report = SystemReport {
            firmware: FirmwareMode::Efi,
            disks: Vec::new(),
            total_memory_mib: 4096,
        };
        InstallContext::scripted(report, Vec::<String>::new())
    }

    #[test]
    fn test_networkmanager_service_enabled() {
        let mut ctx = ctx();
        ctx.state.network_stack = Some(NetworkStack::NetworkManager);
        configure_network(&mut ctx).unwrap();
        assert_eq!(
            ctx.runner.history(),
            ["arch-chroot /mnt systemctl enable NetworkManager.service"]
        );
    }

    #[test]
    fn test_networkd_enables_resolved_too() {
        let mut ctx = ctx();
        ctx.state.network_stack = Some(NetworkStack::SystemdNetworkd);
        configure_network(&mut ctx).unwrap();
        assert_eq!(ctx.runner.history().len(), 2);
    }

    #[test]
    fn test_missing_choice_is_error() {
        let mut ctx = ctx();
        assert!(configure_network(&mut ctx).is_err());
    }
}
