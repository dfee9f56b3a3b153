//! Interactive collection of installation settings.
//!
//! Everything the later steps need from the operator is asked here, in one
//! place, right after the disk is chosen and before anything destructive
//! happens. Invalid answers re-prompt; declining is not a failure.

use crate::models::{Bootloader, NetworkStack};
use crate::orchestrator::InstallContext;
use crate::system::{validate_hostname, validate_username};

pub fn collect_settings(ctx: &mut InstallContext) -> anyhow::Result<()> {
    ctx.state.hostname = loop {
        let answer = ctx.prompter.ask_default("hostname", "archbox")?;
        match validate_hostname(&answer) {
            Ok(()) => break answer,
            Err(e) => log::warn!("{:#}", e),
        }
    };

    ctx.state.username = loop {
        let answer = ctx.prompter.ask("username for the primary user")?;
        match validate_username(&answer) {
            Ok(()) => break answer,
            Err(e) => log::warn!("{:#}", e),
        }
    };

    ctx.state.timezone = ctx.prompter.ask_default("timezone", "UTC")?;
    ctx.state.keymap = ctx.prompter.ask_default("console keymap", "us")?;
    ctx.state.locale = ctx.prompter.ask_default("system locale", "en_US.UTF-8")?;

    let loaders: Vec<String> = Bootloader::all()
        .iter()
        .map(|b| b.as_str().to_string())
        .collect();
    let index = ctx.prompter.select("bootloader", &loaders)?;
    ctx.state.bootloader = Some(Bootloader::all()[index]);

    let stacks = [NetworkStack::NetworkManager, NetworkStack::SystemdNetworkd];
    let labels: Vec<String> = stacks.iter().map(|s| s.as_str().to_string()).collect();
    let index = ctx.prompter.select("network stack", &labels)?;
    ctx.state.network_stack = Some(stacks[index]);

    ctx.state.enable_swap = ctx.prompter.confirm("enable zram swap?", true)?;

    log::info!(
        "settings: hostname={} user={} tz={} keymap={} locale={} bootloader={} network={} zram={}",
        ctx.state.hostname,
        ctx.state.username,
        ctx.state.timezone,
        ctx.state.keymap,
        ctx.state.locale,
        ctx.state.bootloader.unwrap_or(Bootloader::BootEntry),
        ctx.state.network_stack.map(|s| s.as_str()).unwrap_or("?"),
        ctx.state.enable_swap,
    );

    Ok(())
}
