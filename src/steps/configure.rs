//! In-target configuration: identity files, locale, time, users, swap.
//!
//! All artifacts are plain text, line oriented, written under the install
//! root; commands that must observe the target's filesystem run through
//! arch-chroot.

use crate::orchestrator::InstallContext;
use crate::prompt::Prompter;
use crate::steps::{append_target_file, write_target_file};
use crate::system::validate_username;

/// Render /etc/hosts for the chosen hostname.
pub fn render_hosts(hostname: &str) -> String {
    format!(
        "127.0.0.1\tlocalhost\n::1\t\tlocalhost\n127.0.1.1\t{}\n",
        hostname
    )
}

/// Write identity and locale files, generate locales, set the timezone.
pub fn configure_system(ctx: &mut InstallContext) -> anyhow::Result<()> {
    let hostname = ctx.state.hostname.clone();
    let locale = ctx.state.locale.clone();
    let keymap = ctx.state.keymap.clone();
    let timezone = ctx.state.timezone.clone();

    write_target_file(ctx, "etc/hostname", &format!("{}\n", hostname))?;
    write_target_file(ctx, "etc/hosts", &render_hosts(&hostname))?;
    write_target_file(ctx, "etc/locale.conf", &format!("LANG={}\n", locale))?;
    write_target_file(ctx, "etc/vconsole.conf", &format!("KEYMAP={}\n", keymap))?;

    append_target_file(ctx, "etc/locale.gen", &format!("{} UTF-8", locale))?;
    ctx.runner.run_in_target("locale-gen", &[])?;

    let zone = format!("/usr/share/zoneinfo/{}", timezone);
    ctx.runner
        .run_in_target("ln", &["-sf", &zone, "/etc/localtime"])?;
    ctx.runner.run_in_target("hwclock", &["--systohc"])?;

    Ok(())
}

/// Create the primary user with wheel sudo and set both passwords.
///
/// Passwords are prompted here, used once and dropped; they never enter
/// `InstallState` or the session log.
pub fn create_user(ctx: &mut InstallContext) -> anyhow::Result<()> {
    let username = ctx.state.username.clone();
    validate_username(&username)?;

    ctx.runner
        .run_in_target("useradd", &["-m", "-G", "wheel", "-s", "/bin/bash", &username])?;
    write_target_file(ctx, "etc/sudoers.d/10-wheel", "%wheel ALL=(ALL:ALL) ALL\n")?;

    let root_password = ask_password(ctx.prompter.as_mut(), "root password")?;
    ctx.runner
        .run_in_target_with_stdin("chpasswd", &[], &format!("root:{}\n", root_password))?;

    let user_password =
        ask_password(ctx.prompter.as_mut(), &format!("password for {}", username))?;
    ctx.runner.run_in_target_with_stdin(
        "chpasswd",
        &[],
        &format!("{}:{}\n", username, user_password),
    )?;

    Ok(())
}

/// Prompt for a password twice until both entries match and are non-empty.
fn ask_password(prompter: &mut dyn Prompter, label: &str) -> anyhow::Result<String> {
    loop {
        let first = prompter.ask_secret(label)?;
        if first.is_empty() {
            log::warn!("empty password rejected");
            continue;
        }
        let second = prompter.ask_secret(&format!("{} (again)", label))?;
        if first == second {
            return Ok(first);
        }
        log::warn!("passwords do not match");
    }
}

/// Optional zram swap via systemd's zram-generator.
pub fn enable_zram(ctx: &mut InstallContext) -> anyhow::Result<()> {
    if !ctx.state.enable_swap {
        log::info!("zram swap not requested, skipping");
        return Ok(());
    }

    ctx.runner
        .run_in_target("pacman", &["-S", "--noconfirm", "--needed", "zram-generator"])?;
    write_target_file(
        ctx,
        "etc/systemd/zram-generator.conf",
        "[zram0]\nzram-size = min(ram / 2, 4096)\n",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::SystemReport;
    use crate::models::FirmwareMode;

    fn scripted(answers: &[&str]) -> InstallContext {
        let report = SystemReport {
            firmware: FirmwareMode::Efi,
            disks: Vec::new(),
            total_memory_mib: 4096,
        };
        InstallContext::scripted(report, answers.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_render_hosts_contains_hostname() {
        let hosts = render_hosts("archbox");
        assert!(hosts.contains("127.0.0.1\tlocalhost"));
        assert!(hosts.contains("127.0.1.1\tarchbox"));
    }

    #[test]
    fn test_configure_system_command_sequence() {
        let mut ctx = scripted(&[]);
        ctx.state.hostname = "archbox".to_string();
        ctx.state.locale = "en_US.UTF-8".to_string();
        ctx.state.keymap = "us".to_string();
        ctx.state.timezone = "Europe/Berlin".to_string();

        configure_system(&mut ctx).unwrap();

        assert_eq!(
            ctx.runner.history(),
            [
                "arch-chroot /mnt locale-gen",
                "arch-chroot /mnt ln -sf /usr/share/zoneinfo/Europe/Berlin /etc/localtime",
                "arch-chroot /mnt hwclock --systohc",
            ]
        );
    }

    #[test]
    fn test_create_user_sets_both_passwords() {
        let mut ctx = scripted(&["rootpw", "rootpw", "userpw", "userpw"]);
        ctx.state.username = "alice".to_string();
        create_user(&mut ctx).unwrap();

        let history = ctx.runner.history();
        assert!(history[0].contains("useradd -m -G wheel"));
        // chpasswd runs twice; the passwords themselves are fed via stdin
        // and never rendered into the history.
        let chpasswd_count = history.iter().filter(|c| c.contains("chpasswd")).count();
        assert_eq!(chpasswd_count, 2);
        assert!(!history.iter().any(|c| c.contains("rootpw")));
    }

    #[test]
    fn test_password_mismatch_reprompts() {
        let mut ctx = scripted(&["one", "two", "match", "match", "u", "u"]);
        ctx.state.username = "alice".to_string();
        create_user(&mut ctx).unwrap();
    }

    #[test]
    fn test_create_user_rejects_bad_username() {
        let mut ctx = scripted(&[]);
        ctx.state.username = "Bad Name".to_string();
        assert!(create_user(&mut ctx).is_err());
    }

    #[test]
    fn test_zram_skipped_when_not_requested() {
        let mut ctx = scripted(&[]);
        ctx.state.enable_swap = false;
        enable_zram(&mut ctx).unwrap();
        assert!(ctx.runner.history().is_empty());
    }

    #[test]
    fn test_zram_installs_generator() {
        let mut ctx = scripted(&[]);
        ctx.state.enable_swap = true;
        enable_zram(&mut ctx).unwrap();
        assert!(ctx.runner.history()[0].contains("zram-generator"));
    }
}
