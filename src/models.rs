//! Core data types for ironstrap.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Root of the target filesystem tree during installation.
pub const INSTALL_ROOT: &str = "/mnt";

/// Size of the EFI system partition.
pub const ESP_SIZE_MIB: u64 = 512;

/// Mount options for the Btrfs root filesystem.
///
/// Single source for both the mount step and the kernel command line
/// (`rootflags=`), so the two can never diverge.
pub const ROOT_MOUNT_OPTIONS: &str = "compress=zstd:3,noatime";

/// Packages installed by pacstrap on every target.
pub const BASE_PACKAGES: [&str; 5] = [
    "base",
    "linux",
    "linux-firmware",
    "btrfs-progs",
    "sudo",
];

/// Boot firmware mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FirmwareMode {
    Efi,
    Bios,
}

/// Boot mechanism chosen by the operator.
///
/// Exactly one of the three is installed; all three embed the identical
/// kernel command line built by `steps::bootloader::kernel_cmdline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bootloader {
    /// Single UKI image under ESP/EFI/Linux/, booted directly by firmware.
    UnifiedImage,
    /// systemd-boot with a loader entry under loader/entries/.
    BootEntry,
    /// GRUB with a generated grub.cfg.
    GeneratedConfig,
}

impl Bootloader {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bootloader::UnifiedImage => "unified-image",
            Bootloader::BootEntry => "systemd-boot",
            Bootloader::GeneratedConfig => "grub",
        }
    }

    /// All variants in prompt order.
    pub fn all() -> [Bootloader; 3] {
        [
            Bootloader::UnifiedImage,
            Bootloader::BootEntry,
            Bootloader::GeneratedConfig,
        ]
    }
}

impl fmt::Display for Bootloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bootloader {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unified-image" | "uki" => Ok(Bootloader::UnifiedImage),
            "systemd-boot" => Ok(Bootloader::BootEntry),
            "grub" => Ok(Bootloader::GeneratedConfig),
            _ => Err(format!("unknown bootloader: {}", s)),
        }
    }
}

/// Network stack installed and enabled on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkStack {
    NetworkManager,
    SystemdNetworkd,
}

impl NetworkStack {
    /// Package pulled into the target, if any. systemd-networkd ships with
    /// the base system.
    pub fn package(&self) -> Option<&'static str> {
        match self {
            NetworkStack::NetworkManager => Some("networkmanager"),
            NetworkStack::SystemdNetworkd => None,
        }
    }

    /// Services enabled in the target.
    pub fn services(&self) -> &'static [&'static str] {
        match self {
            NetworkStack::NetworkManager => &["NetworkManager.service"],
            NetworkStack::SystemdNetworkd => {
                &["systemd-networkd.service", "systemd-resolved.service"]
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkStack::NetworkManager => "NetworkManager",
            NetworkStack::SystemdNetworkd => "systemd-networkd",
        }
    }
}

/// One block device as reported by lsblk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskInfo {
    pub name: String,  // Device name without /dev/ prefix
    pub size: String,  // Human-readable size
    pub model: String, // Model string, may be empty
}

impl DiskInfo {
    pub fn device_path(&self) -> String {
        format!("/dev/{}", self.name)
    }

    /// Path of partition `index` on this disk, honoring the `p` infix of
    /// digit-terminated device names.
    pub fn partition_path(&self, index: u8) -> String {
        partition_device(&self.device_path(), index)
    }

    /// One-line label for selection menus.
    pub fn label(&self) -> String {
        if self.model.is_empty() {
            format!("{} ({})", self.name, self.size)
        } else {
            format!("{} ({}) {}", self.name, self.size, self.model)
        }
    }
}

/// Derive the path of partition `index` on `device`.
///
/// Devices whose name ends in a digit (nvme0n1, mmcblk0) take a `p` infix;
/// everything else gets the bare index appended. Pure and deterministic.
pub fn partition_device(device: &str, index: u8) -> String {
    let ends_in_digit = device
        .chars()
        .last()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false);
    if ends_in_digit {
        format!("{}p{}", device, index)
    } else {
        format!("{}{}", device, index)
    }
}

/// Mutable record threaded through the step sequence.
///
/// Created empty, populated incrementally as steps execute, read by later
/// steps. Never persisted beyond the process lifetime except as the
/// diagnostic snapshot written next to the session log (passwords are never
/// stored here).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallState {
    pub target_disk: Option<DiskInfo>,
    pub data_disk: Option<DiskInfo>,
    pub efi_partition: Option<String>,
    pub root_partition: Option<String>,
    pub data_partition: Option<String>,
    pub microcode: Option<String>,
    pub bootloader: Option<Bootloader>,
    pub network_stack: Option<NetworkStack>,
    pub hostname: String,
    pub username: String,
    pub timezone: String,
    pub keymap: String,
    pub locale: String,
    pub enable_swap: bool,
}

impl InstallState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root partition path, or an error naming the step ordering bug.
    pub fn require_root_partition(&self) -> anyhow::Result<&str> {
        self.root_partition
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("root partition not set; disk step did not run"))
    }

    /// Target disk, or an error naming the step ordering bug.
    pub fn require_target_disk(&self) -> anyhow::Result<&DiskInfo> {
        self.target_disk
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("target disk not set; disk step did not run"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_device_sata_style() {
        assert_eq!(partition_device("/dev/sda", 1), "/dev/sda1");
        assert_eq!(partition_device("/dev/sda", 2), "/dev/sda2");
        assert_eq!(partition_device("/dev/vdb", 1), "/dev/vdb1");
    }

    #[test]
    fn test_partition_device_nvme_style() {
        assert_eq!(partition_device("/dev/nvme0n1", 1), "/dev/nvme0n1p1");
        assert_eq!(partition_device("/dev/nvme0n1", 2), "/dev/nvme0n1p2");
        assert_eq!(partition_device("/dev/mmcblk0", 1), "/dev/mmcblk0p1");
    }

    #[test]
    fn test_disk_info_partition_path() {
        let disk = DiskInfo {
            name: "nvme0n1".to_string(),
            size: "1.9T".to_string(),
            model: "Samsung 970 EVO".to_string(),
        };
        assert_eq!(disk.partition_path(1), "/dev/nvme0n1p1");
        assert_eq!(disk.device_path(), "/dev/nvme0n1");
    }

    #[test]
    fn test_disk_label_with_and_without_model() {
        let with_model = DiskInfo {
            name: "sda".to_string(),
            size: "500G".to_string(),
            model: "WD Blue".to_string(),
        };
        assert_eq!(with_model.label(), "sda (500G) WD Blue");

        let without_model = DiskInfo {
            name: "sda".to_string(),
            size: "500G".to_string(),
            model: String::new(),
        };
        assert_eq!(without_model.label(), "sda (500G)");
    }

    #[test]
    fn test_bootloader_round_trip() {
        for variant in Bootloader::all() {
            assert_eq!(variant.as_str().parse::<Bootloader>().unwrap(), variant);
        }
    }

    #[test]
    fn test_network_stack_services_not_empty() {
        assert!(!NetworkStack::NetworkManager.services().is_empty());
        assert!(!NetworkStack::SystemdNetworkd.services().is_empty());
    }

    #[test]
    fn test_install_state_require_accessors() {
        let mut state = InstallState::new();
        assert!(state.require_root_partition().is_err());
        state.root_partition = Some("/dev/sda2".to_string());
        assert_eq!(state.require_root_partition().unwrap(), "/dev/sda2");
    }

    #[test]
    fn test_install_state_snapshot_serializes() {
        let state = InstallState {
            root_partition: Some("/dev/sda2".to_string()),
            bootloader: Some(Bootloader::BootEntry),
            hostname: "arch".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("/dev/sda2"));
        assert!(json.contains("BootEntry"));
    }
}
