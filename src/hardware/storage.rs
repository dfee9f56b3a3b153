//! Storage enumeration for disk selection.
//!
//! Installation targets are discovered through `lsblk -J`; USB sticks (the
//! live medium itself), loop devices and RAM disks are filtered out so the
//! selection menu only offers internal disks.

use crate::models::DiskInfo;
use std::os::unix::fs::FileTypeExt;
use std::process::Command;

/// Detect internal disks eligible as installation targets.
///
/// Returns an empty list when lsblk is unavailable or its output cannot be
/// parsed; the disk step treats that as a fatal condition at prompt time.
pub fn detect_disks() -> Vec<DiskInfo> {
    let output = match Command::new("lsblk")
        .args(["-J", "-o", "NAME,MODEL,TRAN,SIZE,TYPE"])
        .output()
    {
        Ok(output) if output.status.success() => output,
        _ => return Vec::new(),
    };

    let json: serde_json::Value = match serde_json::from_slice(&output.stdout) {
        Ok(json) => json,
        Err(_) => return Vec::new(),
    };

    let mut disks = Vec::new();

    if let Some(blockdevices) = json["blockdevices"].as_array() {
        for device in blockdevices {
            if device["type"].as_str().unwrap_or("") != "disk" {
                continue;
            }

            // The live medium is almost always USB; never offer it.
            if device["tran"].as_str().unwrap_or("") == "usb" {
                continue;
            }

            let name = device["name"].as_str().unwrap_or("").to_string();
            if name.is_empty() || name.starts_with("loop") || name.starts_with("ram") {
                continue;
            }

            disks.push(DiskInfo {
                name,
                size: device["size"].as_str().unwrap_or("unknown").to_string(),
                model: device["model"].as_str().unwrap_or("").trim().to_string(),
            });
        }
    }

    disks
}

/// Check that `path` names a block device.
///
/// This is the gate in front of every destructive disk operation.
pub fn is_block_device(path: &str) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.file_type().is_block_device(),
        Err(_) => false,
    }
}
