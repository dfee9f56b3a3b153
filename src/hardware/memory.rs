//! Memory probe for the preflight minimum check.

use sysinfo::System;

/// Minimum memory for a pacstrap run to complete, in MiB.
pub const MIN_MEMORY_MIB: u64 = 512;

/// Total system memory in MiB, 0 if detection fails.
pub fn total_memory_mib() -> u64 {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.total_memory() / (1024 * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_memory_realistic() {
        let mib = total_memory_mib();
        // Allow 0 as the detection fallback, otherwise expect something
        // between 128 MiB and 4 TiB.
        assert!(mib == 0 || (128..=4 * 1024 * 1024).contains(&mib));
    }
}
