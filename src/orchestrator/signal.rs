//! SIGINT handling.
//!
//! The handler only raises a flag; the step runner checks it between steps
//! and routes the interruption through the same unwind path as a failing
//! step. A child process sharing the terminal receives the SIGINT itself,
//! exits non-zero and is handled as an ordinary step failure.

use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::os::raw::c_int;
use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigint(_: c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Install the SIGINT flag handler. Call once at startup.
pub fn install_handler() -> Result<(), String> {
    let action = SigAction::new(
        SigHandler::Handler(handle_sigint),
        SaFlags::empty(),
        SigSet::empty(),
    );
    // Safety: the handler only performs an atomic store.
    unsafe { signal::sigaction(Signal::SIGINT, &action) }
        .map(|_| ())
        .map_err(|e| format!("failed to install SIGINT handler: {}", e))
}

/// Whether SIGINT was received since startup.
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_starts_clear_and_handler_installs() {
        assert!(!interrupted());
        install_handler().expect("handler installation");
    }
}
