//! The foreground-only mode flag.
//!
//! This is the only state in the shell that is mutated outside the main
//! loop. The SIGTSTP handler performs a single lock-free flip plus a store;
//! everything user-visible (the mode-change notification) happens from the
//! main loop's poll.

use std::sync::atomic::{AtomicBool, Ordering};

use super::SignalNumber;

static FOREGROUND_ONLY: AtomicBool = AtomicBool::new(false);
static MODE_CHANGED: AtomicBool = AtomicBool::new(false);

pub(super) extern "C" fn toggle_foreground_only(_signal: SignalNumber) {
    FOREGROUND_ONLY.fetch_xor(true, Ordering::Relaxed);
    MODE_CHANGED.store(true, Ordering::Relaxed);
}

/// Whether commands requested to run in the background are currently forced
/// into the foreground.
pub(crate) fn foreground_only() -> bool {
    FOREGROUND_ONLY.load(Ordering::Relaxed)
}

/// Edge-triggered poll of the mode flag.
///
/// Returns the current mode if it was toggled since the previous call and
/// clears the pending-change mark, so a toggle is observed at most once.
pub(crate) fn take_mode_change() -> Option<bool> {
    if MODE_CHANGED.swap(false, Ordering::Relaxed) {
        Some(FOREGROUND_ONLY.load(Ordering::Relaxed))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::super::{consts::SIGTSTP, SignalHandler, SignalHandlerBehavior};
    use super::*;

    // A single test so the concurrently-run test threads never race on the
    // process-wide flags.
    #[test]
    fn toggle_is_edge_triggered() {
        let initial = foreground_only();

        toggle_foreground_only(SIGTSTP);
        assert_eq!(foreground_only(), !initial);
        assert_eq!(take_mode_change(), Some(!initial));
        // no second report for the same toggle
        assert_eq!(take_mode_change(), None);

        toggle_foreground_only(SIGTSTP);
        assert_eq!(take_mode_change(), Some(initial));
        assert_eq!(foreground_only(), initial);

        // the same via actual signal delivery
        let handler =
            SignalHandler::register(SIGTSTP, SignalHandlerBehavior::ToggleForegroundOnly)
                .expect("cannot override SIGTSTP");

        // SAFETY: the registered action is our own flag-flipping handler.
        unsafe { libc::raise(SIGTSTP) };
        assert_eq!(foreground_only(), !initial);

        // SAFETY: as above.
        unsafe { libc::raise(SIGTSTP) };
        assert_eq!(foreground_only(), initial);

        // both deliveries collapse into a single pending change
        assert_eq!(take_mode_change(), Some(initial));
        assert_eq!(take_mode_change(), None);

        drop(handler);
    }
}
