//! Tray shell.
//!
//! On Windows a system tray icon with a context menu drives the controller.
//! Elsewhere a headless shell runs the same lifecycle until interrupted.

use tracing::info;

use crate::controller::{Controller, StopOutcome};

#[cfg(windows)]
mod windows;

#[cfg(windows)]
pub use windows::run_tray;

#[cfg(not(windows))]
mod headless;

#[cfg(not(windows))]
pub use headless::run_tray;

/// Cleanup shared by every exit path: menu exit and interrupt signal alike.
pub(crate) fn shutdown(controller: &Controller) -> StopOutcome {
    info!(
        pid = ?controller.pid(),
        log = ?controller.log_path(),
        "Exiting application"
    );
    let outcome = controller.stop();
    info!(outcome = ?outcome, "All services stopped");
    outcome
}
