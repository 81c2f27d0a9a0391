//! Presence tray supervisor
//!
//! Launches the StudioPresence executable, shows whether it is running in the
//! system tray, and stops it cleanly on exit.

use anyhow::Result;
use tracing::info;

mod config;
mod controller;
mod error;
mod launcher;
mod status;
mod tray;

use config::SupervisorConfig;

fn main() {
    // Wrap everything to catch early errors
    if let Err(e) = real_main() {
        show_startup_error(&format!("{:?}", e));
        std::process::exit(1);
    }
}

#[cfg(windows)]
fn show_startup_error(message: &str) {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;

    let title = "StudioPresence Tray - Startup Error";
    let full_message = format!("Failed to start the StudioPresence tray:\n\n{}", message);

    let title_wide: Vec<u16> = OsStr::new(title).encode_wide().chain(Some(0)).collect();
    let message_wide: Vec<u16> = OsStr::new(&full_message)
        .encode_wide()
        .chain(Some(0))
        .collect();

    // MB_ICONERROR = 0x10, MB_SETFOREGROUND = 0x10000, MB_TOPMOST = 0x40000
    let flags: u32 = 0x10 | 0x10000 | 0x40000;

    unsafe {
        windows_sys::Win32::UI::WindowsAndMessaging::MessageBoxW(
            0,
            message_wide.as_ptr(),
            title_wide.as_ptr(),
            flags,
        );
    }
}

#[cfg(not(windows))]
fn show_startup_error(message: &str) {
    eprintln!("StudioPresence tray startup error: {}", message);
}

#[tokio::main]
async fn real_main() -> Result<()> {
    let _guard = init_logging()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Presence tray starting"
    );

    let config = SupervisorConfig::standard();
    info!(
        executable = %config.executable.display(),
        log_dir = %config.log_dir.display(),
        "Supervising executable"
    );

    tray::run_tray(config).await
}

/// Stderr output for the console-driven headless shell and Ctrl-C users, plus a
/// JSON file log in the supervisor directory for tray sessions with no console.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = config::paths::supervisor_log_dir()?;

    let file_appender = tracing_appender::rolling::Builder::new()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix("supervisor")
        .filename_suffix("log")
        .max_log_files(10)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .json()
                .with_writer(non_blocking),
        )
        .init();

    Ok(guard)
}
