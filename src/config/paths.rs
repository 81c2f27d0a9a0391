//! Path utilities for the presence tray supervisor.
//!
//! Defines the standard locations for the supervised executable and the logs.

use std::path::PathBuf;

use super::{APP_NAME, APP_VENDOR};

/// Directory holding the supervised executable, relative to the working directory.
const EXECUTABLE_DIR: &str = "EXE";

/// Base data directory for the application.
///
/// `~/Documents/UnforePrograms/StudioPresence` on every platform.
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join(APP_VENDOR)
        .join(APP_NAME)
}

/// Directory receiving one log file per launch of the supervised executable.
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Directory for the supervisor's own diagnostic log.
pub fn supervisor_log_dir() -> std::io::Result<PathBuf> {
    let path = data_dir().join("supervisor");
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

/// Supervised executable.
///
/// On Windows: `.\EXE\StudioPresence.exe`
pub fn executable() -> PathBuf {
    PathBuf::from(".")
        .join(EXECUTABLE_DIR)
        .join(format!("{}{}", APP_NAME, std::env::consts::EXE_SUFFIX))
}
