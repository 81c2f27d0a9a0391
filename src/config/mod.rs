//! Supervisor settings.
//!
//! There is no configuration file: every value is compiled in and assembled by
//! [`SupervisorConfig::standard`]. Tests build their own instances.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

pub mod paths;

/// Vendor folder under the user's documents directory.
pub const APP_VENDOR: &str = "UnforePrograms";

/// Name of the supervised application.
pub const APP_NAME: &str = "StudioPresence";

/// How long a graceful termination request is given before a forced kill.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// Everything the controller and shell need to know about the supervised program.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Name shown in the tray title ("<name> Running")
    pub display_name: String,

    /// Path to the supervised executable
    pub executable: PathBuf,

    /// Arguments passed to the executable
    pub args: Vec<OsString>,

    /// Directory receiving the per-run log files
    pub log_dir: PathBuf,

    /// Grace period between the termination request and the forced kill
    pub grace_period: Duration,
}

impl SupervisorConfig {
    /// The compiled-in configuration used by the tray application.
    pub fn standard() -> Self {
        Self {
            display_name: APP_NAME.to_string(),
            executable: paths::executable(),
            args: Vec::new(),
            log_dir: paths::log_dir(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}
