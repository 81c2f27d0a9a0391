//! Error types for the presence tray supervisor.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to launch the supervised executable.
///
/// Both variants are terminal for the start attempt that produced them;
/// nothing is retried automatically.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Executable not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to spawn {}: {source}", .command.display())]
    SpawnFailed {
        command: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LaunchError {
    pub(crate) fn spawn_failed(command: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LaunchError::SpawnFailed {
            command: command.into(),
            source,
        }
    }
}

/// Result type alias for launch operations.
pub type LaunchResult<T> = Result<T, LaunchError>;
