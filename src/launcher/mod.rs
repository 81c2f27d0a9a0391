//! Process launcher.
//!
//! Spawns the supervised executable from its own directory with stdout and
//! stderr captured in a fresh timestamped log file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use chrono::Local;
use tracing::{debug, error, info};

use crate::error::{LaunchError, LaunchResult};

pub mod log_file;
pub mod termination;

/// A child that was spawned successfully, with the log capturing its output.
#[derive(Debug)]
pub struct LaunchedProcess {
    pub child: Child,
    pub log_path: PathBuf,
}

impl LaunchedProcess {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

/// Launch `command` with `args`, sending its combined output to a new file in `log_dir`.
pub fn launch(command: &Path, args: &[OsString], log_dir: &Path) -> LaunchResult<LaunchedProcess> {
    if !command.is_file() {
        error!(command = %command.display(), "Executable not found");
        return Err(LaunchError::NotFound(command.to_path_buf()));
    }

    // Relative program paths would otherwise resolve against the new working directory
    let program = std::path::absolute(command).map_err(|e| LaunchError::spawn_failed(command, e))?;
    let working_dir = program
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let (stdout, log_path) = log_file::create(log_dir, Local::now().naive_local())
        .map_err(|e| LaunchError::spawn_failed(command, e))?;
    let stderr = stdout
        .try_clone()
        .map_err(|e| LaunchError::spawn_failed(command, e))?;

    info!(
        command = %program.display(),
        log = %log_path.display(),
        "Starting process"
    );

    let mut cmd = Command::new(&program);
    cmd.args(args)
        .current_dir(&working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr));

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        // CREATE_NO_WINDOW = 0x08000000
        cmd.creation_flags(0x08000000);
    }

    debug!(command = ?cmd, "Spawning");

    let child = cmd.spawn().map_err(|e| {
        error!(command = %program.display(), error = %e, "Spawn failed");
        LaunchError::spawn_failed(command, e)
    })?;

    info!(pid = child.id(), "Process started");

    Ok(LaunchedProcess { child, log_path })
}
