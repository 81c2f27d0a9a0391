//! Process controller.
//!
//! Owns the handle of the single supervised process and keeps the status sink
//! in step with every liveness check it performs.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::SupervisorConfig;
use crate::error::LaunchResult;
use crate::launcher::{self, termination, LaunchedProcess};
use crate::status::{StatusSink, TrayStatus};

/// Result of a successful [`Controller::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { pid: u32, log_path: PathBuf },
    AlreadyRunning { pid: u32 },
}

/// Result of [`Controller::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Nothing was alive.
    NotRunning,
    /// Exited within the grace period after the termination request.
    Terminated,
    /// Still alive after the grace period and killed.
    Killed,
}

/// Supervises zero or one instance of the configured executable.
pub struct Controller {
    executable: PathBuf,
    args: Vec<OsString>,
    log_dir: PathBuf,
    grace_period: Duration,
    process: Mutex<Option<LaunchedProcess>>,
    status: Arc<dyn StatusSink>,
}

impl Controller {
    pub fn new(config: &SupervisorConfig, status: Arc<dyn StatusSink>) -> Self {
        Self {
            executable: config.executable.clone(),
            args: config.args.clone(),
            log_dir: config.log_dir.clone(),
            grace_period: config.grace_period,
            process: Mutex::new(None),
            status,
        }
    }

    /// Launch the executable unless an instance is already alive.
    pub fn start(&self) -> LaunchResult<StartOutcome> {
        let mut process = self.process.lock();

        if let Some(pid) = live_pid(&mut process) {
            info!(pid, "Process already running");
            self.status.set_status(TrayStatus::Running);
            return Ok(StartOutcome::AlreadyRunning { pid });
        }

        info!(command = %self.executable.display(), "Attempting to start process");
        match launcher::launch(&self.executable, &self.args, &self.log_dir) {
            Ok(launched) => {
                let outcome = StartOutcome::Started {
                    pid: launched.pid(),
                    log_path: launched.log_path.clone(),
                };
                *process = Some(launched);
                self.status.set_status(TrayStatus::Running);
                Ok(outcome)
            }
            Err(e) => {
                self.status.set_status(TrayStatus::Stopped);
                Err(e)
            }
        }
    }

    /// Stop the process: one graceful request, then one forced kill after the
    /// grace period. A no-op when nothing is alive.
    pub fn stop(&self) -> StopOutcome {
        let mut process = self.process.lock();

        let Some(mut running) = process.take() else {
            self.status.set_status(TrayStatus::Stopped);
            return StopOutcome::NotRunning;
        };

        let pid = running.pid();
        if !is_alive(&mut running) {
            info!(pid, "Process had already exited");
            self.status.set_status(TrayStatus::Stopped);
            return StopOutcome::NotRunning;
        }

        info!(pid, "Stopping process");
        if let Err(e) = termination::request_graceful(&mut running.child) {
            warn!(pid, error = %e, "Termination request failed");
        }

        let exited = match termination::wait_for_exit(&mut running.child, self.grace_period) {
            Ok(status) => status,
            Err(e) => {
                warn!(pid, error = %e, "Failed to poll process");
                None
            }
        };

        let outcome = match exited {
            Some(status) => {
                info!(pid, status = %status, "Process terminated");
                StopOutcome::Terminated
            }
            None => {
                warn!(
                    pid,
                    grace = ?self.grace_period,
                    "Process ignored termination, killing"
                );
                match termination::force_kill(&mut running.child) {
                    Ok(status) => info!(pid, status = %status, "Process killed"),
                    Err(e) => warn!(pid, error = %e, "Kill failed"),
                }
                StopOutcome::Killed
            }
        };

        self.status.set_status(TrayStatus::Stopped);
        outcome
    }

    /// Stop any running instance and start a fresh one.
    pub fn restart(&self) -> LaunchResult<StartOutcome> {
        self.stop();
        self.start()
    }

    /// Non-blocking liveness poll.
    ///
    /// A process found to have exited is forgotten and the status set to stopped.
    pub fn is_running(&self) -> bool {
        let mut process = self.process.lock();
        let had_process = process.is_some();

        let running = live_pid(&mut process).is_some();
        if had_process {
            self.status.set_status(TrayStatus::from_running(running));
        }
        running
    }

    /// Pid of the stored process, if one is held.
    pub fn pid(&self) -> Option<u32> {
        self.process.lock().as_ref().map(LaunchedProcess::pid)
    }

    /// Log file of the stored process, if one is held.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.process.lock().as_ref().map(|p| p.log_path.clone())
    }
}

/// Poll the stored process; clears the slot when it has exited.
fn live_pid(slot: &mut Option<LaunchedProcess>) -> Option<u32> {
    let process = slot.as_mut()?;
    if is_alive(process) {
        Some(process.pid())
    } else {
        info!(pid = process.pid(), "Process has exited");
        *slot = None;
        None
    }
}

fn is_alive(process: &mut LaunchedProcess) -> bool {
    match process.child.try_wait() {
        Ok(None) => true,
        Ok(Some(_)) => false,
        Err(e) => {
            warn!(pid = process.pid(), error = %e, "Failed to poll process");
            false
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::LaunchError;
    use crate::status::testing::RecordingSink;
    use std::path::Path;
    use std::time::Instant;

    struct Fixture {
        _tmp: tempfile::TempDir,
        log_dir: PathBuf,
        sink: Arc<RecordingSink>,
        controller: Controller,
    }

    impl Fixture {
        fn log_count(&self) -> usize {
            std::fs::read_dir(&self.log_dir)
                .map(|entries| entries.count())
                .unwrap_or(0)
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            self.controller.stop();
        }
    }

    fn fixture_for(executable: &Path, script: &str, grace: Duration) -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let log_dir = tmp.path().join("logs");
        let config = SupervisorConfig {
            display_name: "Test".to_string(),
            executable: executable.to_path_buf(),
            args: vec!["-c".into(), script.into()],
            log_dir: log_dir.clone(),
            grace_period: grace,
        };
        let sink = Arc::new(RecordingSink::default());
        let controller = Controller::new(&config, sink.clone());
        Fixture { _tmp: tmp, log_dir, sink, controller }
    }

    fn shell(script: &str) -> Fixture {
        fixture_for(Path::new("/bin/sh"), script, Duration::from_millis(300))
    }

    fn wait_for_log(path: &Path, needle: &str) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if std::fs::read_to_string(path).is_ok_and(|s| s.contains(needle)) {
                return;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        panic!("{} never appeared in {}", needle, path.display());
    }

    #[test]
    fn test_start_reports_running() {
        let f = shell("echo started; exec sleep 30");

        let outcome = f.controller.start().unwrap();
        let StartOutcome::Started { pid, log_path } = outcome else {
            panic!("expected a fresh start");
        };

        assert_eq!(f.controller.pid(), Some(pid));
        assert_eq!(f.controller.log_path(), Some(log_path.clone()));
        assert!(f.controller.is_running());
        assert_eq!(f.sink.last(), Some(TrayStatus::Running));
        assert_eq!(f.log_count(), 1);
        wait_for_log(&log_path, "started");
    }

    #[test]
    fn test_second_start_does_not_spawn() {
        let f = shell("exec sleep 30");

        let StartOutcome::Started { pid, .. } = f.controller.start().unwrap() else {
            panic!("expected a fresh start");
        };
        let second = f.controller.start().unwrap();

        assert_eq!(second, StartOutcome::AlreadyRunning { pid });
        assert_eq!(f.controller.pid(), Some(pid));
        assert_eq!(f.log_count(), 1);
        assert_eq!(f.sink.last(), Some(TrayStatus::Running));
    }

    #[test]
    fn test_stop_without_process_is_noop() {
        let f = shell("exec sleep 30");

        assert_eq!(f.controller.stop(), StopOutcome::NotRunning);
        assert_eq!(f.controller.stop(), StopOutcome::NotRunning);
        assert_eq!(f.sink.history(), vec![TrayStatus::Stopped, TrayStatus::Stopped]);
        assert!(!f.controller.is_running());
    }

    #[test]
    fn test_missing_executable() {
        let tmp = tempfile::tempdir().unwrap();
        let f = fixture_for(&tmp.path().join("nope"), "true", Duration::from_millis(300));

        let err = f.controller.start().unwrap_err();
        assert!(matches!(err, LaunchError::NotFound(_)));
        assert_eq!(f.sink.last(), Some(TrayStatus::Stopped));
        assert_eq!(f.controller.pid(), None);
        assert!(!f.log_dir.exists());
    }

    #[test]
    fn test_stop_cooperative_process() {
        let f = shell("exec sleep 30");
        f.controller.start().unwrap();

        let start = Instant::now();
        assert_eq!(f.controller.stop(), StopOutcome::Terminated);
        assert!(start.elapsed() < Duration::from_secs(5));

        assert_eq!(f.controller.pid(), None);
        assert!(!f.controller.is_running());
        assert_eq!(f.sink.last(), Some(TrayStatus::Stopped));
    }

    #[test]
    fn test_stop_kills_unresponsive_process() {
        let f = shell("trap '' TERM; echo ready; while :; do :; done");
        let StartOutcome::Started { log_path, .. } = f.controller.start().unwrap() else {
            panic!("expected a fresh start");
        };
        wait_for_log(&log_path, "ready");

        let start = Instant::now();
        assert_eq!(f.controller.stop(), StopOutcome::Killed);
        assert!(start.elapsed() >= Duration::from_millis(300));

        assert_eq!(f.controller.pid(), None);
        assert_eq!(f.sink.last(), Some(TrayStatus::Stopped));
    }

    #[test]
    fn test_exited_process_is_noticed_on_poll() {
        let f = shell("echo bye");
        let StartOutcome::Started { pid: first, .. } = f.controller.start().unwrap() else {
            panic!("expected a fresh start");
        };

        let deadline = Instant::now() + Duration::from_secs(5);
        while f.controller.is_running() {
            assert!(Instant::now() < deadline, "child never exited");
            std::thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(f.controller.pid(), None);
        assert_eq!(f.sink.last(), Some(TrayStatus::Stopped));

        let StartOutcome::Started { pid: second, .. } = f.controller.start().unwrap() else {
            panic!("expected a fresh start");
        };
        assert_ne!(first, second);
        assert_eq!(f.log_count(), 2);
    }

    #[test]
    fn test_live_process_wins_over_missing_executable() {
        let tmp = tempfile::tempdir().unwrap();
        let link = tmp.path().join("sh");
        std::os::unix::fs::symlink("/bin/sh", &link).unwrap();

        let f = fixture_for(&link, "exec sleep 30", Duration::from_millis(300));
        let StartOutcome::Started { pid, .. } = f.controller.start().unwrap() else {
            panic!("expected a fresh start");
        };

        std::fs::remove_file(&link).unwrap();
        assert_eq!(f.controller.start().unwrap(), StartOutcome::AlreadyRunning { pid });
        assert_eq!(f.sink.last(), Some(TrayStatus::Running));

        f.controller.stop();
        let err = f.controller.start().unwrap_err();
        assert!(matches!(err, LaunchError::NotFound(_)));
        assert_eq!(f.sink.last(), Some(TrayStatus::Stopped));
    }

    #[test]
    fn test_restart_replaces_process() {
        let f = shell("exec sleep 30");
        let StartOutcome::Started { pid: first, .. } = f.controller.start().unwrap() else {
            panic!("expected a fresh start");
        };

        let StartOutcome::Started { pid: second, .. } = f.controller.restart().unwrap() else {
            panic!("expected a fresh start after restart");
        };

        assert_ne!(first, second);
        assert_eq!(f.log_count(), 2);
        assert_eq!(
            f.sink.history(),
            vec![TrayStatus::Running, TrayStatus::Stopped, TrayStatus::Running]
        );
    }
}
