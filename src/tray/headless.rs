//! Headless shell for platforms without a tray backend.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use crate::config::SupervisorConfig;
use crate::controller::{Controller, StartOutcome, StopOutcome};
use crate::status::{LogIndicator, StatusSink, TrayStatus};

/// Start the supervised process and keep it running until Ctrl-C.
pub async fn run_tray(config: SupervisorConfig) -> Result<()> {
    info!("Press Ctrl-C to stop");
    run_until(config, signal::ctrl_c()).await.map(|_| ())
}

/// Run the headless lifecycle until `interrupt` resolves, then shut down.
async fn run_until<F>(config: SupervisorConfig, interrupt: F) -> Result<StopOutcome>
where
    F: Future<Output = std::io::Result<()>>,
{
    let indicator = Arc::new(LogIndicator::new(config.display_name.clone()));
    indicator.set_status(TrayStatus::Stopped);

    let controller = Controller::new(&config, indicator.clone());

    match controller.start() {
        Ok(StartOutcome::Started { pid, log_path }) => {
            info!(pid, log = %log_path.display(), "Process started successfully");
        }
        Ok(StartOutcome::AlreadyRunning { pid }) => info!(pid, "Process already running"),
        Err(e) => error!(error = %e, "Failed to start process"),
    }

    if !indicator.current().is_running() {
        warn!("Supervised process is not running");
    }

    // Without a signal listener there is no way to stop later, so clean up either way
    let signalled = interrupt.await;
    if signalled.is_ok() {
        info!("Received shutdown signal");
    }

    let outcome = super::shutdown(&controller);
    signalled.context("Failed to listen for ctrl-c")?;
    Ok(outcome)
}
