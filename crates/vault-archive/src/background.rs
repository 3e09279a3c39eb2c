//! Background reconciliation loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::error::ArchiveResult;
use crate::orchestrator::ArchiveOrchestrator;

/// Handle to a running reconciliation loop.
///
/// Dropping the handle leaves the loop running until the orchestrator is
/// stopped; call [`ReconcilerHandle::shutdown`] to stop and join it.
pub struct ReconcilerHandle {
    stop: Arc<watch::Sender<bool>>,
    join: JoinHandle<ArchiveResult<()>>,
}

impl ReconcilerHandle {
    /// Signal the loop (and any in-progress waits) to stop, then wait for
    /// the loop to exit. Returns the loop's own error, if it died on one.
    pub async fn shutdown(self) -> ArchiveResult<()> {
        self.stop.send_replace(true);
        match self.join.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Ok(()),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

pub(crate) fn spawn(
    orchestrator: Arc<ArchiveOrchestrator>,
    interval: Duration,
    stop: Arc<watch::Sender<bool>>,
) -> ReconcilerHandle {
    let stop_rx = stop.subscribe();
    let join = tokio::spawn(run(orchestrator, interval, stop_rx));
    ReconcilerHandle { stop, join }
}

async fn run(
    orchestrator: Arc<ArchiveOrchestrator>,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) -> ArchiveResult<()> {
    info!(interval_ms = interval.as_millis() as u64, "reconciliation loop started");
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        if *stop.borrow_and_update() {
            break;
        }
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                match orchestrator.poll_once().await {
                    Ok(summary) => debug!(?summary, "reconciliation tick"),
                    Err(err) => {
                        error!(error = %err, "reconciliation loop aborted");
                        return Err(err);
                    }
                }
            }
        }
    }

    info!("reconciliation loop stopped");
    Ok(())
}
