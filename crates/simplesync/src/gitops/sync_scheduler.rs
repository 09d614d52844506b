//! Periodic sync scheduler.
//!
//! A single loop waits on two event sources: the interval timer and the
//! shared cancellation token. Passes never overlap; ticks that fall due
//! during a long pass are delayed rather than replayed.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::apply::Applier;
use super::error::{Result, SyncError, TransportError};
use super::git::Transport;
use super::reconciler::Reconciler;
use crate::config::{ConfigError, FailurePolicy, SyncConfig};

/// Drives a reconciler on a fixed interval until cancelled.
#[derive(Debug, Clone)]
pub struct SyncScheduler {
    interval: Duration,
    policy: FailurePolicy,
}

impl SyncScheduler {
    /// Creates a new sync scheduler.
    pub fn new(interval: Duration, policy: FailurePolicy) -> Self {
        Self { interval, policy }
    }

    /// Runs passes on every tick until `shutdown` fires.
    ///
    /// Under [`FailurePolicy::Exit`] the first failed pass ends the loop
    /// with that error. Cancellation always ends the loop cleanly. The
    /// reconciler is not shut down here. A zero interval is rejected.
    pub async fn run(&self, reconciler: &mut Reconciler, shutdown: &CancellationToken) -> Result<()> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval.into());
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // skip immediate first tick

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, stopping sync loop");
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }

            match reconciler.reconcile_once(shutdown).await {
                Ok(_) => {}
                Err(e) if e.is_cancelled() || shutdown.is_cancelled() => {
                    info!("Pass interrupted by shutdown");
                    return Ok(());
                }
                Err(e) => match self.policy {
                    FailurePolicy::Continue => {
                        warn!(
                            stage = e.stage(),
                            retry_in_secs = self.interval.as_secs(),
                            "Pass failed, retrying on next tick"
                        );
                    }
                    FailurePolicy::Exit => {
                        error!(stage = e.stage(), error = %e, "Pass failed, exiting");
                        return Err(e);
                    }
                },
            }
        }
    }
}

/// Runs the reconciler for its whole lifetime: construct, bootstrap, loop, shut down.
///
/// The configuration is validated first. The working copy is removed on every
/// exit path once it has been allocated. Errors returned here should end the
/// process with a non-zero status.
pub async fn run(
    config: &SyncConfig,
    transport: Arc<dyn Transport>,
    applier: Arc<dyn Applier>,
    shutdown: CancellationToken,
) -> Result<()> {
    config.validate()?;
    let mut reconciler = Reconciler::from_config(config, transport, applier)?;

    let result = match reconciler.bootstrap(&shutdown).await {
        Ok(()) => {
            SyncScheduler::new(config.interval(), config.on_failure)
                .run(&mut reconciler, &shutdown)
                .await
        }
        Err(e) => Err(e),
    };

    // Cleanup failures are never fatal.
    if let Err(e) = reconciler.shutdown().await {
        warn!(error = %e, "Working directory cleanup failed");
    }

    match result {
        Err(SyncError::Clone(TransportError::Cancelled)) => {
            info!("Clone interrupted by shutdown");
            Ok(())
        }
        other => other,
    }
}
