//! The perpetual heartbeat loop.

use super::HeartbeatService;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

/// Run `check_report_status` every `period` until shutdown is requested.
///
/// The first tick fires one period from now; the caller has already made
/// the immediate startup report. A slow cycle delays the next tick rather
/// than queueing extra ones. If the shutdown sender is dropped the loop
/// keeps running for the life of the process.
pub(crate) async fn run(
    service: HeartbeatService,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut shutdown_open = true;

    tracing::info!(period = ?period, contract = %service.contract(), "heartbeat scheduler started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tracing::debug!("heartbeat tick");
                // Errors are logged by check_report_status; the next tick retries.
                let _ = service.check_report_status().await;
            }
            changed = shutdown.changed(), if shutdown_open => {
                match changed {
                    Ok(()) if *shutdown.borrow() => break,
                    Ok(()) => {}
                    Err(_) => shutdown_open = false,
                }
            }
        }
    }

    tracing::info!("heartbeat scheduler stopped");
}
