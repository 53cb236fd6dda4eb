use folder_custody::custody::{Clock, CustodyService, CustodyStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Run the deadline scan on a fixed cadence until the task is aborted.
///
/// The first tick fires immediately, so withdrawals restored from a previous run are
/// re-evaluated on startup.
pub(crate) fn spawn_alert_scan<S, C>(
    service: Arc<CustodyService<S, C>>,
    every: Duration,
) -> JoinHandle<()>
where
    S: CustodyStore + 'static,
    C: Clock + 'static,
{
    info!(interval_secs = every.as_secs(), "alert scan scheduled");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(err) = service.scan_alerts() {
                error!(code = err.code(), error = %err, "alert scan failed");
            }
        }
    })
}
