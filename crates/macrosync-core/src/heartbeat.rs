// ── Uptime heartbeat ──
//
// Independent periodic task. Owns its counter; shares nothing with the
// reconciliation path except the collaborator handles.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::collaborator::{Monitoring, Notification, Notifier, StatusSignal};

const MS_PER_MINUTE: u64 = 60_000;

pub struct Heartbeat {
    /// Elapsed time in milliseconds; minutes are derived on read.
    elapsed_ms: AtomicU64,
    interval: Duration,
    notifier: Arc<dyn Notifier>,
    monitoring: Arc<dyn Monitoring>,
}

impl Heartbeat {
    pub fn new(
        interval: Duration,
        notifier: Arc<dyn Notifier>,
        monitoring: Arc<dyn Monitoring>,
    ) -> Self {
        Self {
            elapsed_ms: AtomicU64::new(0),
            interval,
            notifier,
            monitoring,
        }
    }

    /// Uptime in whole minutes as of the last tick.
    pub fn uptime_minutes(&self) -> u64 {
        self.elapsed_ms.load(Ordering::Relaxed) / MS_PER_MINUTE
    }

    /// Advance the clock by one interval and report whole minutes elapsed.
    pub async fn tick(&self) -> u64 {
        let step = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX);
        let elapsed = self
            .elapsed_ms
            .fetch_add(step, Ordering::Relaxed)
            .saturating_add(step);
        let minutes = elapsed / MS_PER_MINUTE;
        debug!(minutes, "heartbeat");

        let note = Notification::new(format!("App is up. Uptime: {minutes} minutes"));
        if let Err(e) = self.notifier.notify(&note).await {
            warn!(error = %e, "heartbeat notification failed");
        }
        if let Err(e) = self
            .monitoring
            .push_signal(StatusSignal::Uptime, Value::from(minutes))
            .await
        {
            warn!(error = %e, "uptime push failed");
        }
        minutes
    }

    /// Tick every interval until `cancel` fires. The first tick happens one
    /// full interval after spawning.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + self.interval;
            let mut ticker = tokio::time::interval_at(start, self.interval);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        self.tick().await;
                    }
                }
            }
            debug!("heartbeat stopped");
        })
    }
}
