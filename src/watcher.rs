//! Address polling. SPA route changes on the host do not fire page loads,
//! so the session watches the address itself and reacts to deltas.

use crate::page::PageAdapter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// An observed address transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteChange {
    pub from: String,
    pub to: String,
}

/// Polls the page address on a fixed interval and emits a [`RouteChange`]
/// whenever it differs from the last one seen. Poll failures are logged and
/// skipped; the next tick retries.
pub struct NavWatcher {
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl NavWatcher {
    pub fn new(poll_interval_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(poll_interval_ms),
            task: None,
        }
    }

    /// Starts polling. A second call while running is a no-op.
    pub fn start<A: PageAdapter>(
        &mut self,
        adapter: Arc<A>,
        initial: String,
        tx: UnboundedSender<RouteChange>,
    ) {
        if self.task.is_some() {
            return;
        }
        let interval = self.interval;
        self.task = Some(tokio::spawn(async move {
            let mut last = initial;
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match adapter.address().await {
                    Ok(now) => {
                        if now != last {
                            debug!("address changed: {} -> {}", last, now);
                            let change = RouteChange {
                                from: std::mem::replace(&mut last, now.clone()),
                                to: now,
                            };
                            if tx.send(change).is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => warn!("address poll failed: {}", e),
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for NavWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
