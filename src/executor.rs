//! Bulk run executor. Clicks through every discovered card in paced waves,
//! re-discovering between waves until the view drains or the wave ceiling
//! is hit. Individual click failures never abort the run.

use crate::badge;
use crate::config::Pacing;
use crate::locale::Strings;
use crate::page::{ActionKind, PageAdapter};
use crate::routes::{classify, TargetView};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Shared one-run-at-a-time flag. Clones observe the same slot.
#[derive(Clone, Default)]
pub struct RunState {
    busy: Arc<AtomicBool>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the run slot, or `None` if a run is already in flight.
    pub(crate) fn try_begin(&self) -> Option<RunPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit {
                state: self.clone(),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the run slot when dropped, however the run ends.
pub(crate) struct RunPermit {
    state: RunState,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.state.busy.store(false, Ordering::Release);
    }
}

/// Outcome of one bulk run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    /// Cards whose button click went through.
    pub succeeded: u32,
    /// Cards that vanished or threw by click time.
    pub failed: u32,
    /// Waves that found at least one card.
    pub waves: u32,
}

/// Runs one bulk action to completion.
///
/// Each wave re-discovers cards from scratch, so items consumed by the host
/// (or rendered since) are naturally picked up or skipped. The run ends on
/// the first empty discovery, on leaving the target views, or at the wave
/// ceiling. The permit is held for the whole run and released on return.
pub(crate) async fn run_bulk<A: PageAdapter>(
    adapter: Arc<A>,
    kind: ActionKind,
    pacing: Pacing,
    strings: &'static Strings,
    permit: RunPermit,
) -> RunTotals {
    info!("bulk {} run starting", kind);
    let mut totals = RunTotals::default();
    if let Err(e) = adapter.set_busy(true).await {
        warn!("could not mark panel busy: {}", e);
    }

    for wave in 1..=pacing.max_waves {
        let address = match adapter.address().await {
            Ok(a) => a,
            Err(e) => {
                warn!("address read failed mid-run: {}", e);
                break;
            }
        };
        let Some(view) = classify(&address) else {
            debug!("left the target views mid-run");
            break;
        };
        let cards = match adapter.discover_cards(view).await {
            Ok(c) => c,
            Err(e) => {
                warn!("card discovery failed: {}", e);
                break;
            }
        };
        if cards.is_empty() {
            break;
        }
        totals.waves = wave;
        debug!("wave {}: {} cards", wave, cards.len());

        for card in cards {
            if adapter.focus_card(card).await.is_ok() {
                sleep(Duration::from_millis(pacing.scroll_settle_ms)).await;
            }
            match adapter.click_card(card, kind).await {
                Ok(true) => totals.succeeded += 1,
                Ok(false) => {
                    totals.failed += 1;
                    debug!("card {} was gone by click time", card.id);
                }
                Err(e) => {
                    totals.failed += 1;
                    debug!("card {} click failed: {}", card.id, e);
                }
            }
            sleep(Duration::from_millis(pacing.click_delay_ms)).await;
        }

        sleep(Duration::from_millis(pacing.wave_pause_ms)).await;
        refresh_counts(adapter.as_ref(), view).await;
    }

    if let Err(e) = adapter.set_busy(false).await {
        warn!("could not clear panel busy state: {}", e);
    }
    if let Ok(address) = adapter.address().await {
        if let Some(view) = classify(&address) {
            refresh_counts(adapter.as_ref(), view).await;
        }
    }
    let message = format!("{} ({})", strings.done, totals.succeeded);
    if let Err(e) = adapter
        .show_toast(&message, pacing.toast_duration_ms)
        .await
    {
        warn!("toast failed: {}", e);
    }
    drop(permit);
    info!(
        "bulk {} run finished: {} clicked, {} missed, {} waves",
        kind, totals.succeeded, totals.failed, totals.waves
    );
    totals
}

async fn refresh_counts<A: PageAdapter>(adapter: &A, view: TargetView) {
    match badge::read(adapter, view).await {
        Ok(count) => {
            if let Err(e) = adapter.apply_count(count).await {
                debug!("count apply failed: {}", e);
            }
        }
        Err(e) => debug!("badge read failed: {}", e),
    }
}
