//! Panel lifecycle. Owns the decision of when the control panel exists,
//! where it sits, and what count it shows. The DOM work itself happens in
//! the page adapter; this layer only sequences it.

use crate::badge;
use crate::config::Pacing;
use crate::locale::Strings;
use crate::page::PageAdapter;
use crate::routes::{classify, TargetView};
use crate::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnchorState {
    /// Not on a target view; no panel.
    Inactive,
    /// On a target view but the anchor has not rendered yet.
    Anchoring,
    /// Panel attached at its anchor.
    Anchored,
}

/// Keeps the injected panel alive on a target view.
///
/// The host rerenders aggressively, so the panel is treated as disposable:
/// every mutation event and every burst tick re-checks the attachment and
/// reattaches (or rebuilds) as needed.
pub(crate) struct PanelManager<A: PageAdapter> {
    adapter: Arc<A>,
    strings: &'static Strings,
    pacing: Pacing,
    state: AnchorState,
    view: Option<TargetView>,
    burst_left: u32,
}

impl<A: PageAdapter> PanelManager<A> {
    pub(crate) fn new(adapter: Arc<A>, strings: &'static Strings, pacing: Pacing) -> Self {
        Self {
            adapter,
            strings,
            pacing,
            state: AnchorState::Inactive,
            view: None,
            burst_left: 0,
        }
    }

    pub(crate) fn view(&self) -> Option<TargetView> {
        self.view
    }

    pub(crate) fn is_anchored(&self) -> bool {
        self.state == AnchorState::Anchored
    }

    /// Reacts to landing on an address: sets up on a target view, tears
    /// down everywhere else.
    pub(crate) async fn bootstrap(&mut self, address: &str) -> Result<()> {
        match classify(address) {
            Some(view) => {
                info!("target view detected: {}", view);
                self.view = Some(view);
                self.state = AnchorState::Anchoring;
                self.burst_left = self.pacing.anchor_burst_checks;
                self.adapter
                    .start_mutation_watch(self.pacing.mutation_debounce_ms)
                    .await?;
                self.ensure_anchored().await?;
            }
            None => self.teardown().await?,
        }
        Ok(())
    }

    /// Called when the page reported DOM churn.
    pub(crate) async fn on_mutation(&mut self) -> Result<()> {
        if self.view.is_none() {
            return Ok(());
        }
        self.ensure_anchored().await?;
        self.refresh_counts().await
    }

    /// Burst re-checks right after a bootstrap, for roots that render a few
    /// beats after the address settles. Stops early once anchored.
    pub(crate) async fn tick(&mut self) -> Result<()> {
        if self.view.is_none() || self.burst_left == 0 {
            return Ok(());
        }
        if self.state == AnchorState::Anchored {
            self.burst_left = 0;
            return Ok(());
        }
        self.burst_left -= 1;
        self.ensure_anchored().await
    }

    /// Re-reads the badge and pushes the count into the panel.
    pub(crate) async fn refresh_counts(&mut self) -> Result<()> {
        let Some(view) = self.view else {
            return Ok(());
        };
        let count = badge::read(self.adapter.as_ref(), view).await?;
        self.adapter.apply_count(count).await
    }

    async fn ensure_anchored(&mut self) -> Result<()> {
        let Some(view) = self.view else {
            return Ok(());
        };
        let status = self.adapter.ensure_panel(view, self.strings).await?;
        if status.anchored {
            let was = self.state;
            self.state = AnchorState::Anchored;
            if status.built || was != AnchorState::Anchored {
                debug!("panel anchored on {}", view);
                self.refresh_counts().await?;
            }
        } else {
            self.state = AnchorState::Anchoring;
        }
        Ok(())
    }

    /// Removes the panel and the mutation watch. Safe to call repeatedly.
    pub(crate) async fn teardown(&mut self) -> Result<()> {
        if self.state == AnchorState::Inactive && self.view.is_none() {
            return Ok(());
        }
        debug!("tearing down panel");
        self.view = None;
        self.state = AnchorState::Inactive;
        self.burst_left = 0;
        self.adapter.remove_panel().await?;
        self.adapter.stop_mutation_watch().await
    }
}
