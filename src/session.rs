//! Session orchestration. One session owns one page: it polls the injected
//! hook, reacts to route changes and reloads, keeps the panel alive through
//! the panel manager, and spawns bulk runs for panel commands.

use crate::config::Pacing;
use crate::executor::{run_bulk, RunState, RunTotals};
use crate::locale::{for_lang, Strings};
use crate::page::{ActionKind, PageAdapter};
use crate::panel::PanelManager;
use crate::watcher::{NavWatcher, RouteChange};
use crate::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Supervises one page until shut down.
///
/// Route changes are detected two ways that converge on the same handler:
/// the address poller catches pushState-style transitions, and the probed
/// counters catch popstate jumps and full reloads. Whichever fires first
/// wins; the other sees the address already handled.
pub struct Session<A: PageAdapter> {
    adapter: Arc<A>,
    pacing: Pacing,
    strings: &'static Strings,
    panel: PanelManager<A>,
    run_state: RunState,
    watcher: NavWatcher,
    last_address: String,
    last_epoch: u32,
    last_nav: u32,
    current_run: Option<JoinHandle<RunTotals>>,
}

impl<A: PageAdapter> Session<A> {
    /// Reads the document language and address, then builds the session.
    /// The page should be loaded before this is called.
    pub async fn new(adapter: A, pacing: Pacing) -> Result<Self> {
        let adapter = Arc::new(adapter);
        let lang = adapter.document_lang().await?;
        let strings = for_lang(&lang);
        let last_address = adapter.address().await?;
        let panel = PanelManager::new(adapter.clone(), strings, pacing);
        let watcher = NavWatcher::new(pacing.poll_interval_ms);
        Ok(Self {
            adapter,
            pacing,
            strings,
            panel,
            run_state: RunState::new(),
            watcher,
            last_address,
            last_epoch: 0,
            last_nav: 0,
            current_run: None,
        })
    }

    /// Observable run slot, shared with any bulk run this session spawns.
    pub fn run_state(&self) -> RunState {
        self.run_state.clone()
    }

    /// Drives the session until `shutdown` resolves, then tears down.
    pub async fn run_until(&mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let snapshot = self.adapter.probe().await?;
        self.last_epoch = snapshot.epoch;
        self.last_nav = snapshot.nav;
        self.last_address = snapshot.address;

        self.watcher
            .start(self.adapter.clone(), self.last_address.clone(), tx);
        let address = self.last_address.clone();
        self.panel.bootstrap(&address).await?;

        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.pacing.poll_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                change = rx.recv() => match change {
                    Some(change) => {
                        if change.to == self.last_address {
                            debug!("route change to {} already handled", change.to);
                        } else if let Err(e) = self.on_route_change(change).await {
                            warn!("route change handling failed: {}", e);
                        }
                    }
                    None => {
                        warn!("address watcher stopped unexpectedly");
                        break;
                    }
                },
                _ = ticker.tick() => {
                    if let Err(e) = self.on_tick().await {
                        warn!("tick failed: {}", e);
                    }
                }
            }
        }

        self.shutdown().await
    }

    /// Teardown, a short settle, then bootstrap against whatever address
    /// the page holds once the dust clears.
    async fn on_route_change(&mut self, change: RouteChange) -> Result<()> {
        info!("route change: {} -> {}", change.from, change.to);
        self.last_address = change.to;
        self.panel.teardown().await?;
        tokio::time::sleep(Duration::from_millis(self.pacing.rebootstrap_delay_ms)).await;
        // The address may have moved again while we waited.
        let address = self.adapter.address().await?;
        self.last_address = address.clone();
        self.panel.bootstrap(&address).await
    }

    async fn on_tick(&mut self) -> Result<()> {
        let snapshot = self.adapter.probe().await?;

        // A fresh epoch means the injected state was wiped by a full load.
        if snapshot.epoch != self.last_epoch {
            info!("page reloaded, rebuilding");
            self.last_epoch = snapshot.epoch;
            self.last_nav = snapshot.nav;
            let change = RouteChange {
                from: self.last_address.clone(),
                to: snapshot.address,
            };
            self.on_route_change(change).await?;
            self.reap_finished_run();
            return Ok(());
        }

        if snapshot.nav != self.last_nav {
            self.last_nav = snapshot.nav;
            if snapshot.address != self.last_address {
                let change = RouteChange {
                    from: self.last_address.clone(),
                    to: snapshot.address,
                };
                self.on_route_change(change).await?;
                self.reap_finished_run();
                return Ok(());
            }
        }

        if let Some(kind) = snapshot.command {
            self.trigger(kind);
        }
        if snapshot.dirty {
            self.panel.on_mutation().await?;
        }
        self.panel.tick().await?;
        self.reap_finished_run();
        Ok(())
    }

    fn trigger(&mut self, kind: ActionKind) {
        match self.run_state.try_begin() {
            Some(permit) => {
                info!("panel command: {} all", kind);
                let task = tokio::spawn(run_bulk(
                    self.adapter.clone(),
                    kind,
                    self.pacing,
                    self.strings,
                    permit,
                ));
                self.current_run = Some(task);
            }
            None => debug!("{} command ignored, a run is already in flight", kind),
        }
    }

    fn reap_finished_run(&mut self) {
        if let Some(task) = &self.current_run {
            if task.is_finished() {
                self.current_run = None;
            }
        }
    }

    async fn shutdown(&mut self) -> Result<()> {
        info!("shutting down");
        self.watcher.stop();
        self.reap_finished_run();
        if self.current_run.take().is_some() {
            warn!("bulk run still in flight, leaving it behind");
        }
        self.panel.teardown().await
    }
}
