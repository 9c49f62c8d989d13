//! In-memory adapter for exercising the session, panel, and executor
//! without a browser. State mutators model what the host page would do
//! (navigate, reload, wipe the panel, consume a card).

use super::{ActionKind, AnchorStatus, CardHandle, PageAdapter, ProbeSnapshot};
use crate::locale::Strings;
use crate::routes::TargetView;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
pub(crate) struct FakeState {
    address: String,
    epoch: u32,
    nav: u32,
    dirty: bool,
    commands: Vec<ActionKind>,
    lang: String,
    /// Whether the view's root container exists in the fake document.
    anchor_present: bool,
    panel_built: bool,
    panel_attached: bool,
    panel_labels: Option<(String, String)>,
    watching: Option<u64>,
    badge: Option<String>,
    applied_count: Option<u32>,
    busy: bool,
    cards: Vec<u32>,
    fail_ids: HashSet<u32>,
    consume_on_click: bool,
    clicks: Vec<(u32, ActionKind)>,
    focused: Vec<u32>,
    toasts: Vec<String>,
    discover_calls: u32,
    ensure_calls: u32,
}

#[derive(Clone)]
pub(crate) struct FakePage {
    state: Arc<Mutex<FakeState>>,
}

impl FakePage {
    pub(crate) fn new(address: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                address: address.to_string(),
                epoch: 1,
                nav: 0,
                dirty: false,
                commands: Vec::new(),
                lang: "en".to_string(),
                anchor_present: true,
                panel_built: false,
                panel_attached: false,
                panel_labels: None,
                watching: None,
                badge: None,
                applied_count: None,
                busy: false,
                cards: Vec::new(),
                fail_ids: HashSet::new(),
                consume_on_click: true,
                clicks: Vec::new(),
                focused: Vec::new(),
                toasts: Vec::new(),
                discover_calls: 0,
                ensure_calls: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    // -- host-side mutators ---------------------------------------------

    pub(crate) fn set_cards(&self, ids: &[u32]) {
        self.lock().cards = ids.to_vec();
    }

    pub(crate) fn set_badge(&self, text: &str) {
        self.lock().badge = Some(text.to_string());
    }

    pub(crate) fn set_lang(&self, lang: &str) {
        self.lock().lang = lang.to_string();
    }

    pub(crate) fn set_anchor_present(&self, present: bool) {
        let mut s = self.lock();
        s.anchor_present = present;
        if !present {
            s.panel_attached = false;
        }
    }

    pub(crate) fn set_fail_ids(&self, ids: &[u32]) {
        self.lock().fail_ids = ids.iter().copied().collect();
    }

    pub(crate) fn set_consume_on_click(&self, consume: bool) {
        self.lock().consume_on_click = consume;
    }

    pub(crate) fn push_command(&self, kind: ActionKind) {
        self.lock().commands.push(kind);
    }

    pub(crate) fn mark_dirty(&self) {
        self.lock().dirty = true;
    }

    /// Models an in-app history navigation to a new address.
    pub(crate) fn navigate(&self, address: &str) {
        let mut s = self.lock();
        s.address = address.to_string();
        s.nav += 1;
    }

    /// Models a full page load: the injected state is gone, the panel and
    /// observer with it.
    pub(crate) fn reload(&self, address: &str) {
        let mut s = self.lock();
        s.address = address.to_string();
        s.epoch = s.epoch.wrapping_add(1);
        s.nav = 0;
        s.dirty = false;
        s.commands.clear();
        s.panel_built = false;
        s.panel_attached = false;
        s.watching = None;
    }

    /// Models the host replacing the subtree that held the panel.
    pub(crate) fn wipe_panel(&self) {
        let mut s = self.lock();
        s.panel_built = false;
        s.panel_attached = false;
    }

    // -- inspectors ------------------------------------------------------

    pub(crate) fn clicks(&self) -> Vec<(u32, ActionKind)> {
        self.lock().clicks.clone()
    }

    pub(crate) fn toasts(&self) -> Vec<String> {
        self.lock().toasts.clone()
    }

    pub(crate) fn applied_count(&self) -> Option<u32> {
        self.lock().applied_count
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.lock().busy
    }

    pub(crate) fn panel_attached(&self) -> bool {
        self.lock().panel_attached
    }

    pub(crate) fn panel_built(&self) -> bool {
        self.lock().panel_built
    }

    pub(crate) fn panel_labels(&self) -> Option<(String, String)> {
        self.lock().panel_labels.clone()
    }

    pub(crate) fn watching(&self) -> Option<u64> {
        self.lock().watching
    }

    pub(crate) fn discover_calls(&self) -> u32 {
        self.lock().discover_calls
    }

    pub(crate) fn ensure_calls(&self) -> u32 {
        self.lock().ensure_calls
    }

    pub(crate) fn focused(&self) -> Vec<u32> {
        self.lock().focused.clone()
    }
}

#[async_trait]
impl PageAdapter for FakePage {
    async fn probe(&self) -> Result<ProbeSnapshot> {
        let mut s = self.lock();
        let dirty = std::mem::take(&mut s.dirty);
        let command = if s.commands.is_empty() {
            None
        } else {
            Some(s.commands.remove(0))
        };
        Ok(ProbeSnapshot {
            address: s.address.clone(),
            epoch: s.epoch,
            nav: s.nav,
            dirty,
            command,
        })
    }

    async fn address(&self) -> Result<String> {
        Ok(self.lock().address.clone())
    }

    async fn document_lang(&self) -> Result<String> {
        Ok(self.lock().lang.clone())
    }

    async fn ensure_panel(&self, _view: TargetView, strings: &Strings) -> Result<AnchorStatus> {
        let mut s = self.lock();
        s.ensure_calls += 1;
        let built = !s.panel_built;
        s.panel_built = true;
        s.panel_labels = Some((strings.accept_all.to_string(), strings.ignore_all.to_string()));
        s.panel_attached = s.anchor_present;
        Ok(AnchorStatus {
            anchored: s.panel_attached,
            built,
        })
    }

    async fn remove_panel(&self) -> Result<()> {
        let mut s = self.lock();
        s.panel_built = false;
        s.panel_attached = false;
        Ok(())
    }

    async fn start_mutation_watch(&self, debounce_ms: u64) -> Result<()> {
        self.lock().watching = Some(debounce_ms);
        Ok(())
    }

    async fn stop_mutation_watch(&self) -> Result<()> {
        let mut s = self.lock();
        s.watching = None;
        s.dirty = false;
        Ok(())
    }

    async fn badge_text(&self, _view: TargetView) -> Result<Option<String>> {
        let s = self.lock();
        if !s.anchor_present {
            return Ok(None);
        }
        Ok(s.badge.clone())
    }

    async fn apply_count(&self, count: u32) -> Result<()> {
        let mut s = self.lock();
        if s.panel_built {
            s.applied_count = Some(count);
        }
        Ok(())
    }

    async fn set_busy(&self, busy: bool) -> Result<()> {
        self.lock().busy = busy;
        Ok(())
    }

    async fn discover_cards(&self, _view: TargetView) -> Result<Vec<CardHandle>> {
        let mut s = self.lock();
        s.discover_calls += 1;
        if !s.anchor_present {
            return Ok(Vec::new());
        }
        Ok(s.cards.iter().map(|&id| CardHandle { id }).collect())
    }

    async fn focus_card(&self, card: CardHandle) -> Result<()> {
        self.lock().focused.push(card.id);
        Ok(())
    }

    async fn click_card(&self, card: CardHandle, kind: ActionKind) -> Result<bool> {
        let mut s = self.lock();
        s.clicks.push((card.id, kind));
        if s.fail_ids.contains(&card.id) {
            // A failed click means the item vanished; it is gone for the
            // next discovery too.
            s.cards.retain(|&id| id != card.id);
            return Ok(false);
        }
        if s.consume_on_click {
            s.cards.retain(|&id| id != card.id);
        }
        Ok(true)
    }

    async fn show_toast(&self, message: &str, _duration_ms: u64) -> Result<()> {
        self.lock().toasts.push(message.to_string());
        Ok(())
    }
}
