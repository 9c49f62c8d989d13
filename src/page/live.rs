//! CDP-backed adapter. Every host selector, the injected runtime hook, and
//! the panel markup live in this file; nothing above it knows the DOM.

use super::{ActionKind, AnchorStatus, CardHandle, PageAdapter, ProbeSnapshot};
use crate::locale::Strings;
use crate::routes::TargetView;
use crate::{Error, Result};
use async_trait::async_trait;
use eoka::Page;
use serde::Deserialize;
use tokio::sync::Mutex;

/// Drives a live page over CDP.
///
/// The page sits behind a mutex so the session tick and a spawned bulk run
/// never interleave their CDP calls.
pub struct LivePage {
    page: Mutex<Page>,
}

impl LivePage {
    pub fn new(page: Page) -> Self {
        Self {
            page: Mutex::new(page),
        }
    }
}

// ============================================================================
// Shared script fragments
// ============================================================================

/// Creates `window.__ivs` on first use and hooks popstate once. The epoch is
/// minted per page load; a full reload wipes the object, so the next probe
/// reports a fresh epoch.
const HOOK_JS: &str = r#"
  const S = window.__ivs || (window.__ivs = {
    epoch: 1 + Math.floor(Math.random() * 0x7ffffffe),
    nav: 0,
    dirty: false,
    cmds: [],
    seq: 0,
    obs: null,
    obsTimer: 0,
    navHooked: false
  });
  if (!S.navHooked) {
    S.navHooked = true;
    window.addEventListener('popstate', () => { S.nav += 1; });
  }
"#;

/// Root container lookup per view. These attribute selectors are the host
/// contract; labels and classes are deliberately never used.
const ROOTS_JS: &str = r#"
  const roots = {
    grow: () => document.querySelector('[componentkey="MyNetwork_InvitationsPreview"]'),
    received: () => document.querySelector('div[role="main"][data-sdui-screen*="InvitationReceivedWithType"]')
  };
"#;

/// Injects the stylesheet once.
const STYLE_JS: &str = r#"
  if (!document.getElementById('ivs-style')) {
    const style = document.createElement('style');
    style.id = 'ivs-style';
    style.textContent = [
      '#ivs-panel { display: flex; gap: 8px; margin: 8px 0; align-items: center; }',
      '#ivs-panel.ivs-hidden { display: none; }',
      '#ivs-panel button { padding: 6px 14px; border-radius: 16px; border: 1px solid #0a66c2; background: #fff; color: #0a66c2; font-weight: 600; cursor: pointer; }',
      '#ivs-panel button:disabled { opacity: 0.5; cursor: default; }',
      '#ivs-panel.ivs-running button { cursor: progress; }',
      '#ivs-panel .ivs-count { margin-left: 6px; font-weight: 400; }',
      '.ivs-toast { position: fixed; bottom: 24px; left: 50%; transform: translateX(-50%); background: #1d2226; color: #fff; padding: 10px 18px; border-radius: 8px; z-index: 99999; font-size: 14px; }'
    ].join('\n');
    document.head.appendChild(style);
  }
"#;

// ============================================================================
// Probing
// ============================================================================

/// Reads and consumes the hook state in one round trip.
const PROBE_JS: &str = r#"
(() => {
__HOOK__
  const dirty = S.dirty;
  S.dirty = false;
  const command = S.cmds.length ? S.cmds.shift() : null;
  return JSON.stringify({
    address: location.href,
    epoch: S.epoch,
    nav: S.nav,
    dirty: dirty,
    command: command
  });
})()
"#;

/// Starts (or restarts) the debounced body observer that latches the dirty
/// flag for the next probe.
const WATCH_START_JS: &str = r#"
((debounceMs) => {
__HOOK__
  if (!document.body) return;
  if (S.obs) S.obs.disconnect();
  S.obs = new MutationObserver(() => {
    clearTimeout(S.obsTimer);
    S.obsTimer = setTimeout(() => { S.dirty = true; }, debounceMs);
  });
  S.obs.observe(document.body, { childList: true, subtree: true });
})
"#;

const WATCH_STOP_JS: &str = r#"
(() => {
  const S = window.__ivs;
  if (S && S.obs) {
    S.obs.disconnect();
    S.obs = null;
    clearTimeout(S.obsTimer);
    S.dirty = false;
  }
})()
"#;

// ============================================================================
// Panel
// ============================================================================

/// Builds the panel if the document lost it, then tries to attach it at the
/// view's structural anchor. Detached is a valid outcome: the panel is never
/// parked at a generic location.
const ENSURE_PANEL_JS: &str = r#"
((view, labels) => {
__HOOK__
__ROOTS__
__STYLE__
  let panel = document.getElementById('ivs-panel');
  let built = false;
  if (!panel) {
    built = true;
    panel = document.createElement('div');
    panel.id = 'ivs-panel';
    panel.className = 'ivs-hidden';
    const make = (id, label, cmd) => {
      const btn = document.createElement('button');
      btn.id = id;
      btn.type = 'button';
      btn.disabled = true;
      const text = document.createElement('span');
      text.textContent = label;
      const count = document.createElement('span');
      count.id = id + '-count';
      count.className = 'ivs-count';
      count.textContent = '0';
      btn.appendChild(text);
      btn.appendChild(count);
      btn.addEventListener('click', () => { window.__ivs.cmds.push(cmd); });
      return btn;
    };
    panel.appendChild(make('ivs-accept', labels.accept_all, 'accept'));
    panel.appendChild(make('ivs-ignore', labels.ignore_all, 'ignore'));
  }

  const positioned = !!panel.parentElement
    && (view !== 'grow' || !!panel.previousElementSibling);
  if (positioned) return JSON.stringify({ anchored: true, built: built });

  if (panel.parentElement) panel.remove();

  const root = roots[view] ? roots[view]() : null;
  if (!root) return JSON.stringify({ anchored: false, built: built });

  if (view === 'grow') {
    const heading = root.querySelector('h2');
    const row = (heading && heading.closest('div')) || root.firstElementChild;
    if (!row || !row.parentElement) return JSON.stringify({ anchored: false, built: built });
    row.insertAdjacentElement('afterend', panel);
  } else {
    if (!root.parentElement) return JSON.stringify({ anchored: false, built: built });
    root.insertAdjacentElement('beforebegin', panel);
  }
  return JSON.stringify({ anchored: !!panel.parentElement, built: built });
})
"#;

const REMOVE_PANEL_JS: &str = r#"
(() => {
  const panel = document.getElementById('ivs-panel');
  if (panel) panel.remove();
})()
"#;

const BADGE_JS: &str = r#"
((view) => {
__ROOTS__
  const root = roots[view] ? roots[view]() : null;
  if (!root) return JSON.stringify({ text: null });
  const el = view === 'grow'
    ? root.querySelector('h2')
    : root.querySelector('nav ul li:first-of-type');
  return JSON.stringify({ text: el ? el.textContent : null });
})
"#;

/// Pushes a count into the panel. Buttons stay disabled while a run is in
/// flight even if the count moves; visibility follows the count alone.
const APPLY_COUNT_JS: &str = r#"
((count) => {
  const panel = document.getElementById('ivs-panel');
  if (!panel) return;
  panel.querySelectorAll('.ivs-count').forEach((el) => { el.textContent = String(count); });
  const running = panel.classList.contains('ivs-running');
  panel.querySelectorAll('button').forEach((btn) => { btn.disabled = running || count === 0; });
  panel.classList.toggle('ivs-hidden', count === 0);
})
"#;

const SET_BUSY_JS: &str = r#"
((busy) => {
  const panel = document.getElementById('ivs-panel');
  if (!panel) return;
  panel.classList.toggle('ivs-running', busy);
  panel.querySelectorAll('button').forEach((btn) => { btn.disabled = busy; });
})
"#;

// ============================================================================
// Cards
// ============================================================================

/// Structural card discovery. Walks the pending-invitation markers inside
/// the view's root, dedupes by list-item identity, and requires two visible
/// action buttons. Matched items are tagged with a stable numeric handle so
/// a later click can resolve them without holding element references.
const DISCOVER_JS: &str = r#"
((view) => {
__HOOK__
__ROOTS__
  const root = roots[view] ? roots[view]() : null;
  if (!root) return JSON.stringify([]);
  const visible = (el) => {
    if (!el) return false;
    const style = getComputedStyle(el);
    if (style.visibility !== 'visible' || style.display === 'none') return false;
    const rect = el.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
  };
  const seen = new Set();
  const ids = [];
  root.querySelectorAll('div[data-view-name="pending-invitation"]').forEach((marker) => {
    const item = marker.closest('[role="listitem"]') || marker.parentElement || marker;
    if (seen.has(item)) return;
    const btns = item.querySelectorAll('div[data-view-name="invitation-action"] button');
    if (btns.length < 2 || !visible(btns[0]) || !visible(btns[1])) return;
    seen.add(item);
    if (!item.dataset.ivsCard) {
      S.seq += 1;
      item.dataset.ivsCard = String(S.seq);
    }
    ids.push(Number(item.dataset.ivsCard));
  });
  return JSON.stringify(ids);
})
"#;

const FOCUS_CARD_JS: &str = r#"
((id) => {
  const item = document.querySelector('[data-ivs-card="' + id + '"]');
  if (item) item.scrollIntoView({ block: 'center' });
})
"#;

/// Clicks one of a card's paired buttons. Button order is the host
/// convention: index 0 ignores, index 1 accepts.
const CLICK_CARD_JS: &str = r#"
((id, kind) => {
  const item = document.querySelector('[data-ivs-card="' + id + '"]');
  if (!item) return JSON.stringify({ clicked: false });
  const btns = item.querySelectorAll('div[data-view-name="invitation-action"] button');
  if (btns.length < 2) return JSON.stringify({ clicked: false });
  const btn = kind === 'accept' ? btns[1] : btns[0];
  try {
    btn.click();
  } catch (e) {
    return JSON.stringify({ clicked: false });
  }
  return JSON.stringify({ clicked: true });
})
"#;

// ============================================================================
// Toast
// ============================================================================

const TOAST_JS: &str = r#"
((message, durationMs) => {
__STYLE__
  const toast = document.createElement('div');
  toast.className = 'ivs-toast';
  toast.textContent = message;
  document.body.appendChild(toast);
  setTimeout(() => { toast.remove(); }, durationMs);
})
"#;

// ============================================================================
// Adapter impl
// ============================================================================

#[derive(Deserialize)]
struct RawBadge {
    text: Option<String>,
}

#[derive(Deserialize)]
struct RawClicked {
    clicked: bool,
}

#[async_trait]
impl PageAdapter for LivePage {
    async fn probe(&self) -> Result<ProbeSnapshot> {
        let js = PROBE_JS.replace("__HOOK__", HOOK_JS);
        let page = self.page.lock().await;
        let json: String = page.evaluate(&js).await?;
        serde_json::from_str(&json).map_err(|e| Error::Probe(format!("probe parse error: {}", e)))
    }

    async fn address(&self) -> Result<String> {
        let page = self.page.lock().await;
        Ok(page.url().await?)
    }

    async fn document_lang(&self) -> Result<String> {
        let page = self.page.lock().await;
        let lang: String = page
            .evaluate("document.documentElement.getAttribute('lang') || ''")
            .await?;
        Ok(lang)
    }

    async fn ensure_panel(&self, view: TargetView, strings: &Strings) -> Result<AnchorStatus> {
        let labels = serde_json::json!({
            "accept_all": strings.accept_all,
            "ignore_all": strings.ignore_all,
        });
        let js = format!(
            "{}({}, {})",
            ENSURE_PANEL_JS
                .replace("__HOOK__", HOOK_JS)
                .replace("__ROOTS__", ROOTS_JS)
                .replace("__STYLE__", STYLE_JS),
            serde_json::to_string(view.as_js()).unwrap(),
            labels
        );
        let page = self.page.lock().await;
        let json: String = page.evaluate(&js).await?;
        serde_json::from_str(&json).map_err(|e| Error::Probe(format!("panel parse error: {}", e)))
    }

    async fn remove_panel(&self) -> Result<()> {
        let page = self.page.lock().await;
        page.execute(REMOVE_PANEL_JS).await?;
        Ok(())
    }

    async fn start_mutation_watch(&self, debounce_ms: u64) -> Result<()> {
        let js = format!(
            "{}({})",
            WATCH_START_JS.replace("__HOOK__", HOOK_JS),
            debounce_ms
        );
        let page = self.page.lock().await;
        page.execute(&js).await?;
        Ok(())
    }

    async fn stop_mutation_watch(&self) -> Result<()> {
        let page = self.page.lock().await;
        page.execute(WATCH_STOP_JS).await?;
        Ok(())
    }

    async fn badge_text(&self, view: TargetView) -> Result<Option<String>> {
        let js = format!(
            "{}({})",
            BADGE_JS.replace("__ROOTS__", ROOTS_JS),
            serde_json::to_string(view.as_js()).unwrap()
        );
        let page = self.page.lock().await;
        let json: String = page.evaluate(&js).await?;
        let raw: RawBadge = serde_json::from_str(&json)
            .map_err(|e| Error::Probe(format!("badge parse error: {}", e)))?;
        Ok(raw.text)
    }

    async fn apply_count(&self, count: u32) -> Result<()> {
        let js = format!("{}({})", APPLY_COUNT_JS, count);
        let page = self.page.lock().await;
        page.execute(&js).await?;
        Ok(())
    }

    async fn set_busy(&self, busy: bool) -> Result<()> {
        let js = format!("{}({})", SET_BUSY_JS, busy);
        let page = self.page.lock().await;
        page.execute(&js).await?;
        Ok(())
    }

    async fn discover_cards(&self, view: TargetView) -> Result<Vec<CardHandle>> {
        let js = format!(
            "{}({})",
            DISCOVER_JS
                .replace("__HOOK__", HOOK_JS)
                .replace("__ROOTS__", ROOTS_JS),
            serde_json::to_string(view.as_js()).unwrap()
        );
        let page = self.page.lock().await;
        let json: String = page.evaluate(&js).await?;
        let ids: Vec<u32> = serde_json::from_str(&json)
            .map_err(|e| Error::Probe(format!("discover parse error: {}", e)))?;
        Ok(ids.into_iter().map(|id| CardHandle { id }).collect())
    }

    async fn focus_card(&self, card: CardHandle) -> Result<()> {
        let js = format!("{}({})", FOCUS_CARD_JS, card.id);
        let page = self.page.lock().await;
        page.execute(&js).await?;
        Ok(())
    }

    async fn click_card(&self, card: CardHandle, kind: ActionKind) -> Result<bool> {
        let js = format!(
            "{}({}, {})",
            CLICK_CARD_JS,
            card.id,
            serde_json::to_string(kind.as_js()).unwrap()
        );
        let page = self.page.lock().await;
        let json: String = page.evaluate(&js).await?;
        let raw: RawClicked = serde_json::from_str(&json)
            .map_err(|e| Error::Probe(format!("click parse error: {}", e)))?;
        Ok(raw.clicked)
    }

    async fn show_toast(&self, message: &str, duration_ms: u64) -> Result<()> {
        let js = format!(
            "{}({}, {})",
            TOAST_JS.replace("__STYLE__", STYLE_JS),
            serde_json::to_string(message).unwrap(),
            duration_ms
        );
        let page = self.page.lock().await;
        page.execute(&js).await?;
        Ok(())
    }
}
