//! The seam between the decision logic and the live document.
//!
//! Everything host-specific — selectors, anchoring rules, the injected
//! panel and runtime hook — sits behind [`PageAdapter`]. The lifecycle and
//! execution logic above it never touches a selector, which is what lets
//! the unit tests run against an in-memory fake.

use crate::locale::Strings;
use crate::routes::TargetView;
use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

mod live;
pub use live::LivePage;

#[cfg(test)]
pub(crate) mod fake;

/// Which of a card's paired actions to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Accept,
    Ignore,
}

impl ActionKind {
    /// Name the in-page scripts use for this action.
    pub(crate) fn as_js(self) -> &'static str {
        match self {
            ActionKind::Accept => "accept",
            ActionKind::Ignore => "ignore",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_js())
    }
}

/// One poll's view of the injected runtime hook.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeSnapshot {
    /// Current document address.
    pub address: String,

    /// Hook generation id. A new value means a full page load wiped the
    /// in-page state.
    pub epoch: u32,

    /// Popstate counter. Moves on history back/forward.
    pub nav: u32,

    /// True if the mutation observer latched since the last probe. Reading
    /// it consumes it.
    pub dirty: bool,

    /// At most one panel button press, dequeued by this probe.
    pub command: Option<ActionKind>,
}

/// Talk-back handle for one discovered card. Only valid within the wave
/// that discovered it; a later click may find the card gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardHandle {
    pub id: u32,
}

/// Outcome of one panel ensure pass.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AnchorStatus {
    /// Panel is attached at its proper anchor right now.
    pub anchored: bool,

    /// This pass had to build a fresh panel node.
    pub built: bool,
}

/// Host-facing operations. [`LivePage`] drives a real page over CDP; tests
/// substitute a scripted fake.
#[async_trait]
pub trait PageAdapter: Send + Sync + 'static {
    /// Read and consume the hook state: address, epoch, popstate counter,
    /// mutation flag, and at most one queued panel command.
    async fn probe(&self) -> Result<ProbeSnapshot>;

    /// Current document address.
    async fn address(&self) -> Result<String>;

    /// The document `lang` attribute, empty when absent.
    async fn document_lang(&self) -> Result<String>;

    /// Build the panel if needed and try to attach it at the view's anchor.
    /// A missing anchor is not an error: the panel stays detached and the
    /// returned status says so.
    async fn ensure_panel(&self, view: TargetView, strings: &Strings) -> Result<AnchorStatus>;

    /// Remove the panel from the document, if present.
    async fn remove_panel(&self) -> Result<()>;

    /// Start (or restart) the in-page mutation observer.
    async fn start_mutation_watch(&self, debounce_ms: u64) -> Result<()>;

    /// Disconnect the in-page mutation observer.
    async fn stop_mutation_watch(&self) -> Result<()>;

    /// Raw text of the view's pending-count badge, if the badge exists.
    async fn badge_text(&self, view: TargetView) -> Result<Option<String>>;

    /// Push a pending count into the panel: updates both counters, hides
    /// the panel at zero, disables idle buttons at zero.
    async fn apply_count(&self, count: u32) -> Result<()>;

    /// Toggle the running indicator and button disabling for a bulk run.
    async fn set_busy(&self, busy: bool) -> Result<()>;

    /// Discover currently-actionable cards for the view, in document order.
    /// Recomputed from scratch on every call.
    async fn discover_cards(&self, view: TargetView) -> Result<Vec<CardHandle>>;

    /// Scroll a card to viewport center.
    async fn focus_card(&self, card: CardHandle) -> Result<()>;

    /// Click one of a card's paired actions. `Ok(false)` means the card or
    /// its button was gone by click time.
    async fn click_card(&self, card: CardHandle, kind: ActionKind) -> Result<bool>;

    /// Show a transient toast. Lives on the document body, independent of
    /// the panel.
    async fn show_toast(&self, message: &str, duration_ms: u64) -> Result<()>;
}
