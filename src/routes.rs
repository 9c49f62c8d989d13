//! Route classification for the two supported invitation views.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

const GROW_PATTERN: &str = r"(?i)^https://www\.linkedin\.com/mynetwork/grow/?(\?.*)?$";
const RECEIVED_PATTERN: &str =
    r"(?i)^https://www\.linkedin\.com/mynetwork/invitation-manager/received/?(\?.*)?$";

/// One of the views this tool activates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetView {
    /// The network overview with its invitation preview section.
    Grow,
    /// The dedicated received-invitations manager.
    Received,
}

impl TargetView {
    /// Name the in-page scripts use to pick their selectors.
    pub(crate) fn as_js(self) -> &'static str {
        match self {
            TargetView::Grow => "grow",
            TargetView::Received => "received",
        }
    }
}

impl fmt::Display for TargetView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetView::Grow => write!(f, "grow"),
            TargetView::Received => write!(f, "received"),
        }
    }
}

fn grow_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(GROW_PATTERN).ok()).as_ref()
}

fn received_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(RECEIVED_PATTERN).ok()).as_ref()
}

/// Classify an address. Case-insensitive, tolerates a trailing slash and a
/// query string; anything else is not a target.
pub fn classify(address: &str) -> Option<TargetView> {
    if grow_re()?.is_match(address) {
        return Some(TargetView::Grow);
    }
    if received_re()?.is_match(address) {
        return Some(TargetView::Received);
    }
    None
}

/// Whether the address is one of the supported views.
pub fn is_target(address: &str) -> bool {
    classify(address).is_some()
}
