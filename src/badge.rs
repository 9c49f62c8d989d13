//! Pending-count extraction from the badge next to each view's heading.

use crate::page::PageAdapter;
use crate::routes::TargetView;
use crate::Result;
use regex::Regex;
use std::sync::OnceLock;

fn count_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\((\d+)\)").ok()).as_ref()
}

/// Extract the first parenthesized integer from badge text, as in
/// `Invitations (7)`. Anything malformed reads as zero.
pub fn parse_count(text: &str) -> u32 {
    count_re()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Read the current pending count for a view. A missing badge reads as
/// zero; only a transport failure is an error.
pub async fn read<A: PageAdapter>(adapter: &A, view: TargetView) -> Result<u32> {
    let text = adapter.badge_text(view).await?;
    Ok(text.as_deref().map(parse_count).unwrap_or(0))
}
