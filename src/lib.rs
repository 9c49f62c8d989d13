//! # invitesweep
//!
//! Bulk-triage LinkedIn invitations. Watches a live page for the two
//! invitation views, injects an Accept all / Ignore all panel at a stable
//! anchor, and clicks the paired card actions in paced waves.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use invitesweep::{Config, LivePage, Session};
//!
//! # #[tokio::main]
//! # async fn main() -> invitesweep::Result<()> {
//! let config = Config::load("invitesweep.yaml")?;
//! let browser = eoka::Browser::launch_with_config(config.browser.stealth()).await?;
//! let page = browser.new_page("about:blank").await?;
//! page.goto(&config.start_url).await?;
//! let mut session = Session::new(LivePage::new(page), config.pacing).await?;
//! session
//!     .run_until(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//! browser.close().await?;
//! # Ok(())
//! # }
//! ```

mod badge;
mod config;
mod executor;
mod locale;
mod page;
mod panel;
mod routes;
mod session;
mod watcher;

pub use badge::parse_count;
pub use config::{BrowserConfig, Config, Pacing, Viewport};
pub use executor::{RunState, RunTotals};
pub use locale::{for_lang, Strings};
pub use page::{ActionKind, AnchorStatus, CardHandle, LivePage, PageAdapter, ProbeSnapshot};
pub use routes::{classify, is_target, TargetView};
pub use session::Session;

/// Result type for invitesweep operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during config loading or while driving the page.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("page probe error: {0}")]
    Probe(String),
}
