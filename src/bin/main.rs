use clap::Parser;
use invitesweep::{Config, LivePage, Session};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "invitesweep")]
#[command(about = "Bulk-triage LinkedIn invitations from an injected panel")]
#[command(version)]
struct Cli {
    /// Config file (built-in defaults are used when omitted)
    config: Option<PathBuf>,

    /// Run in headless mode (overrides config)
    #[arg(long)]
    headless: bool,

    /// Open this address instead of the configured one
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate config without running
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> invitesweep::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let mut config = match cli.config {
        Some(ref path) => Config::load(path)?,
        None => Config::default(),
    };

    // CLI overrides
    if cli.headless {
        config.browser.headless = true;
    }
    if let Some(url) = cli.url {
        config.start_url = url;
    }

    if cli.check {
        println!("Config valid");
        println!("  Start URL: {}", config.start_url);
        println!("  Headless: {}", config.browser.headless);
        println!("  Poll interval: {}ms", config.pacing.poll_interval_ms);
        println!("  Click delay: {}ms", config.pacing.click_delay_ms);
        println!("  Wave ceiling: {}", config.pacing.max_waves);
        return Ok(());
    }

    println!("Opening: {}", config.start_url);
    println!("Sign in if prompted; the panel appears on the invitation views.");
    println!("Press Ctrl-C to quit.");

    let browser = eoka::Browser::launch_with_config(config.browser.stealth()).await?;
    let page = browser.new_page("about:blank").await?;
    page.goto(&config.start_url).await?;

    let mut session = Session::new(LivePage::new(page), config.pacing).await?;
    session
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {}", e);
            }
        })
        .await?;

    browser.close().await?;

    Ok(())
}
