use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use pricescout::browser::ChromeSession;
use pricescout::config::{BrowserConfig, TargetStore};
use pricescout::models::TargetId;
use pricescout::runner::{self, ConsoleSink};
use pricescout::sites;

#[derive(Parser)]
#[command(name = "pricescout", version, about = "Stock and price lookup across retail supplier sites")]
struct Cli {
    /// INI file with one section per retail target
    #[arg(long, default_value = "config.ini")]
    config: PathBuf,

    /// Retail target to run against
    #[arg(long, value_enum)]
    target: TargetId,

    /// Show the browser window instead of running headless
    #[arg(long)]
    headed: bool,

    /// Item codes to look up, in order
    #[arg(required = true)]
    items: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pricescout=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let targets = TargetStore::load(&cli.config)?;
    let target_config = targets.get(cli.target)?.clone();

    let mut scraper = sites::for_target(cli.target, target_config);
    let session = ChromeSession::launch(&BrowserConfig::new(!cli.headed))?;

    let mut sink = ConsoleSink;
    let report = runner::run_session(session, scraper.as_mut(), &cli.items, &mut sink).await?;

    let failed = report.failed_count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} items failed", report.items.len());
    }

    info!(site = %cli.target, items = report.items.len(), "run complete");
    Ok(())
}
