use tracing::{info, warn};

use crate::Result;
use crate::automation::Automation;
use crate::models::ItemQuote;
use crate::sites::SiteScraper;

/// Where scraped quotes end up. The default sink prints to stdout.
pub trait QuoteSink {
    fn accept(&mut self, item_code: &str, quote: &ItemQuote);
}

pub struct ConsoleSink;

impl QuoteSink for ConsoleSink {
    fn accept(&mut self, item_code: &str, quote: &ItemQuote) {
        println!("Product: {item_code}");
        println!("Availability: {}", quote.stock_status);
        println!("Seller price: {}", quote.trader_price);
        println!("Customer price: {}", quote.consumer_price);
    }
}

#[derive(Debug)]
pub enum ItemOutcome {
    Quote(ItemQuote),
    Failed(String),
}

#[derive(Debug)]
pub struct RunReport {
    pub items: Vec<(String, ItemOutcome)>,
}

impl RunReport {
    pub fn failed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|(_, outcome)| matches!(outcome, ItemOutcome::Failed(_)))
            .count()
    }
}

/// Run the full flow for one target: login once, then search and scrape
/// each item code in order.
///
/// Takes ownership of the browser session so it is released exactly once
/// on every exit path — success, per-item failure, or login failure.
pub async fn run_session<A: Automation>(
    session: A,
    scraper: &mut dyn SiteScraper,
    item_codes: &[String],
    sink: &mut dyn QuoteSink,
) -> Result<RunReport> {
    let report = run(&session, scraper, item_codes, sink).await;
    drop(session);
    report
}

async fn run(
    handle: &dyn Automation,
    scraper: &mut dyn SiteScraper,
    item_codes: &[String],
    sink: &mut dyn QuoteSink,
) -> Result<RunReport> {
    info!(site = scraper.name(), "logging in");
    // A failed login aborts before any item is attempted.
    scraper.login(handle).await?;

    let mut items = Vec::with_capacity(item_codes.len());
    for code in item_codes {
        match scrape_one(handle, scraper, code).await {
            Ok(quote) => {
                sink.accept(code, &quote);
                items.push((code.clone(), ItemOutcome::Quote(quote)));
            }
            Err(e) => {
                // One bad item should not sink the rest of the run.
                warn!(site = scraper.name(), item = %code, error = %e, "item failed, continuing");
                items.push((code.clone(), ItemOutcome::Failed(e.to_string())));
            }
        }
    }

    Ok(RunReport { items })
}

async fn scrape_one(
    handle: &dyn Automation,
    scraper: &mut dyn SiteScraper,
    item_code: &str,
) -> Result<ItemQuote> {
    scraper.search_item(handle, item_code).await?;
    scraper.scrape_results(handle).await
}
