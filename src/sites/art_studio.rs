use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{Session, SiteScraper, digits_only, login_failure, resolve_scrape, search_failure};
use crate::Result;
use crate::automation::Automation;
use crate::config::TargetConfig;
use crate::models::ItemQuote;
use crate::utils::error::AppError;

const LOGIN_PATH: &str = "?route=account/login";
const EMAIL_FIELD: &str = "#input-email";
const PASSWORD_FIELD: &str = "#input-password";
const LOGIN_BUTTON: &str = "#content > div > div:nth-child(2) > div > form > div.buttons > div > button";
// Only rendered for an authenticated session.
const ACCOUNT_MARKER: &str = "a[href*='route=account/logout']";
// The header search box is typeahead-enhanced; the live input carries the
// tt-input class.
const SEARCH_FIELD: &str = "#search input.tt-input";
const SUGGESTION: &str = "div.search-result.tt-suggestion.tt-selectable";
const SUGGESTION_LINK: &str = "div.search-result.tt-suggestion.tt-selectable a";
const STOCK_STATUS: &str = "li.product-stock > span";
const TRADER_PRICE: &str = "div.price-group > div.product-price";
const CONSUMER_PRICE: &str = "div.text-left";

const MARKER_TIMEOUT: Duration = Duration::from_secs(4);
const SUGGESTION_TIMEOUT: Duration = Duration::from_secs(3);

/// Scraper for the Art Studio storefront (OpenCart). Searching goes
/// through the typeahead suggestion list rather than a results page, and
/// both prices are normalized to digit-only strings.
pub struct ArtStudioScraper {
    target: TargetConfig,
    session: Session,
}

impl ArtStudioScraper {
    pub fn new(target: TargetConfig) -> Self {
        Self {
            target,
            session: Session::new(),
        }
    }
}

#[async_trait]
impl SiteScraper for ArtStudioScraper {
    fn name(&self) -> &'static str {
        "art_studio"
    }

    async fn login(&mut self, handle: &dyn Automation) -> Result<()> {
        handle
            .open(&format!("{}{}", self.target.url, LOGIN_PATH))
            .await?;

        debug!("entering login credentials");
        handle
            .type_into(EMAIL_FIELD, &self.target.username)
            .await
            .map_err(login_failure)?;
        handle
            .type_into(PASSWORD_FIELD, &self.target.pwd)
            .await
            .map_err(login_failure)?;
        handle.click(LOGIN_BUTTON).await.map_err(login_failure)?;

        handle
            .wait_for(ACCOUNT_MARKER, MARKER_TIMEOUT)
            .await
            .map_err(|_| {
                AppError::Login("incorrect credentials or post-login marker not found".to_string())
            })?;

        info!(site = self.name(), "login successful");
        self.session.logged_in();
        Ok(())
    }

    async fn search_item(&mut self, handle: &dyn Automation, item_code: &str) -> Result<()> {
        self.session.ensure_logged_in()?;

        handle
            .type_into(SEARCH_FIELD, item_code)
            .await
            .map_err(|_| AppError::Search("search field not found".to_string()))?;

        // The typeahead needs a moment to query; no suggestion within the
        // wait means the item code matched nothing.
        let matched = match handle.wait_for(SUGGESTION, SUGGESTION_TIMEOUT).await {
            Ok(()) => true,
            Err(AppError::ElementNotFound { .. }) => false,
            Err(other) => return Err(search_failure(other)),
        };
        if matched {
            handle.click(SUGGESTION_LINK).await.map_err(search_failure)?;
        }
        self.session.searched(matched);
        Ok(())
    }

    async fn scrape_results(&mut self, handle: &dyn Automation) -> Result<ItemQuote> {
        self.session.ensure_searched()?;

        if !self.session.last_search_matched() {
            self.session.scraped();
            return Ok(ItemQuote::not_available());
        }

        let attempt = async {
            let stock_status = handle.read_text(STOCK_STATUS).await?;
            let trader_price = digits_only(&handle.read_text(TRADER_PRICE).await?);
            let consumer_price = digits_only(&handle.read_text(CONSUMER_PRICE).await?);
            Ok(ItemQuote {
                stock_status,
                trader_price,
                consumer_price,
            })
        }
        .await;

        self.session.scraped();
        resolve_scrape(attempt)
    }
}
