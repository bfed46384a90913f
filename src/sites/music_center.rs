use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{Session, SiteScraper, login_failure, resolve_scrape, search_failure};
use crate::Result;
use crate::automation::Automation;
use crate::config::TargetConfig;
use crate::models::ItemQuote;
use crate::utils::error::AppError;

const LOGIN_PATH: &str = "/system/login";
// The DevExtreme login form renders both credential inputs with the same
// markup; they are addressed by position, username first.
const CREDENTIAL_FIELDS: &str = "input[role='textbox']";
const LOGIN_BUTTON: &str = "dx-button[aria-label='כניסה למערכת']";
const START_ORDER_BUTTON: &str = "dx-button[aria-label='התחל הזמנה']";
const SEARCH_FIELD: &str = "input.dx-texteditor-input";
const RESULT_CONTAINER: &str = "div.item-container";
const STOCK_STATUS: &str = "div[class*='stock-custom-text']";
const PRICE: &str = ".price";
const PRICE_TOGGLE: &str = ".alternative-price";

const MARKER_TIMEOUT: Duration = Duration::from_secs(4);
const RESULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Scraper for the Music Center ordering system (DevExtreme single-page
/// UI). The order screen sits behind a one-time "start order" transition
/// that must fire before the first search only.
pub struct MusicCenterScraper {
    target: TargetConfig,
    session: Session,
    first_search: bool,
}

impl MusicCenterScraper {
    pub fn new(target: TargetConfig) -> Self {
        Self {
            target,
            session: Session::new(),
            first_search: true,
        }
    }
}

#[async_trait]
impl SiteScraper for MusicCenterScraper {
    fn name(&self) -> &'static str {
        "music_center"
    }

    async fn login(&mut self, handle: &dyn Automation) -> Result<()> {
        handle
            .open(&format!("{}{}", self.target.url, LOGIN_PATH))
            .await?;

        debug!("entering login credentials");
        handle
            .type_into_nth(CREDENTIAL_FIELDS, 0, &self.target.username)
            .await
            .map_err(login_failure)?;
        handle
            .type_into_nth(CREDENTIAL_FIELDS, 1, &self.target.pwd)
            .await
            .map_err(login_failure)?;
        handle.submit(LOGIN_BUTTON).await.map_err(login_failure)?;

        // The "start order" button only renders for an authenticated session.
        handle
            .wait_for(START_ORDER_BUTTON, MARKER_TIMEOUT)
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

        if self.first_search {
            handle
                .submit(START_ORDER_BUTTON)
                .await
                .map_err(search_failure)?;
            self.first_search = false;
        }

        handle
            .type_into(SEARCH_FIELD, item_code)
            .await
            .map_err(|_| AppError::Search("search field not found".to_string()))?;
        handle.submit(SEARCH_FIELD).await.map_err(search_failure)?;

        // Results render asynchronously; a missing container means the item
        // code matched nothing, which is not an error.
        let matched = match handle.wait_for(RESULT_CONTAINER, RESULT_TIMEOUT).await {
            Ok(()) => true,
            Err(AppError::ElementNotFound { .. }) => false,
            Err(other) => return Err(search_failure(other)),
        };
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
            let trader_price = handle.read_text(PRICE).await?;
            // The same element shows the alternative price after the toggle.
            handle.click(PRICE_TOGGLE).await?;
            let consumer_price = handle.read_text(PRICE).await?;
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
