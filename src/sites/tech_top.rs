use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{Session, SiteScraper, leading_integer, login_failure, resolve_scrape, search_failure};
use crate::Result;
use crate::automation::Automation;
use crate::config::TargetConfig;
use crate::models::ItemQuote;
use crate::utils::error::AppError;

const LOGIN_PATH: &str = "/Login";
const USERNAME_FIELD: &str = "#ContentPlaceHolder1_Login1_LoginName";
const PASSWORD_FIELD: &str = "#ContentPlaceHolder1_Login1_LoginPWD";
const LOGIN_BUTTON: &str = "#ContentPlaceHolder1_Login1_submitLogIn";
const ACCOUNT_MARKER: &str = "#btnOpenAccount div.name";
const SEARCH_FIELD: &str = "input#search";
const SEARCH_BUTTON: &str = "#SearchButton";
const FIRST_RESULT: &str = "div.searchresults a";
const PRODUCT_PANEL: &str = ".productdataplace";
const STOCK_STATUS: &str = "div.stockplace span";
// Both price tiers render with the same markup: consumer first, trader
// second.
const PRICES: &str = "div.price span.pr";

const MARKER_TIMEOUT: Duration = Duration::from_secs(2);
const RESULT_TIMEOUT: Duration = Duration::from_secs(2);
const PANEL_TIMEOUT: Duration = Duration::from_secs(4);

/// Scraper for the Tech Top catalog (ASP.NET WebForms). Search lands on a
/// results list whose first hit is clicked through to the product page.
pub struct TechTopScraper {
    target: TargetConfig,
    session: Session,
}

impl TechTopScraper {
    pub fn new(target: TargetConfig) -> Self {
        Self {
            target,
            session: Session::new(),
        }
    }
}

#[async_trait]
impl SiteScraper for TechTopScraper {
    fn name(&self) -> &'static str {
        "tech_top"
    }

    async fn login(&mut self, handle: &dyn Automation) -> Result<()> {
        handle
            .open(&format!("{}{}", self.target.url, LOGIN_PATH))
            .await?;

        debug!("entering login credentials");
        handle
            .type_into(USERNAME_FIELD, &self.target.username)
            .await
            .map_err(login_failure)?;
        handle
            .type_into(PASSWORD_FIELD, &self.target.pwd)
            .await
            .map_err(login_failure)?;
        handle.submit(LOGIN_BUTTON).await.map_err(login_failure)?;

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
        handle.click(SEARCH_BUTTON).await.map_err(search_failure)?;

        let matched = match handle.wait_for(FIRST_RESULT, RESULT_TIMEOUT).await {
            Ok(()) => true,
            Err(AppError::ElementNotFound { .. }) => false,
            Err(other) => return Err(search_failure(other)),
        };
        if matched {
            handle.click(FIRST_RESULT).await.map_err(search_failure)?;
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
            handle.wait_for(PRODUCT_PANEL, PANEL_TIMEOUT).await?;
            let stock_status = handle.read_text(STOCK_STATUS).await?;

            let prices = handle.read_text_all(PRICES).await?;
            let [consumer, trader] = prices.as_slice() else {
                // Fewer price entries than the product page renders for a
                // stocked item: treat as fields absent.
                return Err(AppError::ElementNotFound {
                    selector: PRICES.to_string(),
                });
            };

            Ok(ItemQuote {
                stock_status,
                trader_price: leading_integer(trader),
                consumer_price: leading_integer(consumer),
            })
        }
        .await;

        self.session.scraped();
        resolve_scrape(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::MockAutomation;

    fn target() -> TargetConfig {
        TargetConfig {
            url: "https://www.example-techtop.co.il".to_string(),
            username: "tt_user".to_string(),
            pwd: "tt_secret".to_string(),
        }
    }

    fn expect_login(mock: &mut MockAutomation) {
        mock.expect_open()
            .withf(|url| url == "https://www.example-techtop.co.il/Login")
            .times(1)
            .returning(|_| Ok(()));
        mock.expect_type_into()
            .withf(|s, t| s == USERNAME_FIELD && t == "tt_user")
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_type_into()
            .withf(|s, t| s == PASSWORD_FIELD && t == "tt_secret")
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_submit()
            .withf(|s| s == LOGIN_BUTTON)
            .times(1)
            .returning(|_| Ok(()));
        mock.expect_wait_for()
            .withf(|s, _| s == ACCOUNT_MARKER)
            .times(1)
            .returning(|_, _| Ok(()));
    }

    fn expect_search(mock: &mut MockAutomation, matched: bool) {
        mock.expect_type_into()
            .withf(|s, _| s == SEARCH_FIELD)
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_click()
            .withf(|s| s == SEARCH_BUTTON)
            .times(1)
            .returning(|_| Ok(()));
        mock.expect_wait_for()
            .withf(|s, _| s == FIRST_RESULT)
            .times(1)
            .returning(move |s, _| {
                if matched {
                    Ok(())
                } else {
                    Err(AppError::ElementNotFound {
                        selector: s.to_string(),
                    })
                }
            });
        if matched {
            mock.expect_click()
                .withf(|s| s == FIRST_RESULT)
                .times(1)
                .returning(|_| Ok(()));
        }
    }

    #[tokio::test]
    async fn test_login_golden_path() {
        let mut mock = MockAutomation::new();
        expect_login(&mut mock);

        let mut scraper = TechTopScraper::new(target());
        scraper.login(&mock).await.expect("login should succeed");
    }

    #[tokio::test]
    async fn test_scrape_orders_and_truncates_prices() {
        let mut mock = MockAutomation::new();
        expect_login(&mut mock);
        expect_search(&mut mock, true);

        mock.expect_wait_for()
            .withf(|s, _| s == PRODUCT_PANEL)
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_read_text()
            .withf(|s| s == STOCK_STATUS)
            .times(1)
            .returning(|_| Ok("במלאי".to_string()));
        // Consumer price renders first, trader price second.
        mock.expect_read_text_all()
            .withf(|s| s == PRICES)
            .times(1)
            .returning(|_| Ok(vec!["45.00 ₪".to_string(), "37.00 ₪".to_string()]));

        let mut scraper = TechTopScraper::new(target());
        scraper.login(&mock).await.unwrap();
        scraper.search_item(&mock, "11618").await.unwrap();
        let quote = scraper.scrape_results(&mock).await.unwrap();

        assert_eq!(quote.stock_status, "במלאי");
        assert_eq!(quote.trader_price, "37");
        assert_eq!(quote.consumer_price, "45");
    }

    #[tokio::test]
    async fn test_no_search_results_yield_sentinel() {
        let mut mock = MockAutomation::new();
        expect_login(&mut mock);
        expect_search(&mut mock, false);

        let mut scraper = TechTopScraper::new(target());
        scraper.login(&mock).await.unwrap();
        scraper.search_item(&mock, "NONEXISTENT_ITEM").await.unwrap();
        let quote = scraper.scrape_results(&mock).await.unwrap();
        assert!(quote.is_not_available());
    }

    #[tokio::test]
    async fn test_partial_price_listing_yields_sentinel() {
        let mut mock = MockAutomation::new();
        expect_login(&mut mock);
        expect_search(&mut mock, true);

        mock.expect_wait_for()
            .withf(|s, _| s == PRODUCT_PANEL)
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_read_text()
            .withf(|s| s == STOCK_STATUS)
            .times(1)
            .returning(|_| Ok("במלאי".to_string()));
        mock.expect_read_text_all()
            .withf(|s| s == PRICES)
            .times(1)
            .returning(|_| Ok(vec!["45.00 ₪".to_string()]));

        let mut scraper = TechTopScraper::new(target());
        scraper.login(&mock).await.unwrap();
        scraper.search_item(&mock, "11613").await.unwrap();
        let quote = scraper.scrape_results(&mock).await.unwrap();
        assert!(quote.is_not_available());
    }
}
