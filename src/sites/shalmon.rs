use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{Session, SiteScraper, digits_only, login_failure, resolve_scrape, search_failure};
use crate::Result;
use crate::automation::Automation;
use crate::config::TargetConfig;
use crate::models::ItemQuote;
use crate::utils::error::AppError;

const LOGIN_PATH: &str = "/my-account";
const USERNAME_FIELD: &str = "#username";
const PASSWORD_FIELD: &str = "#password";
const LOGIN_BUTTON: &str = "button[name='login']";
const ACCOUNT_MARKER: &str = ".woocommerce-my-account-wrapper";
const SEARCH_FIELD: &str = "input[aria-label='Search']";
const SEARCH_BUTTON: &str = ".searchsubmit";
const RESULT_CARD: &str = "div.wd-product";
const FIRST_RESULT: &str = "div.wd-product a";
const STOCK_STATUS: &str = "p.stock";
// Trade customers see the discounted price in <ins> and the struck-through
// consumer price in <del>; products without a trade discount render a
// single amount.
const TRADER_PRICE: &str = "p.price ins .woocommerce-Price-amount";
const CONSUMER_PRICE: &str = "p.price del .woocommerce-Price-amount";
const SINGLE_PRICE: &str = "p.price .woocommerce-Price-amount";

const MARKER_TIMEOUT: Duration = Duration::from_secs(4);
const RESULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Scraper for the Shalmon shop (WooCommerce storefront).
pub struct ShalmonScraper {
    target: TargetConfig,
    session: Session,
}

impl ShalmonScraper {
    pub fn new(target: TargetConfig) -> Self {
        Self {
            target,
            session: Session::new(),
        }
    }
}

async fn price_or_single(handle: &dyn Automation, preferred: &str) -> Result<String> {
    match handle.read_text(preferred).await {
        Ok(text) => Ok(text),
        Err(AppError::ElementNotFound { .. }) => handle.read_text(SINGLE_PRICE).await,
        Err(other) => Err(other),
    }
}

#[async_trait]
impl SiteScraper for ShalmonScraper {
    fn name(&self) -> &'static str {
        "shalmon"
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
        handle.click(SEARCH_BUTTON).await.map_err(search_failure)?;

        let matched = match handle.wait_for(RESULT_CARD, RESULT_TIMEOUT).await {
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
            let stock_status = handle.read_text(STOCK_STATUS).await?;
            let trader_price = digits_only(&price_or_single(handle, TRADER_PRICE).await?);
            let consumer_price = digits_only(&price_or_single(handle, CONSUMER_PRICE).await?);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::MockAutomation;

    fn target() -> TargetConfig {
        TargetConfig {
            url: "https://example-shalmon.co.il".to_string(),
            username: "sh_user".to_string(),
            pwd: "sh_secret".to_string(),
        }
    }

    fn expect_login(mock: &mut MockAutomation) {
        mock.expect_open()
            .withf(|url| url == "https://example-shalmon.co.il/my-account")
            .times(1)
            .returning(|_| Ok(()));
        mock.expect_type_into()
            .withf(|s, t| s == USERNAME_FIELD && t == "sh_user")
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_type_into()
            .withf(|s, t| s == PASSWORD_FIELD && t == "sh_secret")
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_click()
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
            .withf(|s, _| s == RESULT_CARD)
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

        let mut scraper = ShalmonScraper::new(target());
        scraper.login(&mock).await.expect("login should succeed");
    }

    #[tokio::test]
    async fn test_login_failure_aborts_with_login_error() {
        let mut mock = MockAutomation::new();
        mock.expect_open().returning(|_| Ok(()));
        mock.expect_type_into().returning(|_, _| Ok(()));
        mock.expect_click().returning(|_| Ok(()));
        mock.expect_wait_for()
            .withf(|s, _| s == ACCOUNT_MARKER)
            .returning(|s, _| {
                Err(AppError::ElementNotFound {
                    selector: s.to_string(),
                })
            });

        let mut scraper = ShalmonScraper::new(target());
        let err = scraper.login(&mock).await.unwrap_err();
        assert!(matches!(err, AppError::Login(_)));
    }

    #[tokio::test]
    async fn test_scrape_reads_discounted_and_list_price() {
        let mut mock = MockAutomation::new();
        expect_login(&mut mock);
        expect_search(&mut mock, true);

        mock.expect_read_text()
            .withf(|s| s == STOCK_STATUS)
            .times(1)
            .returning(|_| Ok("במלאי".to_string()));
        mock.expect_read_text()
            .withf(|s| s == TRADER_PRICE)
            .times(1)
            .returning(|_| Ok("₪1,120".to_string()));
        mock.expect_read_text()
            .withf(|s| s == CONSUMER_PRICE)
            .times(1)
            .returning(|_| Ok("₪1,400".to_string()));

        let mut scraper = ShalmonScraper::new(target());
        scraper.login(&mock).await.unwrap();
        scraper.search_item(&mock, "AF510M OP").await.unwrap();
        let quote = scraper.scrape_results(&mock).await.unwrap();

        assert_eq!(quote.stock_status, "במלאי");
        assert_eq!(quote.trader_price, "1120");
        assert_eq!(quote.consumer_price, "1400");
    }

    #[tokio::test]
    async fn test_scrape_falls_back_to_single_price() {
        let mut mock = MockAutomation::new();
        expect_login(&mut mock);
        expect_search(&mut mock, true);

        mock.expect_read_text()
            .withf(|s| s == STOCK_STATUS)
            .times(1)
            .returning(|_| Ok("במלאי".to_string()));
        // No trade discount on this product: <ins>/<del> are absent and the
        // single rendered amount serves as both tiers.
        mock.expect_read_text()
            .withf(|s| s == TRADER_PRICE)
            .times(1)
            .returning(|s| {
                Err(AppError::ElementNotFound {
                    selector: s.to_string(),
                })
            });
        mock.expect_read_text()
            .withf(|s| s == CONSUMER_PRICE)
            .times(1)
            .returning(|s| {
                Err(AppError::ElementNotFound {
                    selector: s.to_string(),
                })
            });
        mock.expect_read_text()
            .withf(|s| s == SINGLE_PRICE)
            .times(2)
            .returning(|_| Ok("₪890".to_string()));

        let mut scraper = ShalmonScraper::new(target());
        scraper.login(&mock).await.unwrap();
        scraper.search_item(&mock, "D280").await.unwrap();
        let quote = scraper.scrape_results(&mock).await.unwrap();

        assert_eq!(quote.trader_price, "890");
        assert_eq!(quote.consumer_price, "890");
    }
}
