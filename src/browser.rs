use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use scraper::{Html, Selector};
use tracing::debug;

use crate::Result;
use crate::automation::Automation;
use crate::config::BrowserConfig;
use crate::utils::error::AppError;

/// Production [`Automation`] implementation: one exclusively-owned Chrome
/// session driving one tab. The browser process is released when the
/// session is dropped, on every exit path.
pub struct ChromeSession {
    // Keeps the Chrome process alive for as long as the tab is in use.
    _browser: Browser,
    tab: Arc<Tab>,
    wait_timeout: Duration,
}

impl ChromeSession {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false) // often needed in containerized environments
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
            ])
            .build()
            .map_err(|e| AppError::Browser(format!("failed to create launch options: {e}")))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(std::path::PathBuf::from(chrome_path));
        }

        let browser = Browser::new(launch_options)
            .map_err(|e| AppError::Browser(format!("failed to launch browser: {e}")))?;
        let tab = browser
            .new_tab()
            .map_err(|e| AppError::Browser(format!("failed to create tab: {e}")))?;

        Ok(Self {
            _browser: browser,
            tab,
            wait_timeout: config.wait_timeout,
        })
    }

    /// Element lookup with the session's bounded wait; rendering is
    /// asynchronous, so an immediate miss is not conclusive.
    fn element(&self, selector: &str) -> Result<Element<'_>> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, self.wait_timeout)
            .map_err(|_| AppError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    fn page_texts(&self, selector: &str) -> Result<Vec<String>> {
        let content = self
            .tab
            .get_content()
            .map_err(|e| AppError::Browser(format!("failed to get page content: {e}")))?;

        let document = Html::parse_document(&content);
        let css_selector = Selector::parse(selector)
            .map_err(|e| AppError::Scraping(format!("invalid CSS selector '{selector}': {e:?}")))?;

        Ok(document
            .select(&css_selector)
            .map(|element| {
                element
                    .text()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .trim()
                    .to_string()
            })
            .collect())
    }
}

#[async_trait]
impl Automation for ChromeSession {
    async fn open(&self, url: &str) -> Result<()> {
        debug!(url, "navigating");
        self.tab
            .navigate_to(url)
            .map_err(|e| AppError::Browser(format!("navigation failed: {e}")))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| AppError::Browser(format!("page load failed: {e}")))?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map(|_| ())
            .map_err(|_| AppError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.element(selector)?
            .click()
            .map_err(|e| AppError::Browser(format!("click on '{selector}' failed: {e}")))?;
        Ok(())
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<()> {
        self.type_into_nth(selector, 0, text).await
    }

    async fn type_into_nth(&self, selector: &str, index: usize, text: &str) -> Result<()> {
        // Wait until the selector matches at all, then pick the indexed hit.
        self.element(selector)?;
        let elements = self
            .tab
            .find_elements(selector)
            .map_err(|_| AppError::ElementNotFound {
                selector: selector.to_string(),
            })?;
        let element = elements
            .into_iter()
            .nth(index)
            .ok_or_else(|| AppError::ElementNotFound {
                selector: format!("{selector} (match {index})"),
            })?;

        element
            .click()
            .map_err(|e| AppError::Browser(format!("focus on '{selector}' failed: {e}")))?;
        // Clear any prefilled value before typing.
        element
            .call_js_fn("function() { this.value = ''; }", vec![], false)
            .map_err(|e| AppError::Browser(format!("clear of '{selector}' failed: {e}")))?;
        element
            .type_into(text)
            .map_err(|e| AppError::Browser(format!("typing into '{selector}' failed: {e}")))?;
        Ok(())
    }

    async fn submit(&self, selector: &str) -> Result<()> {
        self.element(selector)?
            .focus()
            .map_err(|e| AppError::Browser(format!("focus on '{selector}' failed: {e}")))?;
        self.tab
            .press_key("Enter")
            .map_err(|e| AppError::Browser(format!("submit of '{selector}' failed: {e}")))?;
        Ok(())
    }

    async fn read_text(&self, selector: &str) -> Result<String> {
        self.element(selector)?;
        self.page_texts(selector)?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    async fn read_text_all(&self, selector: &str) -> Result<Vec<String>> {
        self.element(selector)?;
        self.page_texts(selector)
    }
}
