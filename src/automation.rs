use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// The narrow surface the site scrapers consume from the browser
/// collaborator. Anything implementing this can drive a scraper, which
/// keeps the site flows testable against a scripted fake.
///
/// Element-addressing methods take CSS selectors and apply a bounded wait
/// before concluding an element is absent, surfacing
/// [`AppError::ElementNotFound`](crate::AppError::ElementNotFound).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Automation: Send + Sync {
    /// Navigate to a URL and wait for the page to load.
    async fn open(&self, url: &str) -> Result<()>;

    /// Wait until an element is present, up to `timeout`.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()>;

    async fn click(&self, selector: &str) -> Result<()>;

    /// Clear the first element matching `selector`, then type `text` into it.
    async fn type_into(&self, selector: &str, text: &str) -> Result<()>;

    /// Indexed variant for pages where one selector matches several inputs.
    async fn type_into_nth(&self, selector: &str, index: usize, text: &str) -> Result<()>;

    /// Send the Enter key to an element.
    async fn submit(&self, selector: &str) -> Result<()>;

    /// Text content of the first element matching `selector`.
    async fn read_text(&self, selector: &str) -> Result<String>;

    /// Text content of every element matching `selector`, in document order.
    async fn read_text_all(&self, selector: &str) -> Result<Vec<String>>;
}
