//! One scraper per retail target, behind a shared capability set.
//!
//! The per-target differences are selector strings and click order, so each
//! module keeps its selectors as constants and implements the same three
//! operations against an injected [`Automation`] handle.

mod art_studio;
mod music_center;
mod shalmon;
mod tech_top;

pub use art_studio::ArtStudioScraper;
pub use music_center::MusicCenterScraper;
pub use shalmon::ShalmonScraper;
pub use tech_top::TechTopScraper;

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::Result;
use crate::automation::Automation;
use crate::config::TargetConfig;
use crate::models::{ItemQuote, TargetId};
use crate::utils::error::AppError;

/// Shared capability set every retail target implements.
///
/// Call order is `login`, then any number of `search_item` /
/// `scrape_results` pairs; violations surface as
/// [`AppError::State`](crate::AppError::State).
#[async_trait]
pub trait SiteScraper: Send + Sync {
    fn name(&self) -> &'static str;

    /// Navigate to the login page, submit credentials, and verify a
    /// post-login marker within a bounded wait.
    async fn login(&mut self, handle: &dyn Automation) -> Result<()>;

    /// Submit an item code into the target's search flow.
    async fn search_item(&mut self, handle: &dyn Automation, item_code: &str) -> Result<()>;

    /// Extract (stock status, trader price, consumer price) for the last
    /// search. A non-matching item resolves to the sentinel triple.
    async fn scrape_results(&mut self, handle: &dyn Automation) -> Result<ItemQuote>;
}

/// Construct the scraper variant for a target.
pub fn for_target(target: TargetId, config: TargetConfig) -> Box<dyn SiteScraper> {
    match target {
        TargetId::MusicCenter => Box::new(MusicCenterScraper::new(config)),
        TargetId::ArtStudio => Box::new(ArtStudioScraper::new(config)),
        TargetId::TechTop => Box::new(TechTopScraper::new(config)),
        TargetId::Shalmon => Box::new(ShalmonScraper::new(config)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    LoggedIn,
    Searched,
}

/// Call-order tracking shared by the site scrapers.
#[derive(Debug)]
pub(crate) struct Session {
    phase: Phase,
    last_search_matched: bool,
}

impl Session {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::Created,
            last_search_matched: false,
        }
    }

    pub(crate) fn ensure_logged_in(&self) -> Result<()> {
        if self.phase == Phase::Created {
            return Err(AppError::State(
                "search_item called before login completed".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn ensure_searched(&self) -> Result<()> {
        if self.phase != Phase::Searched {
            return Err(AppError::State(
                "scrape_results called without a preceding search".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn logged_in(&mut self) {
        self.phase = Phase::LoggedIn;
    }

    pub(crate) fn searched(&mut self, matched: bool) {
        self.phase = Phase::Searched;
        self.last_search_matched = matched;
    }

    pub(crate) fn scraped(&mut self) {
        self.phase = Phase::LoggedIn;
    }

    pub(crate) fn last_search_matched(&self) -> bool {
        self.last_search_matched
    }
}

/// Wrap an automation failure in the login error kind, so raw
/// automation errors never cross the scraper boundary.
pub(crate) fn login_failure(err: AppError) -> AppError {
    match err {
        AppError::Login(_) => err,
        other => AppError::Login(other.to_string()),
    }
}

pub(crate) fn search_failure(err: AppError) -> AppError {
    match err {
        AppError::Search(_) => err,
        other => AppError::Search(other.to_string()),
    }
}

/// Resolve a finished scrape attempt: element absence means "item not
/// found" and yields the sentinel, anything deeper propagates.
pub(crate) fn resolve_scrape(attempt: Result<ItemQuote>) -> Result<ItemQuote> {
    match attempt {
        Ok(quote) => Ok(quote),
        Err(AppError::ElementNotFound { .. }) => Ok(ItemQuote::not_available()),
        Err(AppError::Scraping(message)) => Err(AppError::Scraping(message)),
        Err(other) => Err(AppError::Scraping(other.to_string())),
    }
}

static NON_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\D+").expect("digit regex"));

/// Strip currency symbols and locale artifacts, keeping digits only.
pub(crate) fn digits_only(text: &str) -> String {
    NON_DIGITS.replace_all(text, "").into_owned()
}

/// Leading integer of a rendered price: "364.00 ILS" -> "364".
pub(crate) fn leading_integer(text: &str) -> String {
    text.split(' ')
        .next()
        .unwrap_or("")
        .split('.')
        .next()
        .unwrap_or("")
        .to_string()
}
