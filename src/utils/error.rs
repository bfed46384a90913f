use thiserror::Error;

/// Error taxonomy the orchestrator depends on. Raw automation-library
/// failures are wrapped into one of these at the scraper boundary.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Login failed: {0}")]
    Login(String),

    #[error("Search failed: {0}")]
    Search(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Invalid session state: {0}")]
    State(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
