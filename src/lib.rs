pub mod automation;
pub mod browser;
pub mod config;
pub mod models;
pub mod runner;
pub mod sites;
pub mod utils;

// Re-export commonly used types
pub use automation::Automation;
pub use models::{ItemQuote, TargetId};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
