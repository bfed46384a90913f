use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One scraped quote: availability plus the two price tiers a trade
/// customer sees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemQuote {
    pub stock_status: String,
    pub trader_price: String,
    pub consumer_price: String,
}

impl ItemQuote {
    pub const NOT_AVAILABLE: &'static str = "N/A";

    /// Sentinel for "item not found" — distinct from a scrape error.
    pub fn not_available() -> Self {
        Self {
            stock_status: Self::NOT_AVAILABLE.to_string(),
            trader_price: Self::NOT_AVAILABLE.to_string(),
            consumer_price: Self::NOT_AVAILABLE.to_string(),
        }
    }

    pub fn is_not_available(&self) -> bool {
        self.stock_status == Self::NOT_AVAILABLE
            && self.trader_price == Self::NOT_AVAILABLE
            && self.consumer_price == Self::NOT_AVAILABLE
    }
}

/// The retail targets this tool knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum TargetId {
    MusicCenter,
    ArtStudio,
    TechTop,
    Shalmon,
}

impl TargetId {
    /// INI section holding this target's url and credentials.
    pub fn section(&self) -> &'static str {
        match self {
            TargetId::MusicCenter => "music_center",
            TargetId::ArtStudio => "art_studio",
            TargetId::TechTop => "tech_top",
            TargetId::Shalmon => "shalmon",
        }
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_available_sentinel() {
        let quote = ItemQuote::not_available();
        assert_eq!(quote.stock_status, "N/A");
        assert_eq!(quote.trader_price, "N/A");
        assert_eq!(quote.consumer_price, "N/A");
        assert!(quote.is_not_available());
    }

    #[test]
    fn test_partial_quote_is_not_sentinel() {
        let quote = ItemQuote {
            stock_status: "In stock".to_string(),
            trader_price: ItemQuote::NOT_AVAILABLE.to_string(),
            consumer_price: ItemQuote::NOT_AVAILABLE.to_string(),
        };
        assert!(!quote.is_not_available());
    }

    #[test]
    fn test_target_sections() {
        assert_eq!(TargetId::MusicCenter.section(), "music_center");
        assert_eq!(TargetId::ArtStudio.section(), "art_studio");
        assert_eq!(TargetId::TechTop.section(), "tech_top");
        assert_eq!(TargetId::Shalmon.section(), "shalmon");
    }

    #[test]
    fn test_target_display_matches_section() {
        assert_eq!(TargetId::TechTop.to_string(), "tech_top");
    }
}
