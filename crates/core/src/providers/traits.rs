use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::quote::{HistoryPoint, MarketQuote};

/// Kind of data a quote source can supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteFeed {
    /// Current buy/sell board
    Current,
    /// Historical price points
    History,
}

impl std::fmt::Display for QuoteFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteFeed::Current => write!(f, "current"),
            QuoteFeed::History => write!(f, "history"),
        }
    }
}

/// Trait abstraction for every market quote source.
///
/// Each upstream (a scraped price board, a price-history endpoint, a fixed
/// offline table) implements this trait. When an upstream changes its
/// markup or goes away only its implementation is replaced.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Which feeds this provider can serve.
    fn feeds(&self) -> Vec<QuoteFeed>;

    /// Current market quotes (VND per lượng).
    async fn current_quotes(&self) -> Result<Vec<MarketQuote>, CoreError>;

    /// Historical points for both instruments between two dates (inclusive),
    /// VND per lượng. Order is not guaranteed.
    async fn history(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<HistoryPoint>, CoreError>;
}
