use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::quote::{HistoryPoint, MarketQuote};
use super::traits::{QuoteFeed, QuoteProvider};

/// `updated` stamp carried by every reference-board quote.
pub const REFERENCE_STAMP: &str = "reference";

/// Serves a fixed quote board and history, for offline use or as the
/// lowest-priority fallback behind the live scrapers.
pub struct StaticQuoteProvider {
    name: String,
    quotes: Vec<MarketQuote>,
    history: Vec<HistoryPoint>,
}

impl StaticQuoteProvider {
    pub fn new(name: impl Into<String>, quotes: Vec<MarketQuote>, history: Vec<HistoryPoint>) -> Self {
        Self {
            name: name.into(),
            quotes,
            history,
        }
    }

    /// Reference board used when every live source is down.
    /// Registered last by `QuoteProviderRegistry::new_with_defaults`.
    pub fn reference_board() -> Self {
        Self::new(
            "reference-board",
            vec![
                MarketQuote::new("SJC (Miếng)", 82_500_000.0, 84_500_000.0, REFERENCE_STAMP),
                MarketQuote::new("SJC (Nhẫn)", 75_500_000.0, 77_000_000.0, REFERENCE_STAMP),
            ],
            Vec::new(),
        )
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl QuoteProvider for StaticQuoteProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn feeds(&self) -> Vec<QuoteFeed> {
        let mut feeds = Vec::new();
        if !self.quotes.is_empty() {
            feeds.push(QuoteFeed::Current);
        }
        if !self.history.is_empty() {
            feeds.push(QuoteFeed::History);
        }
        feeds
    }

    async fn current_quotes(&self) -> Result<Vec<MarketQuote>, CoreError> {
        Ok(self.quotes.clone())
    }

    async fn history(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<HistoryPoint>, CoreError> {
        let mut points: Vec<HistoryPoint> = self
            .history
            .iter()
            .filter(|p| {
                let day = p.timestamp.date_naive();
                day >= from && day <= to
            })
            .cloned()
            .collect();
        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }
}
