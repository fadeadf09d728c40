use chrono::NaiveDate;
use log::{info, warn};

use crate::errors::CoreError;
use crate::models::quote::{HistoryPoint, MarketQuote};
use crate::providers::registry::QuoteProviderRegistry;
use crate::providers::traits::QuoteFeed;

/// Fetches quotes from the registered providers with automatic fallback.
///
/// - **Current board**: first provider returning a non-empty board wins.
/// - **History**: a batch containing any price above the sanity ceiling is a
///   corrupted scrape; it is discarded and fetched again, then the next
///   provider is tried.
///
/// The valuation engine trusts whatever this service hands it; all upstream
/// validation happens here.
pub struct QuoteService {
    registry: QuoteProviderRegistry,
}

impl QuoteService {
    pub fn new(registry: QuoteProviderRegistry) -> Self {
        Self { registry }
    }

    /// Check if at least one provider serves the given feed.
    pub fn has_provider_for(&self, feed: QuoteFeed) -> bool {
        self.registry.get_provider_for(feed).is_some()
    }

    /// Names of all providers serving the given feed, in priority order.
    pub fn get_provider_names(&self, feed: QuoteFeed) -> Vec<String> {
        self.registry
            .get_providers_for(feed)
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Fetch the current quote board.
    ///
    /// Tries providers in registration order. An empty board counts as a
    /// failure so the next provider gets a chance.
    pub async fn fetch_current_quotes(&self) -> Result<Vec<MarketQuote>, CoreError> {
        let providers = self.registry.get_providers_for(QuoteFeed::Current);
        if providers.is_empty() {
            return Err(CoreError::NoProvider(QuoteFeed::Current.to_string()));
        }

        let mut last_error = None;
        for provider in &providers {
            match provider.current_quotes().await {
                Ok(quotes) if !quotes.is_empty() => {
                    info!("{}: {} current quotes", provider.name(), quotes.len());
                    return Ok(quotes);
                }
                Ok(_) => {
                    warn!("{} returned an empty board", provider.name());
                    last_error = Some(CoreError::Api {
                        provider: provider.name().to_string(),
                        message: "No quotes returned".into(),
                    });
                }
                Err(e) => {
                    warn!("{} failed: {e}", provider.name());
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::NoProvider(QuoteFeed::Current.to_string())))
    }

    /// Fetch history points for `from..=to`, sorted by timestamp.
    ///
    /// Each provider gets `1 + refetch_attempts` tries to deliver a batch that
    /// passes the sanity ceiling.
    pub async fn fetch_history(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        ceiling: f64,
        refetch_attempts: u32,
    ) -> Result<Vec<HistoryPoint>, CoreError> {
        let providers = self.registry.get_providers_for(QuoteFeed::History);
        if providers.is_empty() {
            return Err(CoreError::NoProvider(QuoteFeed::History.to_string()));
        }

        let mut last_error = None;
        for provider in &providers {
            for attempt in 0..=refetch_attempts {
                let mut batch = match provider.history(from, to).await {
                    Ok(batch) => batch,
                    Err(e) => {
                        warn!("{} history failed: {e}", provider.name());
                        last_error = Some(e);
                        break; // transport errors go straight to the next provider
                    }
                };

                match Self::check_ceiling(provider.name(), &batch, ceiling) {
                    Ok(()) => {
                        batch.sort_by_key(|p| p.timestamp);
                        info!("{}: {} history points {from}..{to}", provider.name(), batch.len());
                        return Ok(batch);
                    }
                    Err(e) => {
                        warn!("Discarding history batch (attempt {}): {e}", attempt + 1);
                        last_error = Some(e);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::NoProvider(QuoteFeed::History.to_string())))
    }

    /// Reject a batch whose buy or sell exceeds `ceiling` or is not a finite number.
    pub fn check_ceiling(provider: &str, batch: &[HistoryPoint], ceiling: f64) -> Result<(), CoreError> {
        let offending = batch
            .iter()
            .flat_map(|p| [p.buy, p.sell])
            .find(|v| !v.is_finite() || *v > ceiling);

        match offending {
            Some(value) => Err(CoreError::HistoryRejected {
                provider: provider.to_string(),
                value,
                ceiling,
            }),
            None => Ok(()),
        }
    }
}
