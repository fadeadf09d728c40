use crate::models::settings::Settings;

use super::giavang::GiaVangProvider;
use super::sjc::SjcHistoryProvider;
use super::static_provider::StaticQuoteProvider;
use super::traits::{QuoteFeed, QuoteProvider};

/// Registry of all available quote providers.
///
/// Providers are tried in registration order; the first one to answer wins.
pub struct QuoteProviderRegistry {
    providers: Vec<Box<dyn QuoteProvider>>,
}

impl QuoteProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with the default upstreams.
    pub fn new_with_defaults(settings: &Settings) -> Self {
        let mut registry = Self::new();

        // giavang.org: current board for all major brands, no key needed
        registry.register(Box::new(GiaVangProvider::new(settings.supported_brands.clone())));

        // sjc.com.vn: bar and ring price history, no key needed
        registry.register(Box::new(SjcHistoryProvider::new()));

        // fixed SJC board, only reached when every live current source failed
        registry.register(Box::new(StaticQuoteProvider::reference_board()));

        registry
    }

    /// Register a new provider at the lowest priority.
    pub fn register(&mut self, provider: Box<dyn QuoteProvider>) {
        self.providers.push(provider);
    }

    /// Find the first provider that serves the given feed.
    pub fn get_provider_for(&self, feed: QuoteFeed) -> Option<&dyn QuoteProvider> {
        self.providers
            .iter()
            .find(|p| p.feeds().contains(&feed))
            .map(|p| p.as_ref())
    }

    /// All providers serving the given feed, in priority order (for fallback).
    pub fn get_providers_for(&self, feed: QuoteFeed) -> Vec<&dyn QuoteProvider> {
        self.providers
            .iter()
            .filter(|p| p.feeds().contains(&feed))
            .map(|p| p.as_ref())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for QuoteProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
