pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use log::{info, warn};
use models::{
    analytics::PortfolioValuation,
    chart::{SeedPrices, TimeSeriesPoint},
    holdings::Holdings,
    ledger::Ledger,
    quote::{HistoryCache, QuoteRefresh, QuoteSnapshot},
    settings::Settings,
    transaction::{Instrument, Transaction},
};
use providers::{registry::QuoteProviderRegistry, traits::QuoteFeed};
use services::{
    analytics_service::AnalyticsService, cost_basis_service::CostBasisService,
    ledger_service::LedgerService, quote_resolver::QuoteResolver, quote_service::QuoteService,
    valuation_service::ValuationService,
};
use storage::manager::StorageManager;
use uuid::Uuid;

use errors::CoreError;

/// Maximum valuation-series range in days (10 years).
const MAX_SERIES_RANGE_DAYS: i64 = 3650;

/// Main entry point for the gold tracker core library.
/// Holds the ledger and all services needed to operate on it.
#[must_use]
pub struct GoldTracker {
    ledger: Ledger,
    ledger_service: LedgerService,
    cost_basis_service: CostBasisService,
    valuation_service: ValuationService,
    analytics_service: AnalyticsService,
    quote_service: QuoteService,
    /// Set when the caller installed their own providers; settings changes
    /// then leave the registry alone.
    custom_providers: bool,
    /// Tracks whether any mutation has occurred since the last save/load.
    dirty: bool,
}

impl std::fmt::Debug for GoldTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoldTracker")
            .field("transactions", &self.ledger.transactions.len())
            .field("settings", &self.ledger.settings)
            .field("quotes", &self.ledger.quotes.quotes.len())
            .field("history_points", &self.ledger.history.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl GoldTracker {
    /// Create a brand new empty ledger with default settings.
    pub fn create_new() -> Self {
        Self::build(Ledger::default())
    }

    /// Load an existing ledger from encrypted bytes (password required).
    /// Use this on wasm where the host handles file I/O.
    pub fn load_from_bytes(encrypted: &[u8], password: &str) -> Result<Self, CoreError> {
        let ledger = StorageManager::load_from_bytes(encrypted, password)?;
        Ok(Self::build(ledger))
    }

    /// Save the ledger to encrypted bytes.
    /// Clears the unsaved-changes flag on success.
    pub fn save_to_bytes(&mut self, password: &str) -> Result<Vec<u8>, CoreError> {
        let bytes = StorageManager::save_to_bytes(&self.ledger, password)?;
        self.dirty = false;
        Ok(bytes)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: &str, password: &str) -> Result<Self, CoreError> {
        let ledger = StorageManager::load_from_file(path, password)?;
        Ok(Self::build(ledger))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_file(&mut self, path: &str, password: &str) -> Result<(), CoreError> {
        StorageManager::save_to_file(&self.ledger, path, password)?;
        self.dirty = false;
        Ok(())
    }

    /// Replace the quote sources (offline mode, tests, alternative upstreams).
    pub fn with_quote_providers(mut self, registry: QuoteProviderRegistry) -> Self {
        self.quote_service = QuoteService::new(registry);
        self.custom_providers = true;
        self
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Record a transaction. Returns its id.
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<Uuid, CoreError> {
        let id = transaction.id;
        self.ledger_service.add_transaction(&mut self.ledger, transaction)?;
        self.dirty = true;
        Ok(id)
    }

    /// Record several transactions. Either all of them are added or none.
    pub fn add_transactions(&mut self, transactions: Vec<Transaction>) -> Result<Vec<Uuid>, CoreError> {
        let mut staged = Ledger {
            transactions: self.ledger.transactions.clone(),
            ..Ledger::default()
        };
        let mut ids = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            ids.push(transaction.id);
            self.ledger_service.add_transaction(&mut staged, transaction)?;
        }

        self.ledger.transactions = staged.transactions;
        if !ids.is_empty() {
            self.dirty = true;
        }
        Ok(ids)
    }

    /// Replace an existing transaction; the id is kept.
    pub fn update_transaction(&mut self, transaction_id: Uuid, updated: Transaction) -> Result<(), CoreError> {
        self.ledger_service
            .update_transaction(&mut self.ledger, transaction_id, updated)?;
        self.dirty = true;
        Ok(())
    }

    pub fn remove_transaction(&mut self, transaction_id: Uuid) -> Result<Transaction, CoreError> {
        let removed = self
            .ledger_service
            .remove_transaction(&mut self.ledger, transaction_id)?;
        self.dirty = true;
        Ok(removed)
    }

    /// Set or clear the note on a transaction.
    pub fn set_transaction_note(&mut self, transaction_id: Uuid, note: Option<String>) -> Result<(), CoreError> {
        self.ledger_service
            .set_note(&mut self.ledger, transaction_id, note)?;
        self.dirty = true;
        Ok(())
    }

    #[must_use]
    pub fn get_transaction(&self, transaction_id: Uuid) -> Option<&Transaction> {
        self.ledger.transactions.iter().find(|t| t.id == transaction_id)
    }

    /// All transactions, newest first.
    #[must_use]
    pub fn transactions(&self) -> Vec<&Transaction> {
        self.ledger_service.list_transactions(&self.ledger)
    }

    /// Transactions dated within `from..=to`, newest first.
    #[must_use]
    pub fn transactions_in_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<&Transaction> {
        self.ledger
            .transactions
            .iter()
            .rev()
            .filter(|t| t.date >= from && t.date <= to)
            .collect()
    }

    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.ledger.transactions.len()
    }

    /// Delete every transaction. Returns how many were removed.
    pub fn clear_transactions(&mut self) -> usize {
        let removed = self.ledger.transactions.len();
        if removed > 0 {
            self.ledger.transactions.clear();
            self.dirty = true;
        }
        removed
    }

    // ── Valuation ───────────────────────────────────────────────────

    /// Bucketed quantities and cost basis of the whole log.
    #[must_use]
    pub fn holdings(&self) -> Holdings {
        self.cost_basis_service.compute_holdings(&self.ledger.transactions)
    }

    /// Value, cost and profit against the last quote snapshot.
    #[must_use]
    pub fn current_valuation(&self) -> PortfolioValuation {
        self.analytics_service.current_valuation(
            &self.ledger.transactions,
            &self.ledger.quotes.quotes,
            &self.ledger.settings,
        )
    }

    /// Market buy price per chi for an instrument and brand, from the last
    /// quote snapshot.
    #[must_use]
    pub fn resolve_price_per_chi(&self, instrument: &Instrument, brand: Option<&str>) -> f64 {
        let settings = &self.ledger.settings;
        QuoteResolver::new(settings.canonical_brand.as_str()).resolve_price_per_chi(
            instrument,
            brand,
            &self.ledger.quotes.quotes,
            settings.default_price_per_chi,
        )
    }

    #[must_use]
    pub fn seed_prices(&self) -> SeedPrices {
        self.analytics_service
            .seed_prices(&self.ledger.quotes.quotes, &self.ledger.settings)
    }

    /// Portfolio value at every synced history timestamp in `from..=to`.
    ///
    /// Uses local history only; call [`GoldTracker::sync_history`] first to
    /// fill gaps. Every transaction in the log is considered, including those
    /// dated before `from`.
    pub fn valuation_series(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<TimeSeriesPoint>, CoreError> {
        let (start, end) = Self::series_bounds(from, to)?;
        let history = self.ledger.history.range(start, end);
        Ok(self
            .valuation_service
            .replay_valuation(history, &self.ledger.transactions, self.seed_prices()))
    }

    // ── Quotes ──────────────────────────────────────────────────────

    /// Fetch the current board. On failure the previous snapshot is kept
    /// and the result is [`QuoteRefresh::Stale`].
    pub async fn refresh_quotes(&mut self) -> QuoteRefresh {
        match self.quote_service.fetch_current_quotes().await {
            Ok(quotes) => {
                let count = quotes.len();
                self.ledger.quotes = QuoteSnapshot::new(quotes, Utc::now());
                self.dirty = true;
                QuoteRefresh::Fresh(count)
            }
            Err(e) => {
                warn!("Quote refresh failed, keeping previous snapshot: {e}");
                QuoteRefresh::Stale(e.to_string())
            }
        }
    }

    /// Whether the snapshot is missing or older than the refresh interval.
    #[must_use]
    pub fn quotes_need_refresh(&self, now: DateTime<Utc>) -> bool {
        let Some(fetched_at) = self.ledger.quotes.fetched_at else {
            return true;
        };
        // A snapshot stamped in the future counts as fresh.
        match now.signed_duration_since(fetched_at).to_std() {
            Ok(elapsed) => elapsed >= self.ledger.settings.quote_refresh_interval(),
            Err(_) => false,
        }
    }

    /// Fetch history for `from..=to` and merge it into the local cache.
    /// Returns the number of new points.
    pub async fn sync_history(&mut self, from: NaiveDate, to: NaiveDate) -> Result<usize, CoreError> {
        Self::series_bounds(from, to)?;
        let ceiling = self.ledger.settings.history_price_ceiling;
        let attempts = self.ledger.settings.history_refetch_attempts;

        let batch = self
            .quote_service
            .fetch_history(from, to, ceiling, attempts)
            .await?;
        let added = self.ledger.history.merge(&batch);
        if added > 0 {
            self.dirty = true;
        }
        info!("Synced history {from}..{to}: {} fetched, {added} new", batch.len());
        Ok(added)
    }

    /// Sync the configured window ending at `today`.
    pub async fn sync_recent_history(&mut self, today: NaiveDate) -> Result<usize, CoreError> {
        let window = self.ledger.settings.history_window_days.clamp(1, MAX_SERIES_RANGE_DAYS);
        let from = today - Duration::days(window);
        self.sync_history(from, today).await
    }

    #[must_use]
    pub fn quote_snapshot(&self) -> &QuoteSnapshot {
        &self.ledger.quotes
    }

    #[must_use]
    pub fn history_cache(&self) -> &HistoryCache {
        &self.ledger.history
    }

    /// Drop history points dated before `before`. Returns the number removed.
    pub fn prune_history_before(&mut self, before: NaiveDate) -> usize {
        let removed = self
            .ledger
            .history
            .prune_before(before.and_time(NaiveTime::MIN).and_utc());
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    pub fn clear_history(&mut self) {
        if !self.ledger.history.is_empty() {
            self.ledger.history.clear();
            self.dirty = true;
        }
    }

    #[must_use]
    pub fn is_provider_available(&self, feed: QuoteFeed) -> bool {
        self.quote_service.has_provider_for(feed)
    }

    #[must_use]
    pub fn get_provider_names(&self, feed: QuoteFeed) -> Vec<String> {
        self.quote_service.get_provider_names(feed)
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.ledger.settings
    }

    pub fn set_canonical_brand(&mut self, brand: impl Into<String>) -> Result<(), CoreError> {
        let brand = brand.into().trim().to_string();
        if brand.is_empty() {
            return Err(CoreError::ValidationError("Canonical brand must not be empty".into()));
        }
        self.ledger.settings.canonical_brand = brand;
        self.dirty = true;
        Ok(())
    }

    /// Replace the brand list; the default board scraper is rebuilt with the
    /// new filters.
    pub fn set_supported_brands(&mut self, brands: Vec<String>) -> Result<(), CoreError> {
        let brands: Vec<String> = brands
            .into_iter()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect();
        if brands.is_empty() {
            return Err(CoreError::ValidationError("At least one brand is required".into()));
        }
        self.ledger.settings.supported_brands = brands;
        if !self.custom_providers {
            self.quote_service = QuoteService::new(QuoteProviderRegistry::new_with_defaults(&self.ledger.settings));
        }
        self.dirty = true;
        Ok(())
    }

    pub fn set_default_price_per_chi(&mut self, price: f64) -> Result<(), CoreError> {
        if !price.is_finite() || price < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Default price must be a non-negative amount, got {price}"
            )));
        }
        self.ledger.settings.default_price_per_chi = price;
        self.dirty = true;
        Ok(())
    }

    pub fn set_history_price_ceiling(&mut self, ceiling: f64) -> Result<(), CoreError> {
        if !ceiling.is_finite() || ceiling <= 0.0 {
            return Err(CoreError::ValidationError(format!(
                "History price ceiling must be positive, got {ceiling}"
            )));
        }
        self.ledger.settings.history_price_ceiling = ceiling;
        self.dirty = true;
        Ok(())
    }

    pub fn set_history_refetch_attempts(&mut self, attempts: u32) {
        self.ledger.settings.history_refetch_attempts = attempts;
        self.dirty = true;
    }

    pub fn set_history_window_days(&mut self, days: i64) -> Result<(), CoreError> {
        if !(1..=MAX_SERIES_RANGE_DAYS).contains(&days) {
            return Err(CoreError::ValidationError(format!(
                "History window must be 1..={MAX_SERIES_RANGE_DAYS} days, got {days}"
            )));
        }
        self.ledger.settings.history_window_days = days;
        self.dirty = true;
        Ok(())
    }

    pub fn set_quote_refresh_interval_secs(&mut self, secs: u64) {
        self.ledger.settings.quote_refresh_interval_secs = secs;
        self.dirty = true;
    }

    /// Returns `true` if the ledger has been modified since the last save or load.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    // ── Export / Import ─────────────────────────────────────────────

    /// Export all transactions as a JSON array, oldest first.
    pub fn export_transactions_to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(&self.ledger.transactions)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize transactions: {e}")))
    }

    /// Export all transactions as CSV, oldest first.
    /// Columns: id, kind, instrument, brand, quantity, unit_price, total_value, date, note
    #[must_use]
    pub fn export_transactions_to_csv(&self) -> String {
        let mut csv = String::from("id,kind,instrument,brand,quantity,unit_price,total_value,date,note\n");
        for tx in &self.ledger.transactions {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{}\n",
                tx.id,
                tx.kind,
                tx.instrument,
                csv_field(tx.brand.as_deref().unwrap_or("")),
                tx.quantity,
                tx.unit_price,
                tx.total_value,
                tx.date,
                csv_field(tx.note.as_deref().unwrap_or("")),
            ));
        }
        csv
    }

    /// Import transactions from a JSON array. If any entry is invalid or
    /// duplicates an existing id, nothing is imported.
    pub fn import_transactions_from_json(&mut self, json: &str) -> Result<usize, CoreError> {
        let transactions: Vec<Transaction> = serde_json::from_str(json)?;
        let ids = self.add_transactions(transactions)?;
        Ok(ids.len())
    }

    // ── Internal ────────────────────────────────────────────────────

    /// Validate a date range and widen it to whole UTC days.
    fn series_bounds(from: NaiveDate, to: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), CoreError> {
        if from > to {
            return Err(CoreError::ValidationError(format!("Range start {from} is after end {to}")));
        }
        let days = (to - from).num_days();
        if days > MAX_SERIES_RANGE_DAYS {
            return Err(CoreError::ValidationError(format!(
                "Range of {days} days exceeds the {MAX_SERIES_RANGE_DAYS}-day limit"
            )));
        }
        let start = from.and_time(NaiveTime::MIN).and_utc();
        let end = to
            .and_hms_milli_opt(23, 59, 59, 999)
            .ok_or_else(|| CoreError::ValidationError(format!("Invalid range end {to}")))?
            .and_utc();
        Ok((start, end))
    }

    fn build(ledger: Ledger) -> Self {
        let registry = QuoteProviderRegistry::new_with_defaults(&ledger.settings);
        Self {
            ledger,
            ledger_service: LedgerService::new(),
            cost_basis_service: CostBasisService::new(),
            valuation_service: ValuationService::new(),
            analytics_service: AnalyticsService::new(),
            quote_service: QuoteService::new(registry),
            custom_providers: false,
            dirty: false,
        }
    }
}

/// Quote a CSV field when it contains a separator, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
