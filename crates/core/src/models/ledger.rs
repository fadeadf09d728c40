use serde::{Deserialize, Serialize};

use super::quote::{HistoryCache, QuoteSnapshot};
use super::settings::Settings;
use super::transaction::Transaction;

/// The main data container. Everything in here gets serialized,
/// encrypted, and saved to the portable .gldg file.
///
/// Contains the transaction log, user settings, the last known market quotes
/// and the synced price history (so charts work offline).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// All transactions, oldest first; same-day entries in insertion order
    pub transactions: Vec<Transaction>,

    pub settings: Settings,

    /// Last successful current-quote fetch
    pub quotes: QuoteSnapshot,

    /// Synced history points for both instruments
    pub history: HistoryCache,
}
