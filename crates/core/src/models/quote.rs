use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::transaction::Instrument;

/// Number of chi in one lượng. Market quotes are per lượng, ledger prices per chi.
pub const CHI_PER_LUONG: f64 = 10.0;

/// A current market quote as scraped from the upstream board.
///
/// `label` encodes brand and form together ("SJC (Miếng)", "PNJ (Nhẫn)");
/// it is matched by substring containment, never parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub label: String,

    /// Price the shop pays the customer, VND per lượng
    pub buy: f64,

    /// Price the shop charges the customer, VND per lượng
    pub sell: f64,

    /// Upstream "last updated" text, display only
    pub updated: String,
}

impl MarketQuote {
    pub fn new(label: impl Into<String>, buy: f64, sell: f64, updated: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            buy,
            sell,
            updated: updated.into(),
        }
    }

    /// Buy price converted to VND per chi.
    pub fn buy_per_chi(&self) -> f64 {
        self.buy / CHI_PER_LUONG
    }
}

/// Instruments that have a historical price feed. Jewelry has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HistoryInstrument {
    #[serde(rename = "bar")]
    Bar,
    #[serde(rename = "ring_9999")]
    Ring9999,
}

impl HistoryInstrument {
    /// Map a ledger instrument onto its history feed, if it has one.
    pub fn from_instrument(instrument: &Instrument) -> Option<Self> {
        match instrument {
            Instrument::Bar => Some(HistoryInstrument::Bar),
            Instrument::Ring9999 => Some(HistoryInstrument::Ring9999),
            _ => None,
        }
    }
}

impl std::fmt::Display for HistoryInstrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryInstrument::Bar => write!(f, "bar"),
            HistoryInstrument::Ring9999 => write!(f, "ring_9999"),
        }
    }
}

/// One historical quote for one instrument at one instant (VND per lượng).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub instrument: HistoryInstrument,
    pub buy: f64,
    pub sell: f64,
}

impl HistoryPoint {
    pub fn new(timestamp: DateTime<Utc>, instrument: HistoryInstrument, buy: f64, sell: f64) -> Self {
        Self {
            timestamp,
            instrument,
            buy,
            sell,
        }
    }

    fn key(&self) -> (DateTime<Utc>, HistoryInstrument) {
        (self.timestamp, self.instrument)
    }
}

/// Last successfully fetched set of current quotes.
/// Kept so the dashboard still values holdings when the scrape fails.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub quotes: Vec<MarketQuote>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl QuoteSnapshot {
    pub fn new(quotes: Vec<MarketQuote>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            quotes,
            fetched_at: Some(fetched_at),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

/// Outcome of a quote refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteRefresh {
    /// A new board with this many quotes replaced the snapshot.
    Fresh(usize),
    /// Every source failed; the previous snapshot is still in use.
    Stale(String),
}

/// Local copy of synced history points, sorted by `(timestamp, instrument)`.
///
/// A point for the same instrument and instant replaces the previous one,
/// so re-syncing an overlapping range is idempotent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryCache {
    points: Vec<HistoryPoint>,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// All cached points in `(timestamp, instrument)` order.
    pub fn points(&self) -> &[HistoryPoint] {
        &self.points
    }

    /// Insert or replace a point, keeping sort order.
    pub fn upsert(&mut self, point: HistoryPoint) {
        match self.points.binary_search_by_key(&point.key(), |p| p.key()) {
            Ok(idx) => self.points[idx] = point,
            Err(idx) => self.points.insert(idx, point),
        }
    }

    /// Merge a fetched batch. Returns how many points were new.
    pub fn merge(&mut self, batch: &[HistoryPoint]) -> usize {
        let before = self.points.len();
        for point in batch {
            self.upsert(point.clone());
        }
        self.points.len() - before
    }

    /// Points with `from <= timestamp <= to`.
    pub fn range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> &[HistoryPoint] {
        let start = self.points.partition_point(|p| p.timestamp < from);
        let end = self.points.partition_point(|p| p.timestamp <= to);
        if start >= end {
            return &[];
        }
        &self.points[start..end]
    }

    /// Drop every point older than `before`. Returns the number removed.
    pub fn prune_before(&mut self, before: DateTime<Utc>) -> usize {
        let split = self.points.partition_point(|p| p.timestamp < before);
        self.points.drain(..split);
        split
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&HistoryPoint> {
        self.points.last()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
