use chrono::{DateTime, Utc};
use log::debug;

use crate::models::chart::{SeedPrices, TimeSeriesPoint};
use crate::models::quote::{HistoryInstrument, HistoryPoint, CHI_PER_LUONG};
use crate::models::transaction::Transaction;

/// History points sharing one timestamp, at most one quote per instrument.
#[derive(Debug, Clone, Copy)]
struct GroupedPoint {
    timestamp: DateTime<Utc>,
    bar: Option<(f64, f64)>,
    ring: Option<(f64, f64)>,
}

/// Chi held per instrument that has a history feed.
#[derive(Debug, Default, Clone, Copy)]
struct FeedQuantities {
    bar: f64,
    ring: f64,
}

impl FeedQuantities {
    fn apply(&mut self, tx: &Transaction) {
        let delta = tx.kind.direction() * tx.quantity;
        match HistoryInstrument::from_instrument(&tx.instrument) {
            Some(HistoryInstrument::Bar) => self.bar += delta,
            Some(HistoryInstrument::Ring9999) => self.ring += delta,
            None => {} // jewelry has no feed to value it against
        }
    }
}

/// Builds the historical asset-value curve.
///
/// Merges two time-ordered streams (history points and transactions) with a
/// two-pointer walk: O(points + transactions) after sorting. Prices are
/// forward-filled per instrument, never interpolated.
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    /// Replay the transaction log against historical quotes.
    ///
    /// For each distinct history timestamp:
    /// 1. Carry forward the latest non-zero buy price of each instrument
    /// 2. Apply every transaction dated at or before the timestamp
    /// 3. Value bar and ring holdings at the buy (liquidation) price
    ///
    /// `seed` supplies per-chi prices for an instrument that has no point in
    /// `history`. An empty history yields an empty series.
    pub fn replay_valuation(
        &self,
        history: &[HistoryPoint],
        transactions: &[Transaction],
        seed: SeedPrices,
    ) -> Vec<TimeSeriesPoint> {
        if history.is_empty() {
            return Vec::new();
        }

        let mut points: Vec<&HistoryPoint> = history.iter().collect();
        points.sort_by_key(|p| p.timestamp);
        let mut txs: Vec<&Transaction> = transactions.iter().collect();
        txs.sort_by_key(|t| t.date);

        let mut last_bar = Self::first_price(&points, HistoryInstrument::Bar).unwrap_or(seed.bar);
        let mut last_ring =
            Self::first_price(&points, HistoryInstrument::Ring9999).unwrap_or(seed.ring);

        let groups = Self::group_by_timestamp(&points);
        let mut quantities = FeedQuantities::default();
        let mut cursor = 0;

        // Pre-history backfill: everything bought before the curve starts.
        let first_ts = groups[0].timestamp;
        while cursor < txs.len() && txs[cursor].timestamp() < first_ts {
            quantities.apply(txs[cursor]);
            cursor += 1;
        }
        debug!(
            "Replay: {} history groups, {} transactions, {} before first point",
            groups.len(),
            txs.len(),
            cursor
        );

        let mut series = Vec::with_capacity(groups.len());
        for group in &groups {
            if let Some((buy, _)) = group.bar {
                if buy != 0.0 {
                    last_bar = buy / CHI_PER_LUONG;
                }
            }
            if let Some((buy, _)) = group.ring {
                if buy != 0.0 {
                    last_ring = buy / CHI_PER_LUONG;
                }
            }

            while cursor < txs.len() && txs[cursor].timestamp() <= group.timestamp {
                quantities.apply(txs[cursor]);
                cursor += 1;
            }

            series.push(TimeSeriesPoint {
                timestamp: group.timestamp,
                bar_buy: group.bar.map(|(buy, _)| buy),
                bar_sell: group.bar.map(|(_, sell)| sell),
                ring_buy: group.ring.map(|(buy, _)| buy),
                ring_sell: group.ring.map(|(_, sell)| sell),
                total_value: last_bar * quantities.bar + last_ring * quantities.ring,
            });
        }

        series
    }

    /// Per-chi buy price of the earliest non-zero point for `instrument`.
    fn first_price(points: &[&HistoryPoint], instrument: HistoryInstrument) -> Option<f64> {
        points
            .iter()
            .find(|p| p.instrument == instrument && p.buy != 0.0)
            .map(|p| p.buy / CHI_PER_LUONG)
    }

    /// Collapse sorted points into one entry per distinct timestamp.
    /// A later point for the same instrument and instant overwrites the earlier one.
    fn group_by_timestamp(points: &[&HistoryPoint]) -> Vec<GroupedPoint> {
        let mut groups: Vec<GroupedPoint> = Vec::new();
        for point in points {
            let needs_new = groups
                .last()
                .map_or(true, |g| g.timestamp != point.timestamp);
            if needs_new {
                groups.push(GroupedPoint {
                    timestamp: point.timestamp,
                    bar: None,
                    ring: None,
                });
            }
            if let Some(group) = groups.last_mut() {
                let quote = Some((point.buy, point.sell));
                match point.instrument {
                    HistoryInstrument::Bar => group.bar = quote,
                    HistoryInstrument::Ring9999 => group.ring = quote,
                }
            }
        }
        groups
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}
