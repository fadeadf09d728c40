use std::collections::BTreeMap;

use crate::models::analytics::{BucketKind, BucketValuation, PortfolioValuation, PositionValuation};
use crate::models::chart::SeedPrices;
use crate::models::quote::MarketQuote;
use crate::models::settings::Settings;
use crate::models::transaction::{Instrument, Transaction, TransactionKind};
use crate::services::cost_basis_service::CostBasisService;
use crate::services::quote_resolver::QuoteResolver;

/// Net chi per (instrument, brand) in each bucket, deterministic order.
type PositionMap = BTreeMap<(Instrument, String), f64>;

/// Values current holdings against a snapshot of market quotes.
///
/// Quantities are netted per (instrument, brand) so each position is priced
/// with its own brand's quote; cost comes from the cost-basis replay.
pub struct AnalyticsService {
    cost_basis_service: CostBasisService,
}

impl AnalyticsService {
    pub fn new() -> Self {
        Self {
            cost_basis_service: CostBasisService::new(),
        }
    }

    /// Compute the current value, cost and profit of both buckets.
    ///
    /// - Invested positions: buys minus sells of that (instrument, brand)
    /// - Gifted positions: gifts received minus gifts given
    /// - Only positions with a positive quantity are valued
    /// - Unmatched positions use `settings.default_price_per_chi`
    pub fn current_valuation(
        &self,
        transactions: &[Transaction],
        quotes: &[MarketQuote],
        settings: &Settings,
    ) -> PortfolioValuation {
        let resolver = QuoteResolver::new(settings.canonical_brand.as_str());
        let holdings = self.cost_basis_service.compute_holdings(transactions);

        let mut invested_positions = PositionMap::new();
        let mut gifted_positions = PositionMap::new();
        for tx in transactions {
            let key = (
                tx.instrument.clone(),
                tx.brand_or(&settings.canonical_brand).to_string(),
            );
            let delta = tx.kind.direction() * tx.quantity;
            match tx.kind {
                TransactionKind::Buy | TransactionKind::Sell => {
                    *invested_positions.entry(key).or_insert(0.0) += delta
                }
                TransactionKind::GiftIn | TransactionKind::GiftOut => {
                    *gifted_positions.entry(key).or_insert(0.0) += delta
                }
            }
        }

        let mut positions = Vec::new();
        let invested_value = Self::value_positions(
            &resolver,
            BucketKind::Invested,
            &invested_positions,
            quotes,
            settings.default_price_per_chi,
            &mut positions,
        );
        let gifted_value = Self::value_positions(
            &resolver,
            BucketKind::Gifted,
            &gifted_positions,
            quotes,
            settings.default_price_per_chi,
            &mut positions,
        );

        let invested = Self::bucket(holdings.invested.quantity, holdings.invested.cost, invested_value);
        let gifted = Self::bucket(holdings.gifted.quantity, 0.0, gifted_value);
        let total_value = invested_value + gifted_value;

        PortfolioValuation {
            invested,
            gifted,
            total_value,
            total_invested: holdings.total_invested,
            profit_loss: total_value - holdings.total_invested,
            positions,
        }
    }

    /// Per-chi prices to seed the valuation curve with: the canonical brand's
    /// bar and ring quotes, through the usual fallback chain.
    pub fn seed_prices(&self, quotes: &[MarketQuote], settings: &Settings) -> SeedPrices {
        let resolver = QuoteResolver::new(settings.canonical_brand.as_str());
        SeedPrices {
            bar: resolver.resolve_price_per_chi(
                &Instrument::Bar,
                None,
                quotes,
                settings.default_price_per_chi,
            ),
            ring: resolver.resolve_price_per_chi(
                &Instrument::Ring9999,
                None,
                quotes,
                settings.default_price_per_chi,
            ),
        }
    }

    fn value_positions(
        resolver: &QuoteResolver,
        bucket: BucketKind,
        map: &PositionMap,
        quotes: &[MarketQuote],
        default_price: f64,
        out: &mut Vec<PositionValuation>,
    ) -> f64 {
        let mut total = 0.0;
        for ((instrument, brand), quantity) in map {
            if *quantity <= 0.0 {
                continue;
            }
            let resolution = resolver.resolve(instrument, Some(brand), quotes, default_price);
            let value = quantity * resolution.price_per_chi;
            total += value;
            out.push(PositionValuation {
                bucket,
                instrument: instrument.clone(),
                brand: brand.clone(),
                quantity: *quantity,
                price_per_chi: resolution.price_per_chi,
                value,
                matched_by: resolution.stage,
            });
        }
        total
    }

    fn bucket(quantity: f64, cost: f64, current_value: f64) -> BucketValuation {
        let profit_loss = current_value - cost;
        BucketValuation {
            quantity,
            cost,
            current_value,
            profit_loss,
            return_pct: if cost > 0.0 {
                (profit_loss / cost) * 100.0
            } else {
                0.0
            },
        }
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new()
    }
}
