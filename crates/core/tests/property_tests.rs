//! Property-based tests for the valuation engines.
//!
//! Random transaction logs and quote boards, checked against invariants that
//! must hold for every valid input.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

use gold_tracker_core::models::chart::SeedPrices;
use gold_tracker_core::models::quote::{HistoryInstrument, HistoryPoint, MarketQuote};
use gold_tracker_core::models::transaction::{Instrument, Transaction, TransactionKind};
use gold_tracker_core::services::cost_basis_service::CostBasisService;
use gold_tracker_core::services::quote_resolver::QuoteResolver;
use gold_tracker_core::services::valuation_service::ValuationService;

// =============================================================================
// Generators
// =============================================================================

fn arb_kind() -> impl Strategy<Value = TransactionKind> {
    prop_oneof![
        3 => Just(TransactionKind::Buy),
        2 => Just(TransactionKind::Sell),
        1 => Just(TransactionKind::GiftIn),
        1 => Just(TransactionKind::GiftOut),
    ]
}

fn arb_instrument() -> impl Strategy<Value = Instrument> {
    prop_oneof![
        Just(Instrument::Bar),
        Just(Instrument::Ring9999),
        Just(Instrument::Jewelry),
    ]
}

/// (kind, instrument, whole chi, price per chi in thousands)
fn arb_entry() -> impl Strategy<Value = (TransactionKind, Instrument, u32, u32)> {
    (arb_kind(), arb_instrument(), 1u32..20, 5_000u32..9_000)
}

fn build(kind: TransactionKind, instrument: Instrument, qty: u32, price: u32, date: NaiveDate) -> Transaction {
    let unit_price = if kind.is_gift() { 0.0 } else { f64::from(price) * 1000.0 };
    Transaction::new(kind, instrument, None, f64::from(qty), unit_price, date)
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
}

/// A log where every entry has its own date.
fn arb_distinct_day_log(max: usize) -> impl Strategy<Value = Vec<Transaction>> {
    proptest::collection::vec(arb_entry(), 0..=max).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (kind, inst, qty, price))| {
                build(kind, inst, qty, price, base_date() + Duration::days(i as i64))
            })
            .collect()
    })
}

/// A log where dates repeat freely.
fn arb_log(max: usize) -> impl Strategy<Value = Vec<Transaction>> {
    proptest::collection::vec((arb_entry(), 0i64..30), 0..=max).prop_map(|entries| {
        entries
            .into_iter()
            .map(|((kind, inst, qty, price), day)| {
                build(kind, inst, qty, price, base_date() + Duration::days(day))
            })
            .collect()
    })
}

/// Daily bar and ring points over 20 days, buy in whole million VND per lượng.
fn arb_history() -> impl Strategy<Value = Vec<HistoryPoint>> {
    proptest::collection::vec((0i64..20, prop::bool::ANY, 60u32..90), 1..40).prop_map(|raw| {
        raw.into_iter()
            .map(|(day, is_bar, millions)| {
                let ts = Utc.with_ymd_and_hms(2023, 1, 10, 0, 0, 0).unwrap() + Duration::days(day);
                let instrument = if is_bar {
                    HistoryInstrument::Bar
                } else {
                    HistoryInstrument::Ring9999
                };
                let buy = f64::from(millions) * 1_000_000.0;
                HistoryPoint::new(ts, instrument, buy, buy + 2_000_000.0)
            })
            .collect()
    })
}

fn arb_board() -> impl Strategy<Value = Vec<MarketQuote>> {
    let brand = prop_oneof![Just("SJC"), Just("DOJI"), Just("PNJ"), Just("Phú Quý")];
    let form = prop_oneof![Just("Miếng"), Just("Nhẫn")];
    proptest::collection::vec((brand, form, 0u32..90), 0..8).prop_map(|raw| {
        raw.into_iter()
            .map(|(brand, form, millions)| {
                let buy = f64::from(millions) * 1_000_000.0;
                MarketQuote::new(format!("{brand} ({form})"), buy, buy, "")
            })
            .collect()
    })
}

// =============================================================================
// Cost basis
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Buckets are never negative after the final clamp.
    #[test]
    fn prop_holdings_never_negative(log in arb_log(40)) {
        let h = CostBasisService::new().compute_holdings(&log);
        prop_assert!(h.invested.quantity >= 0.0);
        prop_assert!(h.invested.cost >= -1e-6);
        prop_assert!(h.gifted.quantity >= 0.0);
        prop_assert_eq!(h.total_quantity, h.invested.quantity + h.gifted.quantity);
        prop_assert_eq!(h.total_invested, h.invested.cost);
    }

    /// When every entry has its own date, input order is irrelevant.
    #[test]
    fn prop_holdings_ignore_input_order(
        (log, shuffled) in arb_distinct_day_log(30)
            .prop_flat_map(|log| (Just(log.clone()), Just(log).prop_shuffle()))
    ) {
        let svc = CostBasisService::new();
        prop_assert_eq!(svc.compute_holdings(&log), svc.compute_holdings(&shuffled));
    }

    /// Without sells or gifts out, the invested bucket is exactly the sum of buys.
    #[test]
    fn prop_buys_only_sum_up(log in arb_log(30)) {
        let buys: Vec<Transaction> = log.into_iter().filter(|t| t.kind == TransactionKind::Buy).collect();
        let h = CostBasisService::new().compute_holdings(&buys);
        let qty: f64 = buys.iter().map(|t| t.quantity).sum();
        let cost: f64 = buys.iter().map(|t| t.total_value).sum();
        prop_assert!((h.invested.quantity - qty).abs() < 1e-9);
        prop_assert!((h.invested.cost - cost).abs() < 1e-3);
        prop_assert!(h.warnings.is_empty());
    }
}

// =============================================================================
// Valuation replay
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Quantities are whole chi, so any input order sums to the same values.
    #[test]
    fn prop_replay_ignores_transaction_order(
        history in arb_history(),
        (log, shuffled) in arb_log(30).prop_flat_map(|log| (Just(log.clone()), Just(log).prop_shuffle()))
    ) {
        let svc = ValuationService::new();
        let seed = SeedPrices::new(8_000_000.0, 7_000_000.0);
        prop_assert_eq!(
            svc.replay_valuation(&history, &log, seed),
            svc.replay_valuation(&history, &shuffled, seed)
        );
    }

    /// One output point per distinct history timestamp, in ascending order.
    #[test]
    fn prop_replay_one_point_per_timestamp(history in arb_history(), log in arb_log(20)) {
        let series = ValuationService::new().replay_valuation(&history, &log, SeedPrices::default());
        let mut stamps: Vec<_> = history.iter().map(|p| p.timestamp).collect();
        stamps.sort();
        stamps.dedup();
        let emitted: Vec<_> = series.iter().map(|p| p.timestamp).collect();
        prop_assert_eq!(emitted, stamps);
    }

    /// With no outflows, the curve is never negative.
    #[test]
    fn prop_replay_inflows_non_negative(history in arb_history(), log in arb_log(20)) {
        let inflows: Vec<Transaction> = log
            .into_iter()
            .filter(|t| t.kind.direction() > 0.0)
            .collect();
        let series = ValuationService::new().replay_valuation(&history, &inflows, SeedPrices::default());
        prop_assert!(series.iter().all(|p| p.total_value >= 0.0));
    }
}

// =============================================================================
// Quote resolver
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// The price is always the default or a non-zero quote's buy / 10.
    #[test]
    fn prop_resolution_comes_from_board_or_default(
        quotes in arb_board(),
        instrument in arb_instrument(),
        brand in prop::option::of(prop_oneof![Just("SJC"), Just("DOJI"), Just("Mi Hồng")]),
    ) {
        let default = 1.0;
        let r = QuoteResolver::new("SJC").resolve(&instrument, brand, &quotes, default);
        if r.is_default() {
            prop_assert_eq!(r.price_per_chi, default);
        } else {
            prop_assert!(quotes.iter().any(|q| q.buy != 0.0 && q.buy_per_chi() == r.price_per_chi));
        }
    }

    /// Adding quotes for another form never changes a resolution.
    #[test]
    fn prop_other_form_quotes_are_ignored(quotes in arb_board(), millions in 1u32..90) {
        let bars: Vec<MarketQuote> = quotes.iter().filter(|q| q.label.contains("Miếng")).cloned().collect();
        let mut with_rings = bars.clone();
        let buy = f64::from(millions) * 1_000_000.0;
        with_rings.insert(0, MarketQuote::new("SJC (Nhẫn)", buy, buy, ""));

        let resolver = QuoteResolver::new("SJC");
        prop_assert_eq!(
            resolver.resolve(&Instrument::Bar, Some("DOJI"), &bars, 0.0),
            resolver.resolve(&Instrument::Bar, Some("DOJI"), &with_rings, 0.0)
        );
    }
}
