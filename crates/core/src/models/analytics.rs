use serde::{Deserialize, Serialize};

use super::transaction::Instrument;
use crate::services::quote_resolver::MatchStage;

/// Which bucket a valued position belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BucketKind {
    Invested,
    Gifted,
}

/// Current value of one (instrument, brand) position in one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionValuation {
    pub bucket: BucketKind,
    pub instrument: Instrument,
    /// Brand after defaulting to the canonical one
    pub brand: String,
    /// Chi held
    pub quantity: f64,
    /// Resolved market buy price, VND per chi
    pub price_per_chi: f64,
    /// quantity × price_per_chi
    pub value: f64,
    /// Fallback stage that produced the price; `None` means the default was used
    pub matched_by: Option<MatchStage>,
}

/// Totals for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketValuation {
    pub quantity: f64,
    /// Cost basis (always zero for the gifted bucket)
    pub cost: f64,
    pub current_value: f64,
    /// current_value - cost
    pub profit_loss: f64,
    /// profit_loss / cost × 100, or 0 when there is no cost
    pub return_pct: f64,
}

/// Current valuation of the whole portfolio against a quote snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioValuation {
    pub invested: BucketValuation,
    pub gifted: BucketValuation,
    pub total_value: f64,
    pub total_invested: f64,
    /// total_value - total_invested
    pub profit_loss: f64,
    pub positions: Vec<PositionValuation>,
}
