use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single point of the asset-value curve.
///
/// The core computes all the numbers; the chart only renders them.
/// Price fields are the raw history quotes (VND per lượng) present at this
/// instant and are `None` when the instrument had no point here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_buy: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_sell: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ring_buy: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ring_sell: Option<f64>,

    /// Liquidation value of all bar and ring holdings at this instant, VND
    pub total_value: f64,
}

/// Per-chi prices used before the first history point of an instrument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedPrices {
    pub bar: f64,
    pub ring: f64,
}

impl SeedPrices {
    pub fn new(bar: f64, ring: f64) -> Self {
        Self { bar, ring }
    }
}
