use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Brands offered when recording a transaction; also the row filter for the
/// market board scrape.
pub const SUPPORTED_BRANDS: [&str; 8] = [
    "SJC",
    "DOJI",
    "PNJ",
    "Bảo Tín Minh Châu",
    "Bảo Tín Mạnh Hải",
    "Phú Quý",
    "Mi Hồng",
    "Ngọc Thẩm",
];

/// User-configurable settings, stored inside the encrypted ledger file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Reference brand used when a transaction has none and as the second
    /// step of quote matching.
    pub canonical_brand: String,

    pub supported_brands: Vec<String>,

    /// Price per chi used when no quote matches (0 = "no price").
    pub default_price_per_chi: f64,

    /// Any history buy/sell above this (VND per lượng) marks the batch as a
    /// corrupted scrape.
    pub history_price_ceiling: f64,

    /// How many times a rejected history batch is fetched again before giving up.
    pub history_refetch_attempts: u32,

    /// Range synced when the caller does not pick one.
    pub history_window_days: i64,

    /// How long a quote snapshot stays fresh.
    pub quote_refresh_interval_secs: u64,
}

impl Settings {
    pub fn quote_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.quote_refresh_interval_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            canonical_brand: "SJC".to_string(),
            supported_brands: SUPPORTED_BRANDS.iter().map(|b| b.to_string()).collect(),
            default_price_per_chi: 0.0,
            history_price_ceiling: 1_000_000_000.0,
            history_refetch_attempts: 1,
            history_window_days: 30,
            quote_refresh_interval_secs: 60,
        }
    }
}
