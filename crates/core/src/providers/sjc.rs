use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::quote::{HistoryInstrument, HistoryPoint, MarketQuote};
use super::traits::{QuoteFeed, QuoteProvider};

const SERVICE_URL: &str = "https://sjc.com.vn/GoldPrice/Services/PriceService.ashx";
const PROVIDER_NAME: &str = "sjc.com.vn";

/// SJC's internal price series ids.
const BAR_SERIES_ID: u32 = 1;
const RING_SERIES_ID: u32 = 49;

/// SJC price-history endpoint.
///
/// - **Requires**: nothing, public form endpoint.
/// - **Coverage**: SJC bars (series 1) and SJC 99.99 rings (series 49).
/// - **Units**: values are passed through per lượng; the replay converts.
pub struct SjcHistoryProvider {
    client: Client,
}

impl SjcHistoryProvider {
    pub fn new() -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn series_id(instrument: HistoryInstrument) -> u32 {
        match instrument {
            HistoryInstrument::Bar => BAR_SERIES_ID,
            HistoryInstrument::Ring9999 => RING_SERIES_ID,
        }
    }

    async fn fetch_series(
        &self,
        instrument: HistoryInstrument,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<HistoryPoint>, CoreError> {
        let series_id = Self::series_id(instrument).to_string();
        let from_str = from.format("%d/%m/%Y").to_string();
        let to_str = to.format("%d/%m/%Y").to_string();

        let body = self
            .client
            .post(SERVICE_URL)
            .header("x-requested-with", "XMLHttpRequest")
            .form(&[
                ("method", "GetGoldPriceHistory"),
                ("goldPriceId", series_id.as_str()),
                ("fromDate", from_str.as_str()),
                ("toDate", to_str.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let points = parse_history_response(&body, instrument)?;
        debug!("{PROVIDER_NAME}: {} {instrument} points {from}..{to}", points.len());
        Ok(points)
    }
}

impl Default for SjcHistoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── SJC API response types ──────────────────────────────────────────

#[derive(Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Vec<HistoryItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HistoryItem {
    buy_value: f64,
    sell_value: f64,
    group_date: String,
}

/// Parse the `/Date(1706580000000)/` wrapper into a UTC instant.
/// Returns `None` for missing or zero timestamps.
pub fn parse_group_date(raw: &str) -> Option<DateTime<Utc>> {
    let re = Regex::new(r"-?\d+").ok()?;
    let millis: i64 = re.find(raw)?.as_str().parse().ok()?;
    if millis == 0 {
        return None;
    }
    DateTime::from_timestamp_millis(millis)
}

/// Parse one series response. An unsuccessful response yields no points;
/// entries without a usable timestamp are dropped.
pub fn parse_history_response(
    body: &str,
    instrument: HistoryInstrument,
) -> Result<Vec<HistoryPoint>, CoreError> {
    let resp: HistoryResponse = serde_json::from_str(body).map_err(|e| CoreError::Api {
        provider: PROVIDER_NAME.into(),
        message: format!("Failed to parse history response: {e}"),
    })?;

    if !resp.success {
        return Ok(Vec::new());
    }

    Ok(resp
        .data
        .into_iter()
        .filter_map(|item| {
            let timestamp = parse_group_date(&item.group_date)?;
            Some(HistoryPoint::new(timestamp, instrument, item.buy_value, item.sell_value))
        })
        .collect())
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl QuoteProvider for SjcHistoryProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn feeds(&self) -> Vec<QuoteFeed> {
        vec![QuoteFeed::History]
    }

    async fn current_quotes(&self) -> Result<Vec<MarketQuote>, CoreError> {
        Err(CoreError::Api {
            provider: PROVIDER_NAME.into(),
            message: "current board is not served by the history endpoint".into(),
        })
    }

    async fn history(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<HistoryPoint>, CoreError> {
        let mut points = self.fetch_series(HistoryInstrument::Bar, from, to).await?;
        points.extend(self.fetch_series(HistoryInstrument::Ring9999, from, to).await?);
        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }
}
