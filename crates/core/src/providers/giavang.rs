use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::{debug, warn};
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::quote::{HistoryPoint, MarketQuote};
use super::traits::{QuoteFeed, QuoteProvider};

const BOARD_URL: &str = "https://giavang.org/";
const PROVIDER_NAME: &str = "giavang.org";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Board prices are listed in thousands of VND per lượng.
const BOARD_UNIT: f64 = 1000.0;

/// Label suffix per table: the first table lists bars, the second rings.
const TABLE_SUFFIXES: [&str; 2] = [" (Miếng)", " (Nhẫn)"];

const UPDATED_MARKER: &str = "Cập nhật lúc";

/// giavang.org price board scraper.
///
/// - **Requires**: nothing, public page.
/// - **Coverage**: current buy/sell for the major brands, bars and rings.
/// - **Labels**: `"{brand} (Miếng)"` / `"{brand} (Nhẫn)"`, the format the
///   quote resolver matches against.
pub struct GiaVangProvider {
    client: Client,
    /// A row is kept only when its brand cell contains one of these
    brand_filters: Vec<String>,
}

impl GiaVangProvider {
    pub fn new(brand_filters: Vec<String>) -> Self {
        let builder = Client::builder().user_agent(USER_AGENT);
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            brand_filters,
        }
    }
}

/// Parse a board number such as `"82.500"` or `"82,500"` into `82500.0`.
///
/// Thousands separators are dropped and parsing stops at the first
/// character that is not a digit (trend arrows, units).
pub fn parse_board_number(text: &str) -> Option<f64> {
    let digits: String = text
        .trim()
        .chars()
        .filter(|c| *c != '.' && *c != ',')
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Parse the board page into market quotes.
///
/// Only the first two tables are read. Within a table the first row for a
/// label wins (the page lists regional duplicates).
pub fn parse_price_board(
    html: &str,
    brand_filters: &[String],
    fallback_updated: &str,
) -> Result<Vec<MarketQuote>, CoreError> {
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;

    let updated = extract_updated(&document).unwrap_or_else(|| fallback_updated.to_string());

    let mut quotes: Vec<MarketQuote> = Vec::new();
    for (table, suffix) in document.select(&table_sel).zip(TABLE_SUFFIXES) {
        for row in table.select(&row_sel) {
            let cells: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
            if cells.len() < 3 {
                continue; // header or spacer row
            }

            let brand = &cells[0];
            if !brand_filters.iter().any(|b| brand.contains(b.as_str())) {
                continue;
            }

            let (Some(buy), Some(sell)) = (parse_board_number(&cells[1]), parse_board_number(&cells[2])) else {
                continue;
            };

            let label = format!("{brand}{suffix}");
            if quotes.iter().any(|q| q.label == label) {
                continue;
            }
            quotes.push(MarketQuote::new(label, buy * BOARD_UNIT, sell * BOARD_UNIT, updated.clone()));
        }
    }

    Ok(quotes)
}

fn selector(css: &str) -> Result<Selector, CoreError> {
    Selector::parse(css).map_err(|e| CoreError::Api {
        provider: PROVIDER_NAME.into(),
        message: format!("Invalid selector {css}: {e:?}"),
    })
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Find "Cập nhật lúc 14:50:22 30/01/2026" and keep the time/date part.
fn extract_updated(document: &Html) -> Option<String> {
    let text = document.root_element().text().collect::<Vec<_>>().join(" ");
    let idx = text.rfind(UPDATED_MARKER)?;
    let re = Regex::new(r"\d{2}:\d{2}(?::\d{2})?\s+\d{2}/\d{2}/\d{4}").ok()?;
    let found = re.find(&text[idx..])?;
    Some(found.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl QuoteProvider for GiaVangProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn feeds(&self) -> Vec<QuoteFeed> {
        vec![QuoteFeed::Current]
    }

    async fn current_quotes(&self) -> Result<Vec<MarketQuote>, CoreError> {
        let html = self
            .client
            .get(BOARD_URL)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!("Fetched {} bytes from {PROVIDER_NAME}", html.len());

        let fetched_at = Utc::now().format("%H:%M:%S %d/%m/%Y").to_string();
        let quotes = parse_price_board(&html, &self.brand_filters, &fetched_at)?;
        if quotes.is_empty() {
            warn!("{PROVIDER_NAME}: no recognisable rows, page layout may have changed");
        }
        Ok(quotes)
    }

    async fn history(&self, _from: NaiveDate, _to: NaiveDate) -> Result<Vec<HistoryPoint>, CoreError> {
        Err(CoreError::Api {
            provider: PROVIDER_NAME.into(),
            message: "price history is not published on the board".into(),
        })
    }
}
