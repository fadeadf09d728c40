use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Gold bought with own money (enters the invested bucket)
    Buy,
    /// Gold sold (depletes invested first, then gifted)
    Sell,
    /// Gold received as a gift (enters the gifted bucket at zero cost)
    GiftIn,
    /// Gold given away (leaves the gifted bucket)
    GiftOut,
}

impl TransactionKind {
    /// Gift entries carry no price.
    pub fn is_gift(&self) -> bool {
        matches!(self, TransactionKind::GiftIn | TransactionKind::GiftOut)
    }

    /// `+1.0` for entries that add metal, `-1.0` for entries that remove it.
    pub fn direction(&self) -> f64 {
        match self {
            TransactionKind::Buy | TransactionKind::GiftIn => 1.0,
            TransactionKind::Sell | TransactionKind::GiftOut => -1.0,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Buy => write!(f, "buy"),
            TransactionKind::Sell => write!(f, "sell"),
            TransactionKind::GiftIn => write!(f, "gift_in"),
            TransactionKind::GiftOut => write!(f, "gift_out"),
        }
    }
}

/// Physical form a quote label advertises, e.g. "SJC (Miếng)".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteForm {
    Bar,
    Ring,
}

impl QuoteForm {
    /// Keyword used inside market quote labels.
    pub fn keyword(&self) -> &'static str {
        match self {
            QuoteForm::Bar => "Miếng",
            QuoteForm::Ring => "Nhẫn",
        }
    }
}

/// Semantic type of gold product. Open-ended: unknown values round-trip
/// through `Other` so ledgers written by newer versions still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Instrument {
    /// Branded gold bar ("vàng miếng")
    Bar,
    /// 99.99% plain ring ("nhẫn tròn 9999")
    Ring9999,
    /// Jewelry; no quoted form or history feed, valued at the board's first quote
    Jewelry,
    Other(String),
}

impl Instrument {
    pub fn as_str(&self) -> &str {
        match self {
            Instrument::Bar => "bar",
            Instrument::Ring9999 => "ring_9999",
            Instrument::Jewelry => "jewelry",
            Instrument::Other(s) => s,
        }
    }

    /// The label form this instrument is quoted under, if any.
    pub fn quote_form(&self) -> Option<QuoteForm> {
        match self {
            Instrument::Bar => Some(QuoteForm::Bar),
            Instrument::Ring9999 => Some(QuoteForm::Ring),
            Instrument::Jewelry | Instrument::Other(_) => None,
        }
    }
}

impl From<&str> for Instrument {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "bar" => Instrument::Bar,
            "ring_9999" | "nhan_9999" => Instrument::Ring9999,
            "jewelry" => Instrument::Jewelry,
            _ => Instrument::Other(value.trim().to_string()),
        }
    }
}

impl From<String> for Instrument {
    fn from(value: String) -> Self {
        Instrument::from(value.as_str())
    }
}

impl From<Instrument> for String {
    fn from(value: Instrument) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single buy/sell/gift entry in the ledger.
///
/// `total_value` is captured once when the entry is created and is never
/// recomputed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,

    pub kind: TransactionKind,

    pub instrument: Instrument,

    /// Producer/retailer label. `None` means the canonical brand.
    #[serde(default)]
    pub brand: Option<String>,

    /// Quantity in chi (always positive)
    pub quantity: f64,

    /// VND per chi; zero for gifts
    pub unit_price: f64,

    /// `quantity * unit_price`, stored for display and cost basis
    pub total_value: f64,

    /// Day of the transaction; the only ordering key
    pub date: NaiveDate,

    #[serde(default)]
    pub note: Option<String>,
}

impl Transaction {
    pub fn new(
        kind: TransactionKind,
        instrument: Instrument,
        brand: Option<String>,
        quantity: f64,
        unit_price: f64,
        date: NaiveDate,
    ) -> Self {
        let brand = brand
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());
        Self {
            id: Uuid::new_v4(),
            kind,
            instrument,
            brand,
            quantity,
            unit_price,
            total_value: quantity * unit_price,
            date,
            note: None,
        }
    }

    pub fn buy(
        instrument: Instrument,
        brand: Option<String>,
        quantity: f64,
        unit_price: f64,
        date: NaiveDate,
    ) -> Self {
        Self::new(TransactionKind::Buy, instrument, brand, quantity, unit_price, date)
    }

    pub fn sell(
        instrument: Instrument,
        brand: Option<String>,
        quantity: f64,
        unit_price: f64,
        date: NaiveDate,
    ) -> Self {
        Self::new(TransactionKind::Sell, instrument, brand, quantity, unit_price, date)
    }

    pub fn gift_in(instrument: Instrument, brand: Option<String>, quantity: f64, date: NaiveDate) -> Self {
        Self::new(TransactionKind::GiftIn, instrument, brand, quantity, 0.0, date)
    }

    pub fn gift_out(instrument: Instrument, brand: Option<String>, quantity: f64, date: NaiveDate) -> Self {
        Self::new(TransactionKind::GiftOut, instrument, brand, quantity, 0.0, date)
    }

    /// Attach a free-text note (blank notes are dropped).
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        let trimmed = note.trim();
        self.note = if trimmed.is_empty() { None } else { Some(trimmed.to_string()) };
        self
    }

    /// Brand, falling back to `canonical` when none was recorded.
    pub fn brand_or<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.brand.as_deref().unwrap_or(canonical)
    }

    /// The instant this entry is compared at against history timestamps
    /// (00:00 UTC of its date).
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.date.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}
