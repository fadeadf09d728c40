use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::quote::MarketQuote;
use crate::models::transaction::Instrument;

/// Step of the fallback chain that produced a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStage {
    /// "{brand} ({form})" for the transaction's own brand
    Brand,
    /// "{canonical} ({form})" for the reference brand
    CanonicalBrand,
    /// The bare form keyword, any brand
    FormKeyword,
    /// Whatever quote heads the board; the only rule for instruments
    /// without a quoted form
    FirstQuote,
}

/// One entry of the ordered rule list: a label must contain `needle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRule {
    pub stage: MatchStage,
    pub needle: String,
}

impl MatchRule {
    /// First quote whose label contains the needle, if its buy price is usable.
    ///
    /// Only the first containing label is considered; a zero buy on it makes
    /// the whole rule a miss rather than scanning further.
    pub fn find<'a>(&self, quotes: &'a [MarketQuote]) -> Option<&'a MarketQuote> {
        quotes
            .iter()
            .find(|q| q.label.contains(&self.needle))
            .filter(|q| q.buy != 0.0)
    }
}

/// Outcome of resolving a price, including which rule fired.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// VND per chi
    pub price_per_chi: f64,
    pub stage: Option<MatchStage>,
    /// Label of the quote that matched
    pub label: Option<String>,
}

impl Resolution {
    pub fn is_default(&self) -> bool {
        self.stage.is_none()
    }
}

/// Maps an (instrument, brand) pair onto the best matching market quote.
///
/// Quote labels come from an uncontrolled scrape, so matching is best effort:
/// brand-specific, then canonical brand, then any quote of the same form,
/// then the caller's default. Jewelry and unknown instruments are valued
/// against the first quote on the board. Never fails.
pub struct QuoteResolver {
    canonical_brand: String,
}

impl QuoteResolver {
    pub fn new(canonical_brand: impl Into<String>) -> Self {
        Self {
            canonical_brand: canonical_brand.into(),
        }
    }

    pub fn canonical_brand(&self) -> &str {
        &self.canonical_brand
    }

    /// The ordered rule list for an instrument and (optional) brand.
    /// Instruments without a quoted form get a single catch-all rule.
    pub fn rules_for(&self, instrument: &Instrument, brand: Option<&str>) -> Vec<MatchRule> {
        let Some(form) = instrument.quote_form() else {
            // every label contains the empty needle
            return vec![MatchRule {
                stage: MatchStage::FirstQuote,
                needle: String::new(),
            }];
        };
        let keyword = form.keyword();
        let brand = brand
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(self.canonical_brand.as_str());

        let candidates = [
            (MatchStage::Brand, format!("{brand} ({keyword})")),
            (
                MatchStage::CanonicalBrand,
                format!("{} ({keyword})", self.canonical_brand),
            ),
            (MatchStage::FormKeyword, keyword.to_string()),
        ];

        let mut rules: Vec<MatchRule> = Vec::with_capacity(candidates.len());
        for (stage, needle) in candidates {
            // own brand == canonical brand: the second rule would repeat the first
            if rules.iter().any(|r| r.needle == needle) {
                continue;
            }
            rules.push(MatchRule { stage, needle });
        }
        rules
    }

    /// Walk the rule list and report which rule fired.
    pub fn resolve(
        &self,
        instrument: &Instrument,
        brand: Option<&str>,
        quotes: &[MarketQuote],
        default_price: f64,
    ) -> Resolution {
        for rule in self.rules_for(instrument, brand) {
            if let Some(quote) = rule.find(quotes) {
                return Resolution {
                    price_per_chi: quote.buy_per_chi(),
                    stage: Some(rule.stage),
                    label: Some(quote.label.clone()),
                };
            }
        }

        debug!(
            "No quote for {instrument} / {}; using default {default_price}",
            brand.unwrap_or(self.canonical_brand.as_str())
        );
        Resolution {
            price_per_chi: default_price,
            stage: None,
            label: None,
        }
    }

    /// Current market buy price per chi for an (instrument, brand) pair.
    pub fn resolve_price_per_chi(
        &self,
        instrument: &Instrument,
        brand: Option<&str>,
        quotes: &[MarketQuote],
        default_price: f64,
    ) -> f64 {
        self.resolve(instrument, brand, quotes, default_price)
            .price_per_chi
    }
}
