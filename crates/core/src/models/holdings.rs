use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transaction::TransactionKind;

/// Aggregate of gold bought with own money.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestedBucket {
    /// Chi still held from purchases
    pub quantity: f64,
    /// Remaining cost of those chi, VND
    pub cost: f64,
}

impl InvestedBucket {
    /// Weighted-average cost per chi, or `None` when the bucket is empty.
    pub fn average_cost(&self) -> Option<f64> {
        if self.quantity > 0.0 {
            Some(self.cost / self.quantity)
        } else {
            None
        }
    }
}

/// Aggregate of gold received as gifts. Its cost basis is zero by definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GiftedBucket {
    pub quantity: f64,
}

/// A replayed entry that pushed the gifted bucket below zero.
///
/// Usually a data-entry mistake (selling or giving away more than was ever
/// held). Reported next to the result; the numbers are still clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingsWarning {
    pub transaction_id: Uuid,
    pub kind: TransactionKind,
    pub date: NaiveDate,
    /// Chi that could not be covered by any bucket
    pub shortfall: f64,
}

impl std::fmt::Display for HoldingsWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} on {} exceeds holdings by {:.3} chi",
            self.kind, self.transaction_id, self.date, self.shortfall
        )
    }
}

/// Cost-basis breakdown of current holdings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Holdings {
    pub invested: InvestedBucket,
    pub gifted: GiftedBucket,
    /// invested + gifted, chi
    pub total_quantity: f64,
    /// Equal to `invested.cost`
    pub total_invested: f64,
    #[serde(default)]
    pub warnings: Vec<HoldingsWarning>,
}

impl Holdings {
    pub fn is_empty(&self) -> bool {
        self.total_quantity == 0.0
    }
}
