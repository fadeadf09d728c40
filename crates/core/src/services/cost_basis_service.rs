use log::{debug, warn};

use crate::models::holdings::{GiftedBucket, Holdings, HoldingsWarning, InvestedBucket};
use crate::models::transaction::{Transaction, TransactionKind};

/// Quantities below this many chi are treated as floating-point residue.
pub const QUANTITY_EPSILON: f64 = 1e-3;

/// Replays the transaction log into invested/gifted buckets with
/// weighted-average cost.
///
/// Pure business logic: no I/O, no hidden state. Same input, same output.
pub struct CostBasisService;

impl CostBasisService {
    pub fn new() -> Self {
        Self
    }

    /// Compute the cost-basis breakdown of current holdings.
    ///
    /// Transactions are replayed oldest first (stable on date, so same-day
    /// entries keep the order they were given in). A sell consumes the
    /// invested bucket at its current average cost; whatever it cannot cover
    /// comes out of the gifted bucket. Overselling never fails: it is reported
    /// in `warnings` and the buckets are clamped at zero.
    pub fn compute_holdings(&self, transactions: &[Transaction]) -> Holdings {
        let mut sorted: Vec<&Transaction> = transactions.iter().collect();
        sorted.sort_by_key(|t| t.date);

        let mut invested = InvestedBucket::default();
        let mut gifted = GiftedBucket::default();
        let mut warnings = Vec::new();

        for tx in sorted {
            let gifted_before = gifted.quantity;
            match tx.kind {
                TransactionKind::Buy => {
                    invested.quantity += tx.quantity;
                    invested.cost += tx.total_value;
                }
                TransactionKind::GiftIn => gifted.quantity += tx.quantity,
                TransactionKind::GiftOut => gifted.quantity -= tx.quantity,
                TransactionKind::Sell => {
                    if invested.quantity >= tx.quantity {
                        let avg_cost = invested.cost / invested.quantity;
                        invested.cost -= avg_cost * tx.quantity;
                        invested.quantity -= tx.quantity;
                    } else {
                        let gift_part = tx.quantity - invested.quantity;
                        invested = InvestedBucket::default();
                        gifted.quantity -= gift_part;
                    }
                }
            }

            // Only the part of the deficit this entry added is its shortfall.
            if gifted.quantity < gifted_before && gifted.quantity < -QUANTITY_EPSILON {
                let shortfall = -gifted.quantity - (-gifted_before).max(0.0);
                let warning = HoldingsWarning {
                    transaction_id: tx.id,
                    kind: tx.kind,
                    date: tx.date,
                    shortfall,
                };
                warn!("Holdings replay: {warning}");
                warnings.push(warning);
            }
        }

        if invested.quantity < QUANTITY_EPSILON {
            invested = InvestedBucket::default();
        }
        if gifted.quantity < QUANTITY_EPSILON {
            gifted = GiftedBucket::default();
        }

        debug!(
            "Replayed {} transactions: invested {:.3} chi / {:.0} VND, gifted {:.3} chi",
            transactions.len(),
            invested.quantity,
            invested.cost,
            gifted.quantity
        );

        Holdings {
            invested,
            gifted,
            total_quantity: invested.quantity + gifted.quantity,
            total_invested: invested.cost,
            warnings,
        }
    }
}

impl Default for CostBasisService {
    fn default() -> Self {
        Self::new()
    }
}
