use log::debug;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::ledger::Ledger;
use crate::models::transaction::Transaction;

/// Manages the transaction log and guards what enters it.
///
/// This is the validation boundary: the valuation engine assumes every
/// transaction it sees has already passed `validate_transaction`.
pub struct LedgerService;

impl LedgerService {
    pub fn new() -> Self {
        Self
    }

    /// Validate and insert a transaction, keeping the log in date order.
    pub fn add_transaction(&self, ledger: &mut Ledger, transaction: Transaction) -> Result<(), CoreError> {
        self.validate_transaction(&transaction)?;
        if ledger.transactions.iter().any(|t| t.id == transaction.id) {
            return Err(CoreError::ValidationError(format!(
                "Duplicate transaction id {}",
                transaction.id
            )));
        }
        debug!(
            "Adding {} {} chi {} on {}",
            transaction.kind, transaction.quantity, transaction.instrument, transaction.date
        );
        Self::ordered_insert(&mut ledger.transactions, transaction);
        Ok(())
    }

    /// Replace an existing transaction, keeping its id.
    /// `total_value` is recomputed from the new quantity and price.
    pub fn update_transaction(
        &self,
        ledger: &mut Ledger,
        transaction_id: Uuid,
        mut updated: Transaction,
    ) -> Result<(), CoreError> {
        let idx = Self::position(ledger, transaction_id)?;

        updated.id = transaction_id;
        updated.total_value = updated.quantity * updated.unit_price;
        self.validate_transaction(&updated)?;

        ledger.transactions.remove(idx);
        Self::ordered_insert(&mut ledger.transactions, updated);
        Ok(())
    }

    /// Remove a transaction by id, returning it.
    pub fn remove_transaction(&self, ledger: &mut Ledger, transaction_id: Uuid) -> Result<Transaction, CoreError> {
        let idx = Self::position(ledger, transaction_id)?;
        Ok(ledger.transactions.remove(idx))
    }

    /// Set or clear the note on an existing transaction.
    pub fn set_note(
        &self,
        ledger: &mut Ledger,
        transaction_id: Uuid,
        note: Option<String>,
    ) -> Result<(), CoreError> {
        let idx = Self::position(ledger, transaction_id)?;
        ledger.transactions[idx].note = note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        Ok(())
    }

    /// All transactions, newest first (display order).
    /// Same-day entries show the most recently recorded first.
    pub fn list_transactions<'a>(&self, ledger: &'a Ledger) -> Vec<&'a Transaction> {
        ledger.transactions.iter().rev().collect()
    }

    /// Reject entries the engine is not specified to handle.
    ///
    /// Rules:
    /// - Quantity must be finite and positive
    /// - Price must be finite and non-negative
    /// - Gifts carry no price
    pub fn validate_transaction(&self, transaction: &Transaction) -> Result<(), CoreError> {
        if !transaction.quantity.is_finite() || transaction.quantity <= 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Quantity must be a positive number of chi, got {}",
                transaction.quantity
            )));
        }

        if !transaction.unit_price.is_finite() || transaction.unit_price < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Unit price must be a non-negative amount, got {}",
                transaction.unit_price
            )));
        }

        if transaction.kind.is_gift() && transaction.unit_price != 0.0 {
            return Err(CoreError::ValidationError(format!(
                "{} entries carry no price, got {}",
                transaction.kind, transaction.unit_price
            )));
        }

        Ok(())
    }

    fn position(ledger: &Ledger, transaction_id: Uuid) -> Result<usize, CoreError> {
        ledger
            .transactions
            .iter()
            .position(|t| t.id == transaction_id)
            .ok_or_else(|| CoreError::TransactionNotFound(transaction_id.to_string()))
    }

    /// Insert after every entry with the same or an earlier date, so same-day
    /// entries stay in the order they were recorded (O(log n) search).
    fn ordered_insert(transactions: &mut Vec<Transaction>, transaction: Transaction) {
        let pos = transactions.partition_point(|t| t.date <= transaction.date);
        transactions.insert(pos, transaction);
    }
}

impl Default for LedgerService {
    fn default() -> Self {
        Self::new()
    }
}
