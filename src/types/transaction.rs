//! Transaction-related types for the wallet ledger
//!
//! This module defines ledger records, their identifiers, and the
//! not-yet-recorded form the coordinator hands to the ledger.

use super::wallet::WalletId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Transaction identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Allocate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Direction of a single ledger leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Funds added to the wallet (funding, or the receiving leg of a transfer)
    Credit,

    /// Funds removed from the wallet (the sending leg of a transfer)
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "CREDIT",
            TransactionType::Debit => "DEBIT",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable ledger record
///
/// Created once by the ledger on behalf of the coordinator and never
/// modified or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier
    pub id: TransactionId,

    /// CREDIT or DEBIT
    #[serde(rename = "type")]
    pub tx_type: TransactionType,

    /// Strictly positive amount moved by this leg
    pub amount: Decimal,

    /// The wallet this leg affects
    pub wallet_id: WalletId,

    /// Creation time, non-decreasing in ledger append order
    pub timestamp: DateTime<Utc>,

    /// Counterparty wallet for a transfer leg
    pub related_wallet_id: Option<WalletId>,

    /// Caller-supplied deduplication key, if any
    pub idempotency_key: Option<String>,
}

impl Transaction {
    /// Effect of this leg on its wallet's balance
    pub fn signed_amount(&self) -> Decimal {
        match self.tx_type {
            TransactionType::Credit => self.amount,
            TransactionType::Debit => -self.amount,
        }
    }

    /// Whether this record is the effect of an operation of `tx_type` on `wallet_id`
    pub fn is_effect_of(&self, wallet_id: &WalletId, tx_type: TransactionType) -> bool {
        self.wallet_id == *wallet_id && self.tx_type == tx_type
    }
}

/// A transaction the ledger has not recorded yet
///
/// Identifier and timestamp are assigned by the ledger at append time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub wallet_id: WalletId,
    pub tx_type: TransactionType,
    pub amount: Decimal,
    pub related_wallet_id: Option<WalletId>,
    pub idempotency_key: Option<String>,
}

impl NewTransaction {
    pub fn credit(wallet_id: WalletId, amount: Decimal) -> Self {
        Self::new(wallet_id, TransactionType::Credit, amount)
    }

    pub fn debit(wallet_id: WalletId, amount: Decimal) -> Self {
        Self::new(wallet_id, TransactionType::Debit, amount)
    }

    fn new(wallet_id: WalletId, tx_type: TransactionType, amount: Decimal) -> Self {
        Self {
            wallet_id,
            tx_type,
            amount,
            related_wallet_id: None,
            idempotency_key: None,
        }
    }

    /// Set the counterparty wallet of a transfer leg
    pub fn related_to(mut self, wallet_id: WalletId) -> Self {
        self.related_wallet_id = Some(wallet_id);
        self
    }

    /// Attach an optional idempotency key
    pub fn with_key(mut self, key: Option<&str>) -> Self {
        self.idempotency_key = key.map(str::to_string);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::credit(TransactionType::Credit, Decimal::new(50, 0))]
    #[case::debit(TransactionType::Debit, Decimal::new(-50, 0))]
    fn test_signed_amount(#[case] tx_type: TransactionType, #[case] expected: Decimal) {
        let tx = Transaction {
            id: TransactionId::generate(),
            tx_type,
            amount: Decimal::new(50, 0),
            wallet_id: WalletId::generate(),
            timestamp: Utc::now(),
            related_wallet_id: None,
            idempotency_key: None,
        };
        assert_eq!(tx.signed_amount(), expected);
    }

    #[test]
    fn test_new_transaction_builders() {
        let sender = WalletId::generate();
        let receiver = WalletId::generate();

        let leg = NewTransaction::debit(sender, Decimal::new(100, 0))
            .related_to(receiver)
            .with_key(Some("k2"));

        assert_eq!(leg.tx_type, TransactionType::Debit);
        assert_eq!(leg.wallet_id, sender);
        assert_eq!(leg.related_wallet_id, Some(receiver));
        assert_eq!(leg.idempotency_key.as_deref(), Some("k2"));

        let unkeyed = NewTransaction::credit(receiver, Decimal::ONE).with_key(None);
        assert!(unkeyed.idempotency_key.is_none());
        assert!(unkeyed.related_wallet_id.is_none());
    }

    #[test]
    fn test_transaction_type_display() {
        assert_eq!(TransactionType::Credit.to_string(), "CREDIT");
        assert_eq!(TransactionType::Debit.to_string(), "DEBIT");
    }
}
