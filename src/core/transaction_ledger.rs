//! Thread-safe transaction ledger
//!
//! This module provides `InMemoryLedger`, the append-only log of transaction
//! records plus the index from idempotency key to the transaction it produced.
//!
//! # Design
//!
//! The record vector, the key index and the per-wallet index live behind one
//! `RwLock`. Every write (a single leg or both legs of a transfer) happens
//! under one write guard, so:
//! - the key check and the append are a single atomic step
//! - a key is indexed in the same step that creates its transaction
//! - readers never observe one transfer leg without the other
//!
//! Reads take the shared guard and clone out the records they return.

use crate::core::traits::TransactionLedger;
use crate::types::{LedgerError, NewTransaction, Transaction, TransactionId, WalletId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct LedgerState {
    /// Every record in append order
    transactions: Vec<Transaction>,

    /// Idempotency key -> position in `transactions`
    by_key: HashMap<String, usize>,

    /// Wallet -> positions of its legs, in append order
    by_wallet: HashMap<WalletId, Vec<usize>>,

    last_timestamp: Option<DateTime<Utc>>,
}

impl LedgerState {
    fn existing(&self, key: Option<&str>) -> Option<&Transaction> {
        key.and_then(|k| self.by_key.get(k))
            .map(|&index| &self.transactions[index])
    }

    /// Timestamps never go backwards, even if the wall clock does
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }

    fn append(&mut self, entry: NewTransaction) -> Transaction {
        let transaction = Transaction {
            id: TransactionId::generate(),
            tx_type: entry.tx_type,
            amount: entry.amount,
            wallet_id: entry.wallet_id,
            timestamp: self.next_timestamp(),
            related_wallet_id: entry.related_wallet_id,
            idempotency_key: entry.idempotency_key,
        };

        let index = self.transactions.len();
        if let Some(key) = &transaction.idempotency_key {
            self.by_key.insert(key.clone(), index);
        }
        self.by_wallet
            .entry(transaction.wallet_id)
            .or_default()
            .push(index);
        self.transactions.push(transaction.clone());

        transaction
    }
}

fn ensure_positive(entry: &NewTransaction) -> Result<(), LedgerError> {
    if entry.amount <= Decimal::ZERO {
        return Err(LedgerError::invalid_amount(entry.amount));
    }
    Ok(())
}

/// In-memory transaction ledger
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionLedger for InMemoryLedger {
    fn find_by_key(&self, key: &str) -> Option<Transaction> {
        self.state.read().existing(Some(key)).cloned()
    }

    fn record_if_new(&self, entry: NewTransaction) -> Result<(Transaction, bool), LedgerError> {
        ensure_positive(&entry)?;

        let mut state = self.state.write();
        if let Some(existing) = state.existing(entry.idempotency_key.as_deref()) {
            return Ok((existing.clone(), false));
        }

        Ok((state.append(entry), true))
    }

    fn record_pair_if_new(
        &self,
        keyed: NewTransaction,
        paired: NewTransaction,
    ) -> Result<(Transaction, bool), LedgerError> {
        ensure_positive(&keyed)?;
        ensure_positive(&paired)?;

        let mut state = self.state.write();
        if let Some(existing) = state.existing(keyed.idempotency_key.as_deref()) {
            return Ok((existing.clone(), false));
        }

        if let Some(key) = paired.idempotency_key.as_deref() {
            if keyed.idempotency_key.as_deref() == Some(key) || state.by_key.contains_key(key) {
                return Err(LedgerError::idempotency_key_conflict(key));
            }
        }

        let recorded = state.append(keyed);
        state.append(paired);
        Ok((recorded, true))
    }

    fn list_by_wallet(&self, wallet_id: &WalletId) -> Vec<Transaction> {
        let state = self.state.read();
        state
            .by_wallet
            .get(wallet_id)
            .map(|indices| {
                indices
                    .iter()
                    .rev()
                    .map(|&index| state.transactions[index].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn transactions(&self) -> Vec<Transaction> {
        self.state.read().transactions.clone()
    }

    fn len(&self) -> usize {
        self.state.read().transactions.len()
    }
}
