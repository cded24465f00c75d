//! Core traits for wallet storage and the transaction ledger
//!
//! The coordinator is written against these abstractions, so whether the
//! backing store lives in memory, a file or a database does not change the
//! idempotency or locking protocol.

use crate::core::wallet_store::WalletEntry;
use crate::types::{Currency, LedgerError, NewTransaction, Transaction, Wallet, WalletId};
use rust_decimal::Decimal;

/// Owner of wallet records and their balances
///
/// Implementations must make `adjust`, `update` and `update_pair` atomic per
/// wallet: no lost updates, no read-modify-write race.
pub trait WalletStore: Send + Sync {
    /// Create a wallet with a zero balance
    fn create(&self, currency: Currency) -> Wallet;

    /// Snapshot of a wallet
    fn get(&self, id: &WalletId) -> Result<Wallet, LedgerError>;

    /// Apply `balance += delta` atomically
    fn adjust(&self, id: &WalletId, delta: Decimal) -> Result<Wallet, LedgerError>;

    /// Run `f` with exclusive access to one wallet
    fn update<R, F>(&self, id: &WalletId, f: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&mut WalletEntry<'_>) -> Result<R, LedgerError>;

    /// Run `f` with exclusive access to two distinct wallets
    ///
    /// Locks are taken in ascending `WalletId` order; the entries are handed
    /// to `f` in argument order.
    fn update_pair<R, F>(&self, first: &WalletId, second: &WalletId, f: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&mut WalletEntry<'_>, &mut WalletEntry<'_>) -> Result<R, LedgerError>;

    /// Snapshot of every wallet, in no particular order
    fn all(&self) -> Vec<Wallet>;
}

/// Append-only transaction log with an idempotency key index
pub trait TransactionLedger: Send + Sync {
    /// Transaction previously recorded under `key`
    fn find_by_key(&self, key: &str) -> Option<Transaction>;

    /// Record `entry` unless its key is already indexed
    ///
    /// Returns the recorded (or previously recorded) transaction and whether
    /// this call created it. The key check and the append are one atomic step.
    fn record_if_new(&self, entry: NewTransaction) -> Result<(Transaction, bool), LedgerError>;

    /// Record both legs of a transfer in one atomic step
    ///
    /// The key check applies to `keyed`. Returns the `keyed` leg and whether
    /// this call created the pair.
    fn record_pair_if_new(
        &self,
        keyed: NewTransaction,
        paired: NewTransaction,
    ) -> Result<(Transaction, bool), LedgerError>;

    /// Transactions of one wallet, most recent first
    fn list_by_wallet(&self, wallet_id: &WalletId) -> Vec<Transaction>;

    /// Every transaction in append order
    fn transactions(&self) -> Vec<Transaction>;

    /// Number of recorded transactions
    fn len(&self) -> usize;

    /// Whether nothing has been recorded yet
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
