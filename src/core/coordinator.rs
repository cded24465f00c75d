//! Fund and transfer orchestration
//!
//! This module provides `TransferCoordinator`, which combines a
//! [`WalletStore`] and a [`TransactionLedger`] into the two mutating
//! operations, `fund` and `transfer`.
//!
//! # Idempotency Protocol
//!
//! 1. Validate the request (wallets exist, amount is positive, no self transfer)
//! 2. Look the idempotency key up in the ledger; a prior effect of the same
//!    operation returns the current state with no mutation
//! 3. Acquire the wallet lock(s) and look the key up again, since a
//!    concurrent retry may have won while this call waited
//! 4. Adjust balances and record the transaction(s) before releasing the locks
//!
//! If the ledger reports that another operation claimed the key between
//! steps 3 and 4, the balance adjustments are undone while the locks are
//! still held, so no reader ever sees them.
//!
//! # Architecture
//!
//! ```text
//! TransferCoordinator
//!     ├── Arc<WalletStore>        (per-wallet exclusive access)
//!     └── Arc<TransactionLedger>  (append-only log + key index)
//! ```

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::traits::{TransactionLedger, WalletStore};
use super::transaction_ledger::InMemoryLedger;
use super::wallet_store::{InMemoryWalletStore, WalletEntry};
use crate::types::{
    Currency, LedgerError, NewTransaction, Transaction, TransactionType, Wallet, WalletId,
};

/// Both wallets after a transfer (or its idempotent replay)
#[derive(Debug, Clone, PartialEq)]
pub struct TransferOutcome {
    pub sender: Wallet,
    pub receiver: Wallet,
}

/// A wallet together with its transaction history
#[derive(Debug, Clone, PartialEq)]
pub struct WalletDetails {
    pub wallet: Wallet,

    /// Most recent first
    pub history: Vec<Transaction>,
}

/// Orchestrates wallet mutations and their ledger records
///
/// Cloning is cheap and shares the underlying store and ledger.
pub struct TransferCoordinator<S = InMemoryWalletStore, L = InMemoryLedger> {
    wallets: Arc<S>,
    ledger: Arc<L>,
}

impl<S, L> Clone for TransferCoordinator<S, L> {
    fn clone(&self) -> Self {
        Self {
            wallets: Arc::clone(&self.wallets),
            ledger: Arc::clone(&self.ledger),
        }
    }
}

impl TransferCoordinator {
    /// Coordinator over a fresh in-memory store and ledger
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryWalletStore::new()),
            Arc::new(InMemoryLedger::new()),
        )
    }
}

impl Default for TransferCoordinator {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<S: WalletStore, L: TransactionLedger> TransferCoordinator<S, L> {
    pub fn new(wallets: Arc<S>, ledger: Arc<L>) -> Self {
        Self { wallets, ledger }
    }

    pub fn wallets(&self) -> &Arc<S> {
        &self.wallets
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    pub fn create_wallet(&self, currency: Currency) -> Wallet {
        self.wallets.create(currency)
    }

    pub fn get_wallet(&self, wallet_id: &WalletId) -> Result<Wallet, LedgerError> {
        self.wallets.get(wallet_id)
    }

    /// History of a wallet, most recent first
    ///
    /// Unknown wallets simply have no history.
    pub fn list_transactions(&self, wallet_id: &WalletId) -> Vec<Transaction> {
        self.ledger.list_by_wallet(wallet_id)
    }

    pub fn wallet_details(&self, wallet_id: &WalletId) -> Result<WalletDetails, LedgerError> {
        let wallet = self.wallets.get(wallet_id)?;
        let history = self.ledger.list_by_wallet(wallet_id);
        Ok(WalletDetails { wallet, history })
    }

    /// Credit a wallet
    ///
    /// # Arguments
    ///
    /// * `wallet_id` - Wallet to credit
    /// * `amount` - Strictly positive amount
    /// * `idempotency_key` - Optional retry key; a second call with the same
    ///   key returns the wallet without crediting it again
    ///
    /// # Errors
    ///
    /// * `WalletNotFound` - the wallet does not exist
    /// * `InvalidAmount` - `amount <= 0`
    /// * `IdempotencyKeyConflict` - the key belongs to a different operation
    /// * `ArithmeticOverflow` - the balance would overflow
    /// * `InternalInconsistency` - a rollback failed (fatal)
    pub fn fund(
        &self,
        wallet_id: &WalletId,
        amount: Decimal,
        idempotency_key: Option<&str>,
    ) -> Result<Wallet, LedgerError> {
        self.wallets.get(wallet_id)?;
        ensure_positive(amount)?;

        if let Some(key) = idempotency_key {
            if self.prior_effect(key, wallet_id, TransactionType::Credit)? {
                debug!(wallet = %wallet_id, key, "fund replayed, no credit applied");
                return self.wallets.get(wallet_id);
            }
        }

        self.wallets.update(wallet_id, |entry| {
            if let Some(key) = idempotency_key {
                if self.prior_effect(key, wallet_id, TransactionType::Credit)? {
                    debug!(wallet = %wallet_id, key, "fund replayed while waiting for wallet lock");
                    return Ok(entry.wallet().clone());
                }
            }

            let updated = entry.adjust(amount)?;
            let credit = NewTransaction::credit(*wallet_id, amount).with_key(idempotency_key);

            match self.ledger.record_if_new(credit) {
                Ok((transaction, true)) => {
                    info!(
                        wallet = %wallet_id,
                        %amount,
                        transaction = %transaction.id,
                        balance = %updated.balance,
                        "wallet funded"
                    );
                    Ok(updated)
                }
                Ok((existing, false)) => {
                    roll_back(entry, amount)?;
                    self.resolve_claimed_key(&existing, wallet_id, TransactionType::Credit)?;
                    Ok(entry.wallet().clone())
                }
                Err(e) => {
                    roll_back(entry, amount)?;
                    Err(e)
                }
            }
        })
    }

    /// Move funds from one wallet to another
    ///
    /// Records a DEBIT on the sender (carrying the idempotency key) and a
    /// CREDIT on the receiver, both with the other wallet as related wallet.
    /// Either both legs and both balance changes are visible or none are.
    ///
    /// # Errors
    ///
    /// * `SelfTransfer` - sender and receiver are the same wallet
    /// * `WalletNotFound` - either wallet does not exist
    /// * `InvalidAmount` - `amount <= 0`
    /// * `InsufficientBalance` - sender balance is below `amount`
    /// * `IdempotencyKeyConflict` - the key belongs to a different operation
    /// * `ArithmeticOverflow` - the receiver balance would overflow
    /// * `InternalInconsistency` - a rollback failed (fatal)
    pub fn transfer(
        &self,
        sender_id: &WalletId,
        receiver_id: &WalletId,
        amount: Decimal,
        idempotency_key: Option<&str>,
    ) -> Result<TransferOutcome, LedgerError> {
        if sender_id == receiver_id {
            return Err(LedgerError::self_transfer(*sender_id));
        }
        self.wallets.get(sender_id)?;
        self.wallets.get(receiver_id)?;
        ensure_positive(amount)?;

        if let Some(key) = idempotency_key {
            if self.prior_effect(key, sender_id, TransactionType::Debit)? {
                debug!(sender = %sender_id, receiver = %receiver_id, key, "transfer replayed");
                return Ok(TransferOutcome {
                    sender: self.wallets.get(sender_id)?,
                    receiver: self.wallets.get(receiver_id)?,
                });
            }
        }

        self.wallets
            .update_pair(sender_id, receiver_id, |sender, receiver| {
                if let Some(key) = idempotency_key {
                    if self.prior_effect(key, sender_id, TransactionType::Debit)? {
                        debug!(sender = %sender_id, key, "transfer replayed while waiting for wallet locks");
                        return Ok(snapshot(sender, receiver));
                    }
                }

                if sender.balance() < amount {
                    return Err(LedgerError::insufficient_balance(
                        *sender_id,
                        amount,
                        sender.balance(),
                    ));
                }

                let debited = sender.adjust(-amount)?;
                let credited = match receiver.adjust(amount) {
                    Ok(wallet) => wallet,
                    Err(e) => {
                        roll_back(sender, -amount)?;
                        return Err(e);
                    }
                };

                let debit = NewTransaction::debit(*sender_id, amount)
                    .related_to(*receiver_id)
                    .with_key(idempotency_key);
                let credit = NewTransaction::credit(*receiver_id, amount).related_to(*sender_id);

                match self.ledger.record_pair_if_new(debit, credit) {
                    Ok((transaction, true)) => {
                        info!(
                            sender = %sender_id,
                            receiver = %receiver_id,
                            %amount,
                            transaction = %transaction.id,
                            "transfer applied"
                        );
                        Ok(TransferOutcome {
                            sender: debited,
                            receiver: credited,
                        })
                    }
                    Ok((existing, false)) => {
                        roll_back(receiver, amount)?;
                        roll_back(sender, -amount)?;
                        self.resolve_claimed_key(&existing, sender_id, TransactionType::Debit)?;
                        Ok(snapshot(sender, receiver))
                    }
                    Err(e) => {
                        roll_back(receiver, amount)?;
                        roll_back(sender, -amount)?;
                        Err(e)
                    }
                }
            })
    }

    /// Verify `balance = credits - debits` for one wallet
    ///
    /// Runs under the wallet's lock, so no mutation of the wallet can be half
    /// way through while the history is summed.
    pub fn audit_wallet(&self, wallet_id: &WalletId) -> Result<Wallet, LedgerError> {
        self.wallets.update(wallet_id, |entry| {
            let net: Decimal = self
                .ledger
                .list_by_wallet(wallet_id)
                .iter()
                .map(Transaction::signed_amount)
                .sum();

            if net != entry.balance() {
                error!(
                    wallet = %wallet_id,
                    balance = %entry.balance(),
                    ledger_net = %net,
                    "balance diverged from ledger"
                );
                return Err(LedgerError::internal_inconsistency(format!(
                    "wallet {} balance {} does not match ledger net {}",
                    wallet_id,
                    entry.balance(),
                    net
                )));
            }

            Ok(entry.wallet().clone())
        })
    }

    /// Audit every wallet, stopping at the first divergence
    pub fn audit(&self) -> Result<(), LedgerError> {
        for wallet in self.wallets.all() {
            self.audit_wallet(&wallet.id)?;
        }
        Ok(())
    }

    /// Whether `key` already produced an operation of `tx_type` on `wallet_id`
    ///
    /// A key bound to any other effect is a conflict: replaying it would
    /// either double-apply or silently drop the caller's request.
    fn prior_effect(
        &self,
        key: &str,
        wallet_id: &WalletId,
        tx_type: TransactionType,
    ) -> Result<bool, LedgerError> {
        match self.ledger.find_by_key(key) {
            None => Ok(false),
            Some(existing) if existing.is_effect_of(wallet_id, tx_type) => Ok(true),
            Some(existing) => {
                warn!(
                    key,
                    bound_wallet = %existing.wallet_id,
                    bound_type = %existing.tx_type,
                    requested_wallet = %wallet_id,
                    requested_type = %tx_type,
                    "idempotency key reused for a different operation"
                );
                Err(LedgerError::idempotency_key_conflict(key))
            }
        }
    }

    /// The key was claimed by a concurrent operation after our own check
    fn resolve_claimed_key(
        &self,
        existing: &Transaction,
        wallet_id: &WalletId,
        tx_type: TransactionType,
    ) -> Result<(), LedgerError> {
        let key = existing.idempotency_key.as_deref().unwrap_or_default();
        if existing.is_effect_of(wallet_id, tx_type) {
            debug!(wallet = %wallet_id, key, "concurrent retry won, adjustment undone");
            Ok(())
        } else {
            warn!(key, wallet = %wallet_id, "idempotency key claimed concurrently by a different operation");
            Err(LedgerError::idempotency_key_conflict(key))
        }
    }
}

fn ensure_positive(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::invalid_amount(amount));
    }
    Ok(())
}

fn snapshot(sender: &WalletEntry<'_>, receiver: &WalletEntry<'_>) -> TransferOutcome {
    TransferOutcome {
        sender: sender.wallet().clone(),
        receiver: receiver.wallet().clone(),
    }
}

/// Undo an adjustment of `applied` made under the same lock
///
/// Reversing a successful adjustment cannot fail unless the balance changed
/// underneath the lock, which is an invariant violation.
fn roll_back(entry: &mut WalletEntry<'_>, applied: Decimal) -> Result<(), LedgerError> {
    entry.adjust(-applied).map(|_| ()).map_err(|e| {
        error!(wallet = %entry.id(), %applied, error = %e, "rollback failed");
        LedgerError::internal_inconsistency(format!(
            "could not undo adjustment of {} on wallet {}: {}",
            applied,
            entry.id(),
            e
        ))
    })
}
