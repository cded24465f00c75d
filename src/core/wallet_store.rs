//! Thread-safe wallet storage
//!
//! This module provides `InMemoryWalletStore`, which owns every wallet record
//! and is the only place a balance can change.
//!
//! # Design
//!
//! Wallets live in a `DashMap` keyed by `WalletId`. Each value is an
//! `Arc<Mutex<Wallet>>`, so a caller can hold exclusive access to one wallet
//! (or two) without holding any DashMap shard lock. Two wallets in the same
//! shard can therefore be locked together without self-deadlock.
//!
//! # Lock Ordering
//!
//! `update_pair` always acquires the lower `WalletId` first. Two transfers
//! moving funds in opposite directions between the same pair of wallets
//! contend for the same first lock instead of deadlocking.

use crate::core::traits::WalletStore;
use crate::types::{Currency, LedgerError, Wallet, WalletId};
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

type WalletSlot = Arc<Mutex<Wallet>>;

/// Exclusive handle on one wallet while its lock is held
///
/// The balance can only change through [`WalletEntry::adjust`], which keeps
/// the non-negative invariant in one place.
#[derive(Debug)]
pub struct WalletEntry<'a> {
    wallet: &'a mut Wallet,
}

impl<'a> WalletEntry<'a> {
    fn new(wallet: &'a mut Wallet) -> Self {
        Self { wallet }
    }

    pub fn wallet(&self) -> &Wallet {
        self.wallet
    }

    pub fn id(&self) -> WalletId {
        self.wallet.id
    }

    pub fn balance(&self) -> Decimal {
        self.wallet.balance
    }

    /// Apply `balance += delta`
    ///
    /// # Errors
    ///
    /// * `InsufficientBalance` - the result would be negative
    /// * `ArithmeticOverflow` - the result does not fit in a `Decimal`
    ///
    /// On error the balance is unchanged.
    pub fn adjust(&mut self, delta: Decimal) -> Result<Wallet, LedgerError> {
        let id = self.wallet.id;
        let next = self
            .wallet
            .balance
            .checked_add(delta)
            .ok_or_else(|| LedgerError::arithmetic_overflow("adjust", id))?;

        if next < Decimal::ZERO {
            return Err(LedgerError::insufficient_balance(
                id,
                -delta,
                self.wallet.balance,
            ));
        }

        self.wallet.balance = next;
        Ok(self.wallet.clone())
    }
}

/// Thread-safe wallet store backed by memory
///
/// # Thread Safety
///
/// - Operations on different wallets never block each other beyond a brief
///   DashMap shard read
/// - Operations on the same wallet are serialized by its mutex
/// - Returned `Wallet` values are snapshots
#[derive(Debug, Default)]
pub struct InMemoryWalletStore {
    wallets: DashMap<WalletId, WalletSlot>,
}

impl InMemoryWalletStore {
    pub fn new() -> Self {
        Self {
            wallets: DashMap::new(),
        }
    }

    /// Number of wallets in the store
    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    /// Clone the wallet's slot out of the map so the shard lock is released
    /// before the wallet mutex is taken.
    fn slot(&self, id: &WalletId) -> Result<WalletSlot, LedgerError> {
        self.wallets
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LedgerError::wallet_not_found(*id))
    }
}

impl WalletStore for InMemoryWalletStore {
    fn create(&self, currency: Currency) -> Wallet {
        let wallet = Wallet::new(currency);
        self.wallets
            .insert(wallet.id, Arc::new(Mutex::new(wallet.clone())));
        info!(wallet = %wallet.id, currency = %currency, "wallet created");
        wallet
    }

    fn get(&self, id: &WalletId) -> Result<Wallet, LedgerError> {
        let slot = self.slot(id)?;
        let wallet = slot.lock().clone();
        Ok(wallet)
    }

    fn adjust(&self, id: &WalletId, delta: Decimal) -> Result<Wallet, LedgerError> {
        self.update(id, |entry| entry.adjust(delta))
    }

    fn update<R, F>(&self, id: &WalletId, f: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&mut WalletEntry<'_>) -> Result<R, LedgerError>,
    {
        let slot = self.slot(id)?;
        let mut guard = slot.lock();
        f(&mut WalletEntry::new(&mut guard))
    }

    fn update_pair<R, F>(&self, first: &WalletId, second: &WalletId, f: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&mut WalletEntry<'_>, &mut WalletEntry<'_>) -> Result<R, LedgerError>,
    {
        if first == second {
            return Err(LedgerError::self_transfer(*first));
        }

        let first_slot = self.slot(first)?;
        let second_slot = self.slot(second)?;

        let (mut first_guard, mut second_guard) = if first < second {
            let a = first_slot.lock();
            let b = second_slot.lock();
            (a, b)
        } else {
            let b = second_slot.lock();
            let a = first_slot.lock();
            (a, b)
        };

        f(
            &mut WalletEntry::new(&mut first_guard),
            &mut WalletEntry::new(&mut second_guard),
        )
    }

    fn all(&self) -> Vec<Wallet> {
        let slots: Vec<WalletSlot> = self
            .wallets
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        slots.iter().map(|slot| slot.lock().clone()).collect()
    }
}
