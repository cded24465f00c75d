//! Command replay against the transfer coordinator
//!
//! `CommandProcessor` binds the caller-chosen wallet labels of a replay
//! script to `WalletId`s and routes each command to the coordinator. Both
//! strategies drive the same processor, so their results can only differ in
//! the order commands reach it.
//!
//! # Thread Safety
//!
//! The label directory is a `DashMap` and the coordinator is shared state,
//! so a processor can be wrapped in `Arc` and driven from many tasks at once.

use std::collections::HashMap;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use super::coordinator::TransferCoordinator;
use crate::types::{
    CommandRecord, CommandType, HistoryEntry, LedgerError, TransactionType, WalletId,
    WalletSummary,
};

/// Replays wallet commands and reports the resulting wallets
#[derive(Default)]
pub struct CommandProcessor {
    coordinator: TransferCoordinator,

    /// Label to wallet bindings made by `create` commands
    labels: DashMap<String, WalletId>,
}

impl CommandProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coordinator(coordinator: TransferCoordinator) -> Self {
        Self {
            coordinator,
            labels: DashMap::new(),
        }
    }

    pub fn coordinator(&self) -> &TransferCoordinator {
        &self.coordinator
    }

    /// Wallet bound to `label`, if one was created
    pub fn wallet_id(&self, label: &str) -> Option<WalletId> {
        self.labels.get(label).map(|id| *id)
    }

    /// Apply one command
    ///
    /// # Arguments
    ///
    /// * `record` - The parsed command
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the command was applied (or replayed idempotently)
    /// * `Err(LedgerError::DuplicateWallet)` if `create` reuses a bound label
    /// * `Err(LedgerError::MissingField)` if a required field is absent
    /// * Any error the coordinator returns for `fund` and `transfer`
    pub fn process(&self, record: CommandRecord) -> Result<(), LedgerError> {
        match record.command {
            CommandType::Create => self.create(record),
            CommandType::Fund => self.fund(record),
            CommandType::Transfer => self.transfer(record),
        }
    }

    fn create(&self, record: CommandRecord) -> Result<(), LedgerError> {
        match self.labels.entry(record.wallet) {
            Entry::Occupied(entry) => Err(LedgerError::duplicate_wallet(entry.key())),
            Entry::Vacant(entry) => {
                let wallet = self.coordinator.create_wallet(record.currency);
                debug!(label = %entry.key(), wallet = %wallet.id, "label bound");
                entry.insert(wallet.id);
                Ok(())
            }
        }
    }

    fn fund(&self, record: CommandRecord) -> Result<(), LedgerError> {
        let amount = record.amount.ok_or_else(|| {
            LedgerError::missing_field(record.command.as_str(), &record.wallet, "an amount")
        })?;

        let wallet_id = self.resolve(&record.wallet);
        self.coordinator
            .fund(&wallet_id, amount, record.idempotency_key.as_deref())?;
        Ok(())
    }

    fn transfer(&self, record: CommandRecord) -> Result<(), LedgerError> {
        let counterparty = record.counterparty.as_deref().ok_or_else(|| {
            LedgerError::missing_field(record.command.as_str(), &record.wallet, "a counterparty")
        })?;
        let amount = record.amount.ok_or_else(|| {
            LedgerError::missing_field(record.command.as_str(), &record.wallet, "an amount")
        })?;

        let sender = self.resolve(&record.wallet);
        let receiver = self.resolve(counterparty);
        self.coordinator.transfer(
            &sender,
            &receiver,
            amount,
            record.idempotency_key.as_deref(),
        )?;
        Ok(())
    }

    /// Unbound labels map to an id no wallet has, so the core reports it
    fn resolve(&self, label: &str) -> WalletId {
        self.wallet_id(label).unwrap_or_else(WalletId::generate)
    }

    fn bindings(&self) -> Vec<(String, WalletId)> {
        let mut bindings: Vec<(String, WalletId)> = self
            .labels
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }

    /// Final state of every labelled wallet, sorted by label
    pub fn summaries(&self) -> Result<Vec<WalletSummary>, LedgerError> {
        self.bindings()
            .into_iter()
            .map(|(label, id)| {
                let details = self.coordinator.wallet_details(&id)?;
                let credits = details
                    .history
                    .iter()
                    .filter(|tx| tx.tx_type == TransactionType::Credit)
                    .count();

                Ok(WalletSummary {
                    label,
                    wallet: details.wallet,
                    credits,
                    debits: details.history.len() - credits,
                })
            })
            .collect()
    }

    /// Every labelled wallet's transactions
    ///
    /// Grouped by label in sorted order, most recent first within a wallet.
    pub fn history(&self) -> Vec<HistoryEntry> {
        let bindings = self.bindings();
        let by_id: HashMap<WalletId, &str> = bindings
            .iter()
            .map(|(label, id)| (*id, label.as_str()))
            .collect();
        let by_id = &by_id;

        bindings
            .iter()
            .flat_map(|(label, id)| {
                self.coordinator
                    .list_transactions(id)
                    .into_iter()
                    .map(move |transaction| HistoryEntry {
                        label: label.clone(),
                        counterparty: transaction
                            .related_wallet_id
                            .and_then(|related| by_id.get(&related))
                            .map(|label| label.to_string()),
                        transaction,
                    })
            })
            .collect()
    }

    /// Check every wallet's balance against its ledger records
    pub fn audit(&self) -> Result<(), LedgerError> {
        self.coordinator.audit()
    }
}
