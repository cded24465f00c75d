//! Output rows produced after a replay

use super::transaction::Transaction;
use super::wallet::Wallet;

/// Final state of one labelled wallet
#[derive(Debug, Clone, PartialEq)]
pub struct WalletSummary {
    pub label: String,
    pub wallet: Wallet,

    /// Number of CREDIT legs recorded for the wallet
    pub credits: usize,

    /// Number of DEBIT legs recorded for the wallet
    pub debits: usize,
}

/// One transaction in a labelled wallet's history
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub label: String,

    /// Label of the related wallet for transfer legs
    pub counterparty: Option<String>,

    pub transaction: Transaction,
}
