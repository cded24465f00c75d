//! Wallet Ledger Library
//! # Overview
//!
//! This library provides single-currency wallets with an append-only,
//! idempotent transaction ledger, plus a CSV command replay driver with a
//! sync and an async strategy.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Wallet, Transaction, LedgerError, etc.)
//! - [`core`] - Business logic components:
//!   - [`core::wallet_store`] - Wallet records with per-wallet exclusive access
//!   - [`core::transaction_ledger`] - Append-only log with an idempotency key index
//!   - [`core::coordinator`] - Fund and transfer orchestration
//!   - [`core::processor`] - Command replay over labelled wallets
//! - [`io`] - CSV command parsing and report output
//! - [`strategy`] - Sync and async replay pipelines
//! - [`cli`] - CLI arguments parsing
//! - [`logging`] - Tracing subscriber setup
//!
//! # Operations
//!
//! - **Fund**: Credit a wallet, recording one CREDIT
//! - **Transfer**: Move funds between two wallets, recording a DEBIT on the
//!   sender and a CREDIT on the receiver in one atomic step
//!
//! Both accept an optional idempotency key; retrying with the same key
//! returns the current state without applying the operation again.
//!
//! # Invariants
//!
//! - A balance is never negative
//! - A balance always equals its wallet's credits minus its debits
//! - A failed operation has no observable effect

pub mod cli;
pub mod core;
pub mod io;
pub mod logging;
pub mod strategy;
pub mod types;

pub use core::{
    CommandProcessor, InMemoryLedger, InMemoryWalletStore, TransactionLedger, TransferCoordinator,
    TransferOutcome, WalletDetails, WalletStore,
};
pub use io::{write_history_csv, write_wallets_csv};
pub use types::{
    Currency, LedgerError, NewTransaction, Transaction, TransactionId, TransactionType, Wallet,
    WalletId,
};
