//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `wallet`: Wallet, its identifier and currency
//! - `transaction`: Ledger records and identifiers
//! - `command`: Replay script commands
//! - `report`: Output rows produced after a replay
//! - `error`: Error types for the wallet ledger

pub mod command;
pub mod error;
pub mod report;
pub mod transaction;
pub mod wallet;

pub use command::{CommandRecord, CommandType};
pub use error::LedgerError;
pub use report::{HistoryEntry, WalletSummary};
pub use transaction::{NewTransaction, Transaction, TransactionId, TransactionType};
pub use wallet::{Currency, Wallet, WalletId};
