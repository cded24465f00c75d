//! Core business logic module
//!
//! This module contains the wallet ledger components:
//! - `traits` - Storage abstractions the coordinator is written against
//! - `wallet_store` - Wallet records with per-wallet exclusive access
//! - `transaction_ledger` - Append-only transaction log with idempotency key index
//! - `coordinator` - Fund and transfer orchestration
//! - `processor` - Command replay over labelled wallets
//! - `batch_processor` - Concurrent replay of independent command groups

pub mod batch_processor;
pub mod coordinator;
pub mod processor;
pub mod traits;
pub mod transaction_ledger;
pub mod wallet_store;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use coordinator::{TransferCoordinator, TransferOutcome, WalletDetails};
pub use processor::CommandProcessor;
pub use traits::{TransactionLedger, WalletStore};
pub use transaction_ledger::InMemoryLedger;
pub use wallet_store::{InMemoryWalletStore, WalletEntry};
