//! Error types for the wallet ledger
//!
//! This module defines all error types that can occur while operating on
//! wallets or replaying a command script.
//!
//! # Error Categories
//!
//! - **Ledger Errors**: Unknown wallets, insufficient balance, self transfers,
//!   invalid amounts, idempotency key conflicts
//! - **Arithmetic Errors**: Overflow in balance calculations
//! - **Consistency Errors**: A balance and its ledger records diverged (fatal)
//! - **Input Errors**: File not found, malformed CSV, unknown commands

use super::wallet::WalletId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the wallet ledger
///
/// Every failed core operation returns one of these with zero observable
/// effect on wallets or the ledger. Only `InternalInconsistency` is fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Referenced wallet id does not exist
    #[error("Wallet {wallet} not found")]
    WalletNotFound {
        /// The wallet that was not found
        wallet: WalletId,
    },

    /// Debit would drive the balance negative
    #[error("Wallet {wallet} has insufficient balance: required {required}, current {current}")]
    InsufficientBalance {
        /// Wallet being debited
        wallet: WalletId,
        /// Amount the operation needed
        required: Decimal,
        /// Balance at the time of the attempt
        current: Decimal,
    },

    /// Sender and receiver of a transfer are the same wallet
    #[error("Cannot transfer funds from wallet {wallet} to itself")]
    SelfTransfer {
        /// The wallet on both sides
        wallet: WalletId,
    },

    /// Amount is zero or negative
    #[error("Invalid amount {amount}: must be greater than zero")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Idempotency key already produced a different operation's effect
    ///
    /// Keys are scoped to the whole ledger, so a key used for funding one
    /// wallet cannot be reused for another wallet or for a transfer.
    #[error("Idempotency key '{key}' is already bound to a different operation")]
    IdempotencyKeyConflict {
        /// The reused key
        key: String,
    },

    /// Arithmetic overflow would occur
    #[error("Arithmetic overflow in {operation} for wallet {wallet}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Wallet being adjusted
        wallet: WalletId,
    },

    /// A balance mutation and its ledger record diverged
    ///
    /// Never occurs while mutations and records are made under the same
    /// wallet locks. If observed it must be surfaced, never swallowed.
    #[error("Internal inconsistency: {message}")]
    InternalInconsistency {
        /// What diverged
        message: String,
    },

    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    ///
    /// The malformed record is skipped and replay continues.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// Unknown command in the replay script
    #[error("Invalid command type '{command}'")]
    InvalidCommandType {
        /// The unrecognized command string
        command: String,
    },

    /// A command is missing a field it requires
    #[error("{command} command for wallet '{wallet}' requires {field}")]
    MissingField {
        /// Command that requires the field
        command: String,
        /// Wallet label of the command
        wallet: String,
        /// Name of the missing field
        field: String,
    },

    /// Currency outside the supported set
    #[error("Unsupported currency '{currency}'")]
    UnsupportedCurrency {
        /// The rejected currency code
        currency: String,
    },

    /// A wallet label was created twice in one script
    #[error("Wallet label '{label}' is already bound")]
    DuplicateWallet {
        /// The label that is already bound
        label: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Whether the error signals a broken invariant rather than a rejected request
    pub fn is_fatal(&self) -> bool {
        matches!(self, LedgerError::InternalInconsistency { .. })
    }

    pub fn wallet_not_found(wallet: WalletId) -> Self {
        LedgerError::WalletNotFound { wallet }
    }

    pub fn insufficient_balance(wallet: WalletId, required: Decimal, current: Decimal) -> Self {
        LedgerError::InsufficientBalance {
            wallet,
            required,
            current,
        }
    }

    pub fn self_transfer(wallet: WalletId) -> Self {
        LedgerError::SelfTransfer { wallet }
    }

    pub fn invalid_amount(amount: Decimal) -> Self {
        LedgerError::InvalidAmount { amount }
    }

    pub fn idempotency_key_conflict(key: &str) -> Self {
        LedgerError::IdempotencyKeyConflict {
            key: key.to_string(),
        }
    }

    pub fn arithmetic_overflow(operation: &str, wallet: WalletId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            wallet,
        }
    }

    pub fn internal_inconsistency(message: impl Into<String>) -> Self {
        LedgerError::InternalInconsistency {
            message: message.into(),
        }
    }

    pub fn invalid_command_type(command: &str) -> Self {
        LedgerError::InvalidCommandType {
            command: command.to_string(),
        }
    }

    pub fn missing_field(command: &str, wallet: &str, field: &str) -> Self {
        LedgerError::MissingField {
            command: command.to_string(),
            wallet: wallet.to_string(),
            field: field.to_string(),
        }
    }

    pub fn unsupported_currency(currency: &str) -> Self {
        LedgerError::UnsupportedCurrency {
            currency: currency.to_string(),
        }
    }

    pub fn duplicate_wallet(label: &str) -> Self {
        LedgerError::DuplicateWallet {
            label: label.to_string(),
        }
    }
}
