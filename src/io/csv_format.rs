//! CSV format handling for command scripts and wallet reports
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to domain commands
//! - Wallet summary and history serialization
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::types::{CommandRecord, CommandType, Currency, HistoryEntry, LedgerError, WalletSummary};
use chrono::SecondsFormat;
use csv::Writer;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns:
/// type, wallet, counterparty, amount, currency, key.
/// Everything after `wallet` is optional since each command uses a
/// different subset.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct CsvRecord {
    #[serde(rename = "type")]
    pub command: String,
    pub wallet: String,
    pub counterparty: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub key: Option<String>,
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Convert a CsvRecord to a CommandRecord
///
/// This function:
/// - Parses the command string (case-insensitive)
/// - Parses the amount into a Decimal (if present)
/// - Validates that `fund` and `transfer` carry an amount
/// - Validates that `transfer` names a counterparty
/// - Parses the currency, defaulting to USD
///
/// Amount sign and wallet existence are checked by the core, not here.
///
/// # Returns
///
/// * `Ok(CommandRecord)` - Successfully converted record
/// * `Err(LedgerError)` - `InvalidCommandType`, `MissingField`,
///   `UnsupportedCurrency` or `ParseError` for an unparseable amount
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<CommandRecord, LedgerError> {
    let command = match csv_record.command.trim().to_lowercase().as_str() {
        "create" => CommandType::Create,
        "fund" => CommandType::Fund,
        "transfer" => CommandType::Transfer,
        _ => return Err(LedgerError::invalid_command_type(&csv_record.command)),
    };

    let wallet = csv_record.wallet.trim().to_string();
    if wallet.is_empty() {
        return Err(LedgerError::missing_field(command.as_str(), &wallet, "a wallet label"));
    }

    let amount = match non_empty(csv_record.amount) {
        Some(amount_str) => match Decimal::from_str(&amount_str) {
            Ok(decimal) => Some(decimal),
            Err(_) => {
                return Err(LedgerError::ParseError {
                    line: None,
                    message: format!("Invalid amount '{}' for wallet '{}'", amount_str, wallet),
                })
            }
        },
        None => None,
    };

    let counterparty = non_empty(csv_record.counterparty);

    match command {
        CommandType::Fund | CommandType::Transfer if amount.is_none() => {
            return Err(LedgerError::missing_field(command.as_str(), &wallet, "an amount"));
        }
        CommandType::Transfer if counterparty.is_none() => {
            return Err(LedgerError::missing_field(command.as_str(), &wallet, "a counterparty"));
        }
        // Fields a command does not use are ignored
        _ => {}
    }

    let currency = match non_empty(csv_record.currency) {
        Some(code) => code.parse::<Currency>()?,
        None => Currency::default(),
    };

    Ok(CommandRecord {
        command,
        wallet,
        counterparty,
        amount,
        currency,
        idempotency_key: non_empty(csv_record.key),
    })
}

/// Attach a 1-based input line to a record error
///
/// Conversion errors become `ParseError`s so the line survives; the original
/// message is kept.
pub fn at_line(error: LedgerError, line: u64) -> LedgerError {
    let message = match error {
        LedgerError::ParseError { message, .. } => message,
        other => other.to_string(),
    };

    LedgerError::ParseError {
        line: Some(line),
        message,
    }
}

fn write_failed(what: &str, error: csv::Error) -> LedgerError {
    LedgerError::IoError {
        message: format!("Failed to write {}: {}", what, error),
    }
}

/// Write wallet summaries to CSV format
///
/// Columns: wallet, currency, balance, credits, debits.
/// Rows are sorted by label for deterministic output and balances carry
/// four decimal places.
pub fn write_wallets_csv(
    summaries: &[WalletSummary],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["wallet", "currency", "balance", "credits", "debits"])
        .map_err(|e| write_failed("CSV header", e))?;

    let mut sorted: Vec<&WalletSummary> = summaries.iter().collect();
    sorted.sort_by(|a, b| a.label.cmp(&b.label));

    for summary in sorted {
        writer
            .write_record(&[
                summary.label.clone(),
                summary.wallet.currency.to_string(),
                format!("{:.4}", summary.wallet.balance),
                summary.credits.to_string(),
                summary.debits.to_string(),
            ])
            .map_err(|e| write_failed("wallet record", e))?;
    }

    writer.flush()?;

    Ok(())
}

/// Write transaction history to CSV format
///
/// Columns: wallet, type, amount, counterparty, key, transaction, timestamp.
/// Entries are written in the order given.
pub fn write_history_csv(
    entries: &[HistoryEntry],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record([
            "wallet",
            "type",
            "amount",
            "counterparty",
            "key",
            "transaction",
            "timestamp",
        ])
        .map_err(|e| write_failed("CSV header", e))?;

    for entry in entries {
        let transaction = &entry.transaction;
        writer
            .write_record(&[
                entry.label.clone(),
                transaction.tx_type.to_string(),
                format!("{:.4}", transaction.amount),
                entry.counterparty.clone().unwrap_or_default(),
                transaction.idempotency_key.clone().unwrap_or_default(),
                transaction.id.to_string(),
                transaction
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::Micros, true),
            ])
            .map_err(|e| write_failed("history record", e))?;
    }

    writer.flush()?;

    Ok(())
}
