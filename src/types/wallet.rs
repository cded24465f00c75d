//! Wallet-related types for the wallet ledger
//!
//! This module defines the Wallet structure, its identifier and the closed
//! set of supported currencies.

use super::error::LedgerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Wallet identifier
///
/// Opaque and globally unique. The total order over identifiers is what
/// fixes the lock acquisition order when two wallets are held at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(Uuid);

impl WalletId {
    /// Allocate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for WalletId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for WalletId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Currencies a wallet can be denominated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            _ => Err(LedgerError::unsupported_currency(s)),
        }
    }
}

/// Wallet state
///
/// Holds a non-negative balance in a single currency. Wallets are created
/// with a zero balance and are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique wallet identifier
    pub id: WalletId,

    /// Denomination of the balance
    pub currency: Currency,

    /// Current balance
    ///
    /// Never negative at any observable instant. Only changes through the
    /// wallet store's adjust operation.
    pub balance: Decimal,
}

impl Wallet {
    /// Create a new wallet with a fresh identifier and zero balance
    pub fn new(currency: Currency) -> Self {
        Wallet {
            id: WalletId::generate(),
            currency,
            balance: Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_new_wallet_starts_empty() {
        let wallet = Wallet::new(Currency::Usd);
        assert_eq!(wallet.balance, Decimal::ZERO);
        assert_eq!(wallet.currency, Currency::Usd);
    }

    #[test]
    fn test_wallet_ids_are_unique() {
        let a = Wallet::new(Currency::Usd);
        let b = Wallet::new(Currency::Usd);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_wallet_id_round_trips_through_display() {
        let id = WalletId::generate();
        let parsed: WalletId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[rstest]
    #[case("USD")]
    #[case("usd")]
    #[case(" Usd ")]
    fn test_currency_parses_case_insensitively(#[case] input: &str) {
        assert_eq!(input.parse::<Currency>().unwrap(), Currency::Usd);
    }

    #[rstest]
    #[case("EUR")]
    #[case("")]
    fn test_currency_rejects_unknown_codes(#[case] input: &str) {
        assert_eq!(
            input.parse::<Currency>().unwrap_err(),
            LedgerError::unsupported_currency(input)
        );
    }

    #[test]
    fn test_currency_serializes_as_code() {
        let wallet = Wallet::new(Currency::Usd);
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(vec![]);
        writer.serialize(wallet.currency).unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(out.trim(), "USD");
    }
}
