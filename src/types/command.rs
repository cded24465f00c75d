//! Wallet command records replayed by the CLI driver
//!
//! A command script refers to wallets by caller-chosen labels rather than
//! identifiers; the driver binds each label to a `WalletId` when the wallet
//! is created.

use super::wallet::Currency;
use rust_decimal::Decimal;

/// Commands accepted in a replay script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    /// Create a wallet and bind it to the label
    Create,

    /// Credit the labelled wallet
    Fund,

    /// Move funds from the labelled wallet to the counterparty
    Transfer,
}

impl CommandType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Create => "create",
            CommandType::Fund => "fund",
            CommandType::Transfer => "transfer",
        }
    }
}

/// One parsed command from the replay script
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRecord {
    pub command: CommandType,

    /// Label of the wallet the command acts on (sender for a transfer)
    pub wallet: String,

    /// Receiver label, present for transfers only
    pub counterparty: Option<String>,

    /// Amount for fund and transfer; `None` for create
    pub amount: Option<Decimal>,

    /// Denomination for create (defaults to USD)
    pub currency: Currency,

    pub idempotency_key: Option<String>,
}

impl CommandRecord {
    /// Everything two commands must not share to be applied in either order
    ///
    /// Wallet labels and idempotency keys, namespaced so a label and a key
    /// with the same text never collide.
    pub fn conflict_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::with_capacity(3);
        tokens.push(format!("wallet:{}", self.wallet));
        if let Some(counterparty) = &self.counterparty {
            tokens.push(format!("wallet:{}", counterparty));
        }
        if let Some(key) = &self.idempotency_key {
            tokens.push(format!("key:{}", key));
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_tokens_cover_labels_and_key() {
        let record = CommandRecord {
            command: CommandType::Transfer,
            wallet: "alice".to_string(),
            counterparty: Some("bob".to_string()),
            amount: Some(Decimal::ONE),
            currency: Currency::Usd,
            idempotency_key: Some("alice".to_string()),
        };

        assert_eq!(
            record.conflict_tokens(),
            vec!["wallet:alice", "wallet:bob", "key:alice"]
        );
    }

    #[test]
    fn test_conflict_tokens_for_create() {
        let record = CommandRecord {
            command: CommandType::Create,
            wallet: "carol".to_string(),
            counterparty: None,
            amount: None,
            currency: Currency::Usd,
            idempotency_key: None,
        };

        assert_eq!(record.conflict_tokens(), vec!["wallet:carol"]);
    }
}
