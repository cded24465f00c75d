//! Replay strategy module
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! encompassing both CSV parsing and command processing. This allows different
//! implementations (synchronous, asynchronous batch) to be selected at runtime.

use crate::cli::StrategyType;
use crate::core::CommandProcessor;
use crate::io::write_wallets_csv;
use crate::types::{CommandRecord, LedgerError};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, warn};

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Replay strategy trait for complete command processing pipelines
///
/// Each strategy reads commands from a CSV file and applies them to a fresh
/// `CommandProcessor`. Both strategies must leave the processor in the same
/// final state for the same input.
pub trait ProcessingStrategy: Send + Sync {
    /// Replay every command in `input_path`
    ///
    /// # Returns
    ///
    /// * `Ok` with the processor holding the final wallets and ledger
    /// * `Err(LedgerError)` if the file cannot be read or a command hit an
    ///   internal inconsistency
    ///
    /// Malformed rows and rejected commands are logged and skipped.
    fn replay(&self, input_path: &Path) -> Result<Arc<CommandProcessor>, LedgerError>;

    /// Replay `input_path` and write the wallet summaries to `output`
    ///
    /// Returns the processor so callers can export history or audit it.
    fn process(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<Arc<CommandProcessor>, LedgerError> {
        let processor = self.replay(input_path)?;
        write_wallets_csv(&processor.summaries()?, output)?;
        Ok(processor)
    }
}

/// Log a rejected command; only fatal errors stop the replay
pub(crate) fn check_outcome(
    record: &CommandRecord,
    result: Result<(), LedgerError>,
) -> Result<(), LedgerError> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_fatal() => {
            error!(command = record.command.as_str(), wallet = %record.wallet, error = %e, "replay aborted");
            Err(e)
        }
        Err(e) => {
            warn!(command = record.command.as_str(), wallet = %record.wallet, error = %e, "command rejected");
            Ok(())
        }
    }
}

/// Create a replay strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of strategy to create (Sync or Async)
/// * `config` - Optional configuration for async batch processing (ignored for sync)
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config))
        }
    }
}
