//! Synchronous replay strategy
//!
//! Single-threaded implementation of the ProcessingStrategy trait. Commands
//! are streamed from `SyncReader` and applied in file order, which makes this
//! strategy the reference result the async strategy must reproduce.

use crate::core::CommandProcessor;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{check_outcome, ProcessingStrategy};
use crate::types::LedgerError;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Streaming, in-order replay
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

impl ProcessingStrategy for SyncProcessingStrategy {
    fn replay(&self, input_path: &Path) -> Result<Arc<CommandProcessor>, LedgerError> {
        let processor = CommandProcessor::new();
        let reader = SyncReader::new(input_path)?;
        let mut applied = 0usize;

        for result in reader {
            match result {
                Ok(record) => {
                    let outcome = processor.process(record.clone());
                    if outcome.is_ok() {
                        applied += 1;
                    }
                    check_outcome(&record, outcome)?;
                }
                Err(e) => warn!(error = %e, "skipping malformed command"),
            }
        }

        info!(applied, path = %input_path.display(), "replay finished");
        Ok(Arc::new(processor))
    }
}
