//! Asynchronous batch replay strategy
//!
//! This module provides a multi-threaded implementation of the
//! ProcessingStrategy trait. Commands are read in batches and each batch is
//! split into independent groups that run concurrently.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     └── BatchProcessor (conflict partitioning + tokio tasks)
//!         └── CommandProcessor (label directory + coordinator)
//! ```
//!
//! # Ordering
//!
//! - Batches run one after another, so a wallet's commands spanning two
//!   batches keep their order
//! - Inside a batch, commands that share a wallet label or idempotency key
//!   run sequentially in file order; everything else runs in parallel
//!
//! The final state therefore equals the sync strategy's.

use crate::core::{BatchProcessor, CommandProcessor};
use crate::io::async_reader::AsyncReader;
use crate::io::sync_reader::open_error;
use crate::strategy::{check_outcome, ProcessingStrategy};
use crate::types::LedgerError;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Configuration for batch processing
#[derive(Clone, Debug, PartialEq)]
pub struct BatchConfig {
    /// Number of commands read per batch
    pub batch_size: usize,

    /// Worker threads of the tokio runtime
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a configuration, replacing zero values with defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                fallback = default.batch_size,
                "invalid batch size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                max_concurrent_batches,
                fallback = default.max_concurrent_batches,
                "invalid concurrency, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Batched, partitioned replay on a multi-threaded tokio runtime
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn replay(&self, input_path: &Path) -> Result<Arc<CommandProcessor>, LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| LedgerError::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        runtime.block_on(async {
            let processor = BatchProcessor::new(Arc::new(CommandProcessor::new()));

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| open_error(input_path, e))?;

            // csv-async reads through the futures I/O traits
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);
            let mut applied = 0usize;

            while let Some(batch) = reader.read_batch(self.config.batch_size).await {
                if batch.is_empty() {
                    continue;
                }
                debug!(size = batch.len(), "processing batch");

                for outcome in processor.process_batch(batch).await? {
                    if outcome.result.is_ok() {
                        applied += 1;
                    }
                    check_outcome(&outcome.record, outcome.result)?;
                }
            }

            info!(applied, path = %input_path.display(), "replay finished");
            Ok::<_, LedgerError>(Arc::clone(processor.processor()))
        })
    }
}
