//! Batch processing with conflict-based partitioning for async replay
//!
//! This module provides the `BatchProcessor` struct, which runs a batch of
//! commands as independent groups on tokio tasks while keeping the outcome
//! identical to applying the batch in file order.
//!
//! # Design
//!
//! Two commands conflict when they name the same wallet label or the same
//! idempotency key (see [`CommandRecord::conflict_tokens`]). The batch is
//! split into the connected components of that relation with a union-find:
//!
//! - commands in different groups touch disjoint wallets and keys, so they
//!   commute and can run concurrently
//! - commands in one group run sequentially in their original file order
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── Arc<CommandProcessor>  (shared label directory + coordinator)
//! ```
//!
//! # Thread Safety
//!
//! The processor is cloneable and can be safely shared across async tasks.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::error;

use super::processor::CommandProcessor;
use crate::types::{CommandRecord, LedgerError};

/// Result of processing a single command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The command that was processed
    pub record: CommandRecord,

    /// The result of processing (success or error)
    pub result: Result<(), LedgerError>,
}

/// Batch processor with conflict-based partitioning
#[derive(Clone, Default)]
pub struct BatchProcessor {
    /// Wrapped in Arc to enable sharing across async tasks.
    processor: Arc<CommandProcessor>,
}

/// Disjoint-set forest over command indices
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            self.parent[node] = self.parent[self.parent[node]];
            node = self.parent[node];
        }
        node
    }

    /// Keeps the smaller index as root so group roots follow file order
    fn union(&mut self, a: usize, b: usize) {
        let (a, b) = (self.find(a), self.find(b));
        if a != b {
            let (low, high) = if a < b { (a, b) } else { (b, a) };
            self.parent[high] = low;
        }
    }
}

impl BatchProcessor {
    pub fn new(processor: Arc<CommandProcessor>) -> Self {
        Self { processor }
    }

    pub fn processor(&self) -> &Arc<CommandProcessor> {
        &self.processor
    }

    /// Partition a batch into independent groups
    ///
    /// # Arguments
    ///
    /// * `batch` - Commands in file order
    ///
    /// # Returns
    ///
    /// Groups ordered by their first command's position in the batch.
    ///
    /// # Guarantees
    ///
    /// - Each command appears in exactly one group
    /// - Commands sharing a wallet label or idempotency key share a group
    /// - Commands within a group keep their original order
    pub fn partition(&self, batch: Vec<CommandRecord>) -> Vec<Vec<CommandRecord>> {
        let mut sets = UnionFind::new(batch.len());
        let mut first_seen: HashMap<String, usize> = HashMap::new();

        for (index, record) in batch.iter().enumerate() {
            for token in record.conflict_tokens() {
                match first_seen.entry(token) {
                    Entry::Occupied(owner) => sets.union(*owner.get(), index),
                    Entry::Vacant(slot) => {
                        slot.insert(index);
                    }
                }
            }
        }

        let mut slots: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<Vec<CommandRecord>> = Vec::new();

        for (index, record) in batch.into_iter().enumerate() {
            let root = sets.find(index);
            let slot = *slots.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(record);
        }

        groups
    }

    /// Process one group sequentially, in order
    ///
    /// Every command is attempted; failures are captured in the results.
    pub async fn process_group(&self, commands: Vec<CommandRecord>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(commands.len());

        for record in commands {
            let result = self.processor.process(record.clone());
            results.push(ProcessingResult { record, result });
        }

        results
    }

    /// Process a batch with conflict-based partitioning
    ///
    /// 1. Partition the batch into independent groups
    /// 2. Spawn a tokio task per group
    /// 3. Wait for every task and collect the results
    ///
    /// Results are grouped, not in file order.
    ///
    /// # Errors
    ///
    /// Returns `InternalInconsistency` if a group task panicked or was
    /// cancelled, since its remaining commands never ran.
    pub async fn process_batch(
        &self,
        batch: Vec<CommandRecord>,
    ) -> Result<Vec<ProcessingResult>, LedgerError> {
        let groups = self.partition(batch);

        let mut tasks = Vec::with_capacity(groups.len());
        for commands in groups {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_group(commands).await
            }));
        }

        join_groups(tasks).await
    }
}

/// Wait for every group task, failing if any of them did not complete
async fn join_groups(
    tasks: Vec<JoinHandle<Vec<ProcessingResult>>>,
) -> Result<Vec<ProcessingResult>, LedgerError> {
    let mut results = Vec::new();
    let mut failure = None;

    for task in tasks {
        match task.await {
            Ok(group_results) => results.extend(group_results),
            Err(e) => {
                error!(error = %e, "command group task failed");
                failure.get_or_insert_with(|| {
                    LedgerError::internal_inconsistency(format!("command group task failed: {}", e))
                });
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(results),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommandType, Currency};
    use rust_decimal::Decimal;

    fn command(
        command: CommandType,
        wallet: &str,
        counterparty: Option<&str>,
        key: Option<&str>,
    ) -> CommandRecord {
        CommandRecord {
            command,
            wallet: wallet.to_string(),
            counterparty: counterparty.map(str::to_string),
            amount: match command {
                CommandType::Create => None,
                _ => Some(Decimal::new(10, 0)),
            },
            currency: Currency::Usd,
            idempotency_key: key.map(str::to_string),
        }
    }

    fn labels(group: &[CommandRecord]) -> Vec<&str> {
        group.iter().map(|r| r.wallet.as_str()).collect()
    }

    #[test]
    fn test_processor_is_cloneable() {
        let shared = Arc::new(CommandProcessor::new());
        let processor = BatchProcessor::new(Arc::clone(&shared));

        let _clone = processor.clone();

        assert_eq!(Arc::strong_count(&shared), 3);
    }

    #[test]
    fn test_partition_empty_batch() {
        let processor = BatchProcessor::default();

        assert!(processor.partition(vec![]).is_empty());
    }

    #[test]
    fn test_partition_separates_unrelated_wallets() {
        let processor = BatchProcessor::default();
        let batch = vec![
            command(CommandType::Create, "a", None, None),
            command(CommandType::Create, "b", None, None),
            command(CommandType::Fund, "a", None, None),
            command(CommandType::Fund, "b", None, None),
        ];

        let groups = processor.partition(batch);

        assert_eq!(groups.len(), 2);
        assert_eq!(labels(&groups[0]), vec!["a", "a"]);
        assert_eq!(labels(&groups[1]), vec!["b", "b"]);
        assert_eq!(groups[0][0].command, CommandType::Create);
        assert_eq!(groups[0][1].command, CommandType::Fund);
    }

    #[test]
    fn test_partition_joins_transfer_endpoints() {
        let processor = BatchProcessor::default();
        let batch = vec![
            command(CommandType::Fund, "a", None, None),
            command(CommandType::Fund, "b", None, None),
            command(CommandType::Fund, "c", None, None),
            command(CommandType::Transfer, "c", Some("a"), None),
        ];

        let groups = processor.partition(batch);

        assert_eq!(groups.len(), 2);
        assert_eq!(labels(&groups[0]), vec!["a", "c", "c"]);
        assert_eq!(labels(&groups[1]), vec!["b"]);
    }

    #[test]
    fn test_partition_joins_shared_keys() {
        let processor = BatchProcessor::default();
        let batch = vec![
            command(CommandType::Fund, "a", None, Some("k")),
            command(CommandType::Fund, "b", None, Some("k")),
            command(CommandType::Fund, "c", None, Some("other")),
        ];

        let groups = processor.partition(batch);

        assert_eq!(groups.len(), 2);
        assert_eq!(labels(&groups[0]), vec!["a", "b"]);
        assert_eq!(labels(&groups[1]), vec!["c"]);
    }

    #[test]
    fn test_partition_key_text_does_not_collide_with_label() {
        let processor = BatchProcessor::default();
        let batch = vec![
            command(CommandType::Fund, "a", None, Some("b")),
            command(CommandType::Fund, "b", None, None),
        ];

        assert_eq!(processor.partition(batch).len(), 2);
    }

    #[test]
    fn test_partition_keeps_every_command() {
        let processor = BatchProcessor::default();
        let batch: Vec<_> = (0..50)
            .map(|i| {
                let wallet = format!("w{}", i % 7);
                let counterparty = format!("w{}", (i * 3) % 11);
                command(CommandType::Transfer, &wallet, Some(&counterparty), None)
            })
            .collect();

        let groups = processor.partition(batch);

        assert_eq!(groups.iter().map(Vec::len).sum::<usize>(), 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_process_batch_matches_sequential_replay() {
        let batch = vec![
            command(CommandType::Create, "a", None, None),
            command(CommandType::Create, "b", None, None),
            command(CommandType::Create, "c", None, None),
            command(CommandType::Fund, "a", None, Some("f1")),
            command(CommandType::Fund, "c", None, None),
            command(CommandType::Fund, "a", None, Some("f1")),
            command(CommandType::Transfer, "a", Some("b"), None),
            command(CommandType::Transfer, "b", Some("a"), None),
            command(CommandType::Transfer, "c", Some("c"), None),
        ];

        let sequential = CommandProcessor::new();
        for record in batch.clone() {
            let _ = sequential.process(record);
        }

        let processor = BatchProcessor::default();
        let results = processor.process_batch(batch).await.unwrap();

        assert_eq!(results.len(), 9);
        assert_eq!(results.iter().filter(|r| r.result.is_err()).count(), 1);

        let concurrent = processor.processor().summaries().unwrap();
        let expected = sequential.summaries().unwrap();
        assert_eq!(concurrent.len(), expected.len());
        for (got, want) in concurrent.iter().zip(&expected) {
            assert_eq!(got.label, want.label);
            assert_eq!(got.wallet.balance, want.wallet.balance);
            assert_eq!((got.credits, got.debits), (want.credits, want.debits));
        }
    }

    #[tokio::test]
    async fn test_failed_group_task_is_fatal() {
        let processor = BatchProcessor::default();
        let finished = {
            let processor = processor.clone();
            tokio::spawn(async move {
                processor
                    .process_group(vec![command(CommandType::Create, "a", None, None)])
                    .await
            })
        };
        let cancelled = tokio::spawn(std::future::pending::<Vec<ProcessingResult>>());
        cancelled.abort();

        let result = join_groups(vec![finished, cancelled]).await;

        match result {
            Err(e @ LedgerError::InternalInconsistency { .. }) => assert!(e.is_fatal()),
            other => panic!("expected internal inconsistency, got {:?}", other),
        }
        // The finished group still ran to completion
        assert!(processor.processor().wallet_id("a").is_some());
    }
}
