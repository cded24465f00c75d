//! Benchmark suite for comparing replay strategies
//!
//! Compares the sync and async strategies on generated command scripts using
//! the divan benchmarking framework.
//!
//! ```bash
//! cargo bench
//! ```
//!
//! Each script creates a set of wallets, funds them, then mixes transfers,
//! funding and idempotent retries across all of them.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use wallet_ledger::cli::StrategyType;
use wallet_ledger::strategy::{create_strategy, BatchConfig};

fn main() {
    divan::main();
}

const SIZES: &[usize] = &[100, 1_000, 100_000];

/// Write a script of roughly `commands` commands over `commands / 10` wallets
fn generate_script(commands: usize) -> NamedTempFile {
    let wallets = (commands / 10).max(2);
    let mut file = NamedTempFile::new().expect("Failed to create temp file");

    writeln!(file, "type,wallet,counterparty,amount,currency,key").unwrap();
    for w in 0..wallets {
        writeln!(file, "create,w{},,,USD,", w).unwrap();
        writeln!(file, "fund,w{},,1000,,seed-{}", w, w).unwrap();
    }
    for i in 0..commands.saturating_sub(wallets * 2) {
        let from = i % wallets;
        let to = (i * 7 + 1) % wallets;
        let written = match i % 5 {
            0 => writeln!(file, "fund,w{},,2.5,,", to),
            // Retry of the seed funding: replayed, not applied
            1 => writeln!(file, "fund,w{},,1000,,seed-{}", from, from),
            _ => writeln!(file, "transfer,w{},w{},1.25,,t-{}", from, to, i),
        };
        written.unwrap();
    }

    file.flush().unwrap();
    file
}

fn replay(strategy_type: StrategyType, config: Option<BatchConfig>, path: &Path) {
    let strategy = create_strategy(strategy_type, config);
    let mut output = Vec::new();

    strategy
        .process(path, &mut output)
        .expect("Replay failed");
}

#[divan::bench(args = SIZES)]
fn sync_strategy(bencher: divan::Bencher, commands: usize) {
    let script = generate_script(commands);

    bencher.bench(|| replay(StrategyType::Sync, None, script.path()));
}

#[divan::bench(args = SIZES)]
fn async_strategy(bencher: divan::Bencher, commands: usize) {
    let script = generate_script(commands);

    bencher.bench(|| {
        replay(
            StrategyType::Async,
            Some(BatchConfig::default()),
            script.path(),
        )
    });
}
