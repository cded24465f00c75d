//! Wallet Ledger CLI
//!
//! Replays a CSV script of wallet commands and prints the final wallets.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- commands.csv > wallets.csv
//! cargo run -- --strategy sync commands.csv > wallets.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 commands.csv > wallets.csv
//! cargo run -- --history history.csv --audit commands.csv > wallets.csv
//! RUST_LOG=wallet_ledger=debug cargo run -- commands.csv
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, unreadable input, internal inconsistency,
//!   failed audit)

use std::fs::File;
use std::io::BufWriter;
use std::process;

use tracing::{error, info};
use wallet_ledger::cli::{self, CliArgs};
use wallet_ledger::core::CommandProcessor;
use wallet_ledger::{logging, strategy, write_history_csv, LedgerError};

fn main() {
    let args = cli::parse_args();

    if let Err(e) = logging::init_logging(&args.log_config()) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    if let Err(e) = run(&args) {
        error!(error = %e, "wallet ledger failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &CliArgs) -> Result<(), LedgerError> {
    let strategy = {
        let config = matches!(args.strategy, cli::StrategyType::Async)
            .then(|| args.to_batch_config());
        strategy::create_strategy(args.strategy, config)
    };

    let mut output = std::io::stdout();
    let processor = strategy.process(&args.input_file, &mut output)?;

    if let Some(path) = &args.history {
        export_history(&processor, path)?;
    }

    if args.audit {
        processor.audit()?;
        info!("audit passed");
    }

    Ok(())
}

fn export_history(processor: &CommandProcessor, path: &std::path::Path) -> Result<(), LedgerError> {
    let mut file = BufWriter::new(File::create(path)?);
    let entries = processor.history();
    write_history_csv(&entries, &mut file)?;
    info!(entries = entries.len(), path = %path.display(), "history written");
    Ok(())
}
