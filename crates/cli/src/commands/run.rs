//! Run the ingestion and block production loop in-process.

use super::{load_config, load_keypair, open_chain, VALIDATOR_KEY};
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use linkchain_chain::{BlockProducer, TransactionPool};
use linkchain_core::{Keypair, Transaction};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};

#[derive(Args)]
pub struct RunArgs {
    /// Directory to store blockchain data
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Number of blocks to produce before exiting
    #[arg(short, long, default_value = "10")]
    blocks: u32,

    /// Random transactions submitted per block interval
    #[arg(short, long, default_value = "5")]
    txs_per_block: usize,

    /// Payload size of each random transaction in bytes
    #[arg(long, default_value = "64")]
    tx_size: usize,

    /// Override the configured block time in milliseconds
    #[arg(long)]
    block_time_ms: Option<u64>,
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = load_config(&args.data_dir)?;
    let keypair = load_keypair(&args.data_dir, VALIDATOR_KEY)
        .context("Failed to load validator keypair")?;
    let chain = open_chain(&args.data_dir)?;
    let pool = Arc::new(TransactionPool::from_config(&config.pool));

    let producer =
        BlockProducer::new(keypair, config.producer.clone()).with_version(config.header_version);
    let block_time =
        Duration::from_millis(args.block_time_ms.unwrap_or(producer.config().block_time_ms));

    println!("{}", "Running linkchain...".bold().cyan());
    println!("  Height:     {}", chain.height().to_string().bright_cyan());
    println!("  Block time: {}", format!("{:?}", block_time).bright_black());
    println!();

    let stop = Arc::new(AtomicBool::new(false));
    let ingest = spawn_ingestion(
        Arc::clone(&pool),
        Arc::clone(&stop),
        args.txs_per_block,
        args.tx_size,
        block_time,
    );

    let result = (|| -> Result<()> {
        for _ in 0..args.blocks {
            thread::sleep(block_time);
            let block = producer.produce(&chain, &pool)?;
            println!(
                "  {} {} {}",
                format!("#{}", block.height()).bright_black(),
                block.hash().to_hex()[..16].bright_yellow(),
                format!("({} txs)", block.tx_count()).bright_black()
            );
        }
        Ok(())
    })();

    stop.store(true, Ordering::SeqCst);
    let ingested = ingest.join();
    result?;
    if ingested.is_err() {
        error!("ingestion thread panicked");
        bail!("ingestion thread panicked");
    }

    println!();
    println!(
        "{}  Chain height is now {}",
        "✓".green().bold(),
        chain.height().to_string().bright_cyan()
    );
    Ok(())
}

/// Submit `per_interval` random signed transactions every `interval` until stopped.
fn spawn_ingestion(
    pool: Arc<TransactionPool>,
    stop: Arc<AtomicBool>,
    per_interval: usize,
    tx_size: usize,
    interval: Duration,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let client = Keypair::generate();
        info!(address = %client.address(), "ingestion started");

        let pause = ingestion_pause(interval, per_interval);
        while !stop.load(Ordering::SeqCst) {
            if per_interval == 0 {
                thread::sleep(interval);
                continue;
            }
            let tx = Transaction::random(tx_size).signed(&client);
            let hash = tx.hash();
            if !pool.add(tx) {
                debug!(%hash, "duplicate transaction dropped");
            }
            thread::sleep(pause);
        }
        info!("ingestion stopped");
    })
}

/// Spacing between submissions so `per_interval` of them fit in `interval`.
fn ingestion_pause(interval: Duration, per_interval: usize) -> Duration {
    let per_interval = u32::try_from(per_interval.max(1)).unwrap_or(u32::MAX);
    interval / per_interval
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingestion_pause() {
        let second = Duration::from_secs(1);
        assert_eq!(ingestion_pause(second, 4), Duration::from_millis(250));
        assert_eq!(ingestion_pause(second, 0), second);
        // counts past u32::MAX saturate instead of wrapping to zero
        assert_eq!(
            ingestion_pause(second, usize::MAX),
            second / u32::MAX
        );
    }
}
