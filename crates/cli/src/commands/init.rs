//! Initialize chain command.

use super::{config_path, open_store, save_keypair, VALIDATOR_KEY};
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use linkchain_chain::{Blockchain, ChainConfig};
use linkchain_core::{Block, Keypair};
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct InitArgs {
    /// Directory to store blockchain data
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Maximum transactions remembered by the pool
    #[arg(long, default_value = "1000")]
    pool_size: usize,

    /// Maximum transactions per block
    #[arg(long, default_value = "1000")]
    max_block_size: usize,

    /// Delay between produced blocks in milliseconds
    #[arg(short, long, default_value = "5000")]
    block_time_ms: u64,
}

pub fn run(args: InitArgs) -> Result<()> {
    println!("{}", "Initializing linkchain...".bold().cyan());
    println!();

    if config_path(&args.data_dir).exists() {
        bail!("Chain already initialized in {}", args.data_dir.display());
    }

    fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", args.data_dir))?;
    println!("{}  Created data directory", "✓".green().bold());

    let mut config = ChainConfig::default();
    config.pool.max_length = args.pool_size;
    config.producer.max_block_size = args.max_block_size;
    config.producer.block_time_ms = args.block_time_ms;

    let config_file = config_path(&args.data_dir);
    config.save(&config_file).context("Failed to save config")?;
    println!(
        "{}  Saved config to: {}",
        "✓".green().bold(),
        config_file.display().to_string().bright_black()
    );

    let keypair = Keypair::generate();
    let key_file = save_keypair(&args.data_dir, VALIDATOR_KEY, &keypair)?;
    println!(
        "{}  Saved validator keypair to: {}",
        "✓".green().bold(),
        key_file.display().to_string().bright_black()
    );
    println!("    Public key: {}", keypair.public_key.to_hex().bright_yellow());

    let genesis = Block::genesis().signed(&keypair);
    let chain = Blockchain::new(genesis, open_store(&args.data_dir)?)
        .context("Failed to persist genesis block")?;

    println!();
    println!("{}  Created genesis block", "✓".green().bold());
    println!("    Hash: {}", chain.head().hash().to_hex().bright_yellow());
    println!("    Height: {}", "0".bright_cyan());

    println!();
    println!("{}", "Chain initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!(
        "  • Use {} to produce blocks",
        "linkchain run".bright_cyan()
    );
    println!(
        "  • Use {} to explore blocks",
        "linkchain block list".bright_cyan()
    );

    Ok(())
}
