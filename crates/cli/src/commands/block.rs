//! Block query command.

use super::open_chain;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use linkchain_chain::BlockSummary;
use linkchain_core::Hash;
use std::path::PathBuf;

#[derive(Args)]
pub struct BlockArgs {
    #[command(subcommand)]
    command: BlockCommand,
}

#[derive(Subcommand)]
enum BlockCommand {
    /// List recent blocks
    List {
        /// Directory to store blockchain data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Number of blocks to show
        #[arg(short, long, default_value = "10")]
        count: u32,
    },
    /// Show a block as JSON
    Info {
        /// Directory to store blockchain data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Block height or hash (hex format)
        block_id: String,
    },
}

pub fn run(args: BlockArgs) -> Result<()> {
    match args.command {
        BlockCommand::List { data_dir, count } => list_blocks(data_dir, count),
        BlockCommand::Info { data_dir, block_id } => show_block_info(data_dir, block_id),
    }
}

fn list_blocks(data_dir: PathBuf, count: u32) -> Result<()> {
    let chain = open_chain(&data_dir)?;
    let head_height = chain.height();

    println!();
    println!("{}", "Recent Blocks:".bold().cyan());
    println!();

    let start_height = head_height.saturating_sub(count.saturating_sub(1));
    for height in (start_height..=head_height).rev() {
        let block = chain.get_block(height)?;
        println!(
            "  {} {} {}",
            format!("#{}", height).bright_black(),
            block.hash().to_hex()[..16].bright_yellow(),
            format!("({} txs)", block.tx_count()).bright_black()
        );
    }

    println!();
    Ok(())
}

fn show_block_info(data_dir: PathBuf, block_id: String) -> Result<()> {
    let chain = open_chain(&data_dir)?;

    // Try parsing as height first, then as hash
    let block = if let Ok(height) = block_id.parse::<u32>() {
        chain.get_block(height)?
    } else {
        let hash = Hash::from_hex(&block_id)
            .with_context(|| format!("Invalid block hash: {}", block_id))?;
        chain.get_block_by_hash(&hash)?
    };

    let summary = BlockSummary::from(block.as_ref());
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
