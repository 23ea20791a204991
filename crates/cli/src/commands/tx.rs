//! Transaction query command.

use super::open_chain;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use linkchain_chain::TransactionView;
use linkchain_core::Hash;
use std::path::PathBuf;

#[derive(Args)]
pub struct TxArgs {
    #[command(subcommand)]
    command: TxCommand,
}

#[derive(Subcommand)]
enum TxCommand {
    /// Show a committed transaction as JSON
    Show {
        /// Directory to store blockchain data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Transaction hash (hex format)
        hash: String,
    },
}

pub fn run(args: TxArgs) -> Result<()> {
    match args.command {
        TxCommand::Show { data_dir, hash } => show_transaction(data_dir, hash),
    }
}

fn show_transaction(data_dir: PathBuf, hash: String) -> Result<()> {
    let hash =
        Hash::from_hex(&hash).with_context(|| format!("Invalid transaction hash: {}", hash))?;
    let chain = open_chain(&data_dir)?;
    let tx = chain.get_transaction_by_hash(&hash)?;

    println!("{}", serde_json::to_string_pretty(&TransactionView::from(&tx))?);
    Ok(())
}
