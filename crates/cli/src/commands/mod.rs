//! CLI commands module.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use linkchain_chain::{Blockchain, ChainConfig};
use linkchain_core::Keypair;
use linkchain_storage::{ChainStore, Storage};
use std::fs;
use std::path::{Path, PathBuf};

mod account;
mod block;
mod init;
mod run;
mod tx;

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new chain
    Init(init::InitArgs),
    /// Keypair management
    Account(account::AccountArgs),
    /// Block queries
    Block(block::BlockArgs),
    /// Transaction queries
    Tx(tx::TxArgs),
    /// Ingest transactions and produce blocks
    Run(run::RunArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init(args) => init::run(args),
        Commands::Account(args) => account::run(args),
        Commands::Block(args) => block::run(args),
        Commands::Tx(args) => tx::run(args),
        Commands::Run(args) => run::run(args),
    }
}

/// Name of the keypair that signs produced blocks.
pub(crate) const VALIDATOR_KEY: &str = "validator";

pub(crate) fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.json")
}

pub(crate) fn keys_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("keys")
}

fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("chain")
}

pub(crate) fn open_store(data_dir: &Path) -> Result<ChainStore> {
    let storage = Storage::open(db_path(data_dir))
        .with_context(|| format!("Failed to open storage in {}", data_dir.display()))?;
    Ok(ChainStore::new(storage))
}

/// Rebuild the chain persisted under `data_dir`.
pub(crate) fn open_chain(data_dir: &Path) -> Result<Blockchain> {
    restore_chain(open_store(data_dir)?)
        .with_context(|| format!("Failed to open chain in {}", data_dir.display()))
}

fn restore_chain(store: ChainStore) -> Result<Blockchain> {
    if !store.is_initialized()? {
        bail!("No chain found. Did you run 'linkchain init'?");
    }
    Blockchain::restore(store).context("Failed to restore chain")
}

pub(crate) fn load_config(data_dir: &Path) -> Result<ChainConfig> {
    ChainConfig::load(config_path(data_dir))
        .context("Failed to read config.json. Did you run 'linkchain init'?")
}

pub(crate) fn save_keypair(data_dir: &Path, name: &str, keypair: &Keypair) -> Result<PathBuf> {
    let dir = keys_dir(data_dir);
    fs::create_dir_all(&dir)?;

    let key_file = dir.join(format!("{}.json", name));
    if key_file.exists() {
        bail!("Keypair file already exists: {}", key_file.display());
    }

    let key_json = serde_json::json!({
        "address": keypair.address().to_hex(),
        "public_key": keypair.public_key.to_hex(),
        "private_key": hex::encode(keypair.private_key()),
    });
    fs::write(&key_file, serde_json::to_string_pretty(&key_json)?)?;
    Ok(key_file)
}

pub(crate) fn load_keypair(data_dir: &Path, name: &str) -> Result<Keypair> {
    let key_file = keys_dir(data_dir).join(format!("{}.json", name));
    if !key_file.exists() {
        bail!(
            "Keypair file not found: {}. Use 'linkchain account new' to create one.",
            key_file.display()
        );
    }

    let contents = fs::read_to_string(&key_file)?;
    let json: serde_json::Value = serde_json::from_str(&contents)?;

    let private_key_hex = json
        .get("private_key")
        .and_then(|v| v.as_str())
        .context("Missing private_key in keypair file")?;

    Keypair::from_private_hex(private_key_hex).context("Invalid private key")
}
