//! Keypair management command.

use super::{keys_dir, load_keypair, save_keypair};
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use linkchain_core::Keypair;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct AccountArgs {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand)]
enum AccountCommand {
    /// Generate a new keypair
    New {
        /// Directory to store blockchain data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Name for the keypair file
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Show a keypair's public key and address
    Info {
        /// Directory to store blockchain data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Keypair name (without .json extension)
        name: String,
    },
    /// List all keypairs
    List {
        /// Directory to store blockchain data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

pub fn run(args: AccountArgs) -> Result<()> {
    match args.command {
        AccountCommand::New { data_dir, name } => new_keypair(data_dir, name),
        AccountCommand::Info { data_dir, name } => show_info(data_dir, name),
        AccountCommand::List { data_dir } => list_keypairs(data_dir),
    }
}

fn new_keypair(data_dir: PathBuf, name: Option<String>) -> Result<()> {
    let keypair = Keypair::generate();
    let name = name.unwrap_or_else(|| format!("account_{}", &keypair.address().to_hex()[..8]));
    let key_file = save_keypair(&data_dir, &name, &keypair)?;

    println!();
    println!("{}  Generated new keypair", "✓".green().bold());
    println!("    Name:       {}", name.bright_cyan());
    println!("    Public key: {}", keypair.public_key.to_hex().bright_yellow());
    println!("    Address:    {}", keypair.address().to_hex().bright_yellow());
    println!(
        "    Saved to:   {}",
        key_file.display().to_string().bright_black()
    );
    println!();
    Ok(())
}

fn show_info(data_dir: PathBuf, name: String) -> Result<()> {
    let keypair = load_keypair(&data_dir, &name)?;

    println!();
    println!("{}", "Account Information:".bold().cyan());
    println!();
    println!("  Name:       {}", name.bright_cyan());
    println!("  Public key: {}", keypair.public_key.to_hex().bright_yellow());
    println!("  Address:    {}", keypair.address().to_hex().bright_yellow());
    println!();
    Ok(())
}

fn list_keypairs(data_dir: PathBuf) -> Result<()> {
    let dir = keys_dir(&data_dir);

    println!();
    println!("{}", "Keypairs:".bold().cyan());
    println!();

    if !dir.exists() {
        println!("  {}", "(none)".bright_black());
        println!();
        return Ok(());
    }

    let mut names: Vec<String> = fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                return None;
            }
            path.file_stem().and_then(|s| s.to_str()).map(String::from)
        })
        .collect();
    names.sort();

    for name in names {
        match load_keypair(&data_dir, &name) {
            Ok(keypair) => println!(
                "  {} {}",
                name.bright_cyan(),
                keypair.address().to_hex().bright_yellow()
            ),
            Err(e) => println!("  {} {}", name.bright_cyan(), format!("({})", e).red()),
        }
    }

    println!();
    Ok(())
}
