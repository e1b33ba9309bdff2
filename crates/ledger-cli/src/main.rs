use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledger_core::{constants::DEFAULT_DIFFICULTY_BITS, ChainConfig, HashedBlock};
use ledger_storage::open_chain;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger")]
#[command(about = "Append-only proof-of-work ledger backed by sled")]
struct Cli {
    /// Directory holding the sled database
    #[arg(long, env = "LEDGER_DATA_DIR", default_value = "./ledger-data", global = true)]
    data_dir: PathBuf,

    /// Leading zero bits required of every block hash. An existing chain only opens at the difficulty it was created with.
    #[arg(long, env = "LEDGER_DIFFICULTY", default_value_t = DEFAULT_DIFFICULTY_BITS, global = true)]
    difficulty: u32,

    /// Search nonces on all cores
    #[arg(long, env = "LEDGER_PARALLEL_MINING", global = true)]
    parallel: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mine and append a block
    #[command(name = "addblock")]
    AddBlock {
        /// Block payload
        data: String,
    },
    /// Print every block from tip to genesis
    #[command(name = "printchain")]
    PrintChain {
        /// Emit a JSON array instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the current tip hash
    Tip,
    /// Re-validate every block and link in the chain
    Verify,
}

#[derive(Serialize)]
struct BlockView {
    timestamp: i64,
    prev_hash: String,
    data: String,
    nonce: u64,
    hash: String,
    pow: bool,
}

impl BlockView {
    fn new(block: &HashedBlock, difficulty: u32) -> Result<Self> {
        Ok(Self {
            timestamp: block.timestamp,
            prev_hash: block.prev_hash_hex(),
            data: String::from_utf8_lossy(&block.data).into_owned(),
            nonce: block.nonce,
            hash: block.hash_hex(),
            pow: block.validate(difficulty)?,
        })
    }
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ChainConfig::with_difficulty(cli.difficulty).parallel(cli.parallel);
    let mut chain = open_chain(&cli.data_dir, config)
        .with_context(|| format!("opening chain at {}", cli.data_dir.display()))?;

    match cli.cmd {
        Command::AddBlock { data } => {
            let block = chain.append(data).context("appending block")?;
            info!(hash = %block.hash_hex(), "block added");
            println!("Success! {}", block.hash_hex());
        }
        Command::PrintChain { json } => {
            let mut views = Vec::new();
            for block in chain.iterator() {
                let view = BlockView::new(&block?, cli.difficulty)?;
                if !json {
                    println!("Prev. hash: {}", view.prev_hash);
                    println!("Data: {}", view.data);
                    println!("Hash: {}", view.hash);
                    println!("PoW: {}", view.pow);
                    println!();
                }
                views.push(view);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&views)?);
            }
        }
        Command::Tip => {
            println!("{}", hex::encode(chain.get_tip()));
        }
        Command::Verify => {
            let count = chain.verify().context("chain verification failed")?;
            println!("OK: {count} blocks verified");
        }
    }

    chain.close()?;
    Ok(())
}
