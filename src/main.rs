//! blocklog - inspect and append to a block-packed write-ahead log

use anyhow::{Context, Result};
use blocklog::config::{StorageConfig, DEFAULT_BLOCK_SIZE, DEFAULT_LOG_FILE};
use blocklog::database::Database;
use blocklog::storage::page::U32_SIZE;
use blocklog::storage::Record;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// blocklog - a block-packed write-ahead log
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Data directory
    #[arg(short = 'D', long, default_value = "./blocklog_data")]
    data_dir: PathBuf,

    /// Block size in bytes; must match the size the directory was written with
    #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Log file name inside the data directory
    #[arg(short, long, default_value = DEFAULT_LOG_FILE)]
    log_file: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append one record per payload and flush
    Append {
        #[arg(required = true)]
        payloads: Vec<String>,
    },
    /// Print records newest first
    Dump {
        /// Stop after this many records
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Print log file statistics
    Stat,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = StorageConfig {
        data_dir: args.data_dir,
        block_size: args.block_size,
        log_file: args.log_file,
    };
    let db = Database::open(config).context("Failed to open database")?;

    match args.command {
        Command::Append { payloads } => append(&db, payloads)?,
        Command::Dump { limit } => dump(&db, limit)?,
        Command::Stat => stat(&db)?,
    }

    db.close()
}

fn append(db: &Database, payloads: Vec<String>) -> Result<()> {
    let log = db.log_manager();
    for payload in payloads {
        let lsn = log
            .log(&Record::new(payload.into_bytes()))
            .context("Failed to append record")?;
        println!("{}", lsn);
    }
    log.flush().context("Failed to flush log")?;
    Ok(())
}

fn dump(db: &Database, limit: Option<usize>) -> Result<()> {
    let mut iter = db.log_manager().iterator()?;
    let mut count = 0;
    while iter.has_next() && limit.map_or(true, |n| count < n) {
        let record = iter.next()?;
        println!(
            "{:>6}  {:>5} bytes  {}",
            count,
            record.length(),
            String::from_utf8_lossy(record.data())
        );
        count += 1;
    }
    Ok(())
}

fn stat(db: &Database) -> Result<()> {
    let log = db.log_manager();
    let fm = db.file_manager();
    let boundary = log.tail_boundary()?;

    println!("Data directory: {}", fm.data_dir().display());
    println!("Block size:     {}", fm.block_size());
    println!("Log file:       {}", log.log_file());
    println!("Blocks:         {}", fm.file_size_in_blocks(log.log_file())?);
    println!("Tail block:     {}", log.current_block());
    println!("Tail boundary:  {}", boundary);
    println!("Tail free:      {} bytes", boundary - U32_SIZE);
    Ok(())
}
