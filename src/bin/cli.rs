//! DriftKV CLI
//!
//! Command-line interface for working with a DriftKV data file.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use driftkv::compaction::{self, CompactionOutcome};
use driftkv::record::{LogScanner, ValueMode};
use driftkv::{storage, Config, Engine, GetResult};
use tracing_subscriber::{fmt, EnvFilter};

/// DriftKV CLI
#[derive(Parser, Debug)]
#[command(name = "driftkv-cli")]
#[command(about = "CLI for the DriftKV log-structured key-value store")]
#[command(version)]
struct Args {
    /// Data file
    #[arg(short, long, default_value = "./driftkv.db")]
    file: PathBuf,

    /// Skip compaction when the store is closed
    #[arg(long)]
    no_compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,

        /// Expire the key after this many seconds
        #[arg(long, default_value = "0")]
        ttl: u32,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Compact the data file
    Compact,

    /// List every record in the data file
    Inspect,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,driftkv=info"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> driftkv::Result<()> {
    let Args {
        file,
        no_compact,
        command,
    } = args;

    match command {
        Commands::Get { key } => with_engine(&file, no_compact, |engine| {
            match engine.get(key)? {
                GetResult::Value(v) => println!("{}", v),
                GetResult::NotFound => println!("(not found)"),
                GetResult::Corrupted => println!("(corrupted)"),
            }
            Ok(())
        }),
        Commands::Set { key, value, ttl } => with_engine(&file, no_compact, |engine| {
            engine.set_with_ttl(key, value, ttl)?;
            println!("OK");
            Ok(())
        }),
        Commands::Del { key } => with_engine(&file, no_compact, |engine| {
            engine.delete(key)?;
            println!("OK");
            Ok(())
        }),
        Commands::Compact => compact(&file),
        Commands::Inspect => inspect(&file),
    }
}

/// Open the store, run `op`, and close it (compacting unless disabled)
fn with_engine<F>(file: &Path, no_compact: bool, op: F) -> driftkv::Result<()>
where
    F: FnOnce(&Engine) -> driftkv::Result<()>,
{
    let config = Config::builder()
        .path(file)
        .compact_on_close(!no_compact)
        .build();
    let engine = Engine::open(config)?;

    let result = op(&engine);
    engine.close()?;
    result
}

fn compact(file: &Path) -> driftkv::Result<()> {
    match compaction::compact(file)? {
        CompactionOutcome::NoFile => println!("no data file at {}", file.display()),
        CompactionOutcome::NothingToReclaim => println!("nothing to reclaim"),
        CompactionOutcome::Compacted(stats) => println!(
            "kept {} records, dropped {}, reclaimed {} bytes",
            stats.records_kept,
            stats.records_dropped,
            stats.bytes_reclaimed()
        ),
    }
    Ok(())
}

fn inspect(path: &Path) -> driftkv::Result<()> {
    let summary = storage::verify(path)?;
    let file = std::fs::File::open(path)?;
    let scanner = LogScanner::new(file, ValueMode::Skip)?;

    println!("{:>10}  {:>10}  {:>10}  {:>3}  {:>6}  key", "offset", "timestamp", "expiry", "del", "vsize");
    for item in scanner {
        let record = item?;
        println!(
            "{:>10}  {:>10}  {:>10}  {:>3}  {:>6}  {}",
            record.offset,
            record.header.timestamp,
            record.header.expiry,
            record.header.deleted,
            record.header.value_size,
            String::from_utf8_lossy(&record.key)
        );
    }

    println!(
        "{} records, {} keys, {} of {} bytes valid{}",
        summary.records_replayed,
        summary.live_keys,
        summary.valid_len,
        summary.file_len,
        if summary.was_truncated { " (torn tail)" } else { "" }
    );
    Ok(())
}
