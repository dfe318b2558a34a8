//! hfile command-line tool
//!
//! Generate mock files, inspect them and look keys up.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use hfile::testdata::generate_mock_hfile;
use hfile::{Config, Reader, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// hfile tool
#[derive(Parser, Debug)]
#[command(name = "hfile")]
#[command(about = "Inspect and query sorted block-compressed key-value files")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a mock file with keys 0..N and values "value-for-<i>"
    Generate {
        /// Output file
        path: PathBuf,

        /// Number of keys
        #[arg(short, long, default_value = "1000000")]
        keys: u32,

        /// Block size in bytes
        #[arg(short, long, default_value = "4096")]
        block_size: usize,

        /// Snappy-compress blocks
        #[arg(short, long)]
        compress: bool,

        /// Write three values under every odd key
        #[arg(short, long)]
        multi: bool,
    },

    /// Print trailer and file info
    Info {
        path: PathBuf,
    },

    /// Print the first value of each key (keys queried in sorted order)
    Get {
        path: PathBuf,

        /// Keys: decimal integers, or raw strings with --raw
        #[arg(required = true)]
        keys: Vec<String>,

        /// Use keys as raw bytes instead of 4-byte big-endian integers
        #[arg(long)]
        raw: bool,
    },

    /// Print every value stored under a key
    GetAll {
        path: PathBuf,

        key: String,

        /// Use the key as raw bytes instead of a 4-byte big-endian integer
        #[arg(long)]
        raw: bool,
    },

    /// Print records in file order
    Dump {
        path: PathBuf,

        /// Stop after this many records
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hfile=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args.command) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Generate {
            path,
            keys,
            block_size,
            compress,
            multi,
        } => {
            let config = Config::builder()
                .block_size(block_size)
                .compress(compress)
                .build();
            tracing::info!("Generating {} keys into {}", keys, path.display());
            let summary = generate_mock_hfile(&path, keys, config, multi)?;
            println!(
                "{} entries in {} blocks, {} bytes ({} uncompressed)",
                summary.entry_count,
                summary.block_count,
                summary.file_size,
                summary.total_uncompressed_bytes
            );
        }

        Commands::Info { path } => {
            let reader = Reader::open_path(&path, Config::default())?;
            let trailer = reader.trailer();
            let info = reader.file_info();
            println!("version:            {}", trailer.version);
            println!("compression:        {}", trailer.compression.name());
            println!("blocks:             {}", trailer.block_count);
            println!("entries:            {}", trailer.entry_count);
            println!("uncompressed bytes: {}", trailer.total_uncompressed_bytes);
            println!("first key:          {}", display_key(info.first_key.as_deref()));
            println!("last key:           {}", display_key(info.last_key.as_deref()));
            println!("avg key length:     {}", info.avg_key_len);
            println!("avg value length:   {}", info.avg_value_len);
            println!("created at (ms):    {}", info.created_at_ms);
            for (name, value) in &info.user {
                println!("{}: {}", name, String::from_utf8_lossy(value));
            }
        }

        Commands::Get { path, keys, raw } => {
            let reader = Reader::open_path(&path, Config::default())?;
            let mut parsed = keys
                .iter()
                .map(|k| parse_key(k, raw).map(|bytes| (k.as_str(), bytes)))
                .collect::<Result<Vec<_>>>()?;
            // The scanner wants non-decreasing keys
            parsed.sort_by(|a, b| a.1.cmp(&b.1));

            let mut scanner = reader.scanner();
            for (label, key) in parsed {
                match scanner.get_first(&key)? {
                    Some(value) => println!("{}\t{}", label, String::from_utf8_lossy(&value)),
                    None => println!("{}\t(not found)", label),
                }
            }
        }

        Commands::GetAll { path, key, raw } => {
            let reader = Reader::open_path(&path, Config::default())?;
            let mut scanner = reader.scanner();
            let values = scanner.get_all(&parse_key(&key, raw)?)?;
            if values.is_empty() {
                println!("{}\t(not found)", key);
            }
            for value in values {
                println!("{}\t{}", key, String::from_utf8_lossy(&value));
            }
        }

        Commands::Dump { path, limit } => {
            let reader = Reader::open_path(&path, Config::default())?;
            for record in reader.iter().take(limit.unwrap_or(usize::MAX)) {
                let (key, value) = record?;
                println!("{}\t{}", display_key(Some(&key)), String::from_utf8_lossy(&value));
            }
        }
    }
    Ok(())
}

/// Decimal integer → 4-byte big-endian key, or the raw string bytes
fn parse_key(key: &str, raw: bool) -> Result<Vec<u8>> {
    if raw {
        return Ok(key.as_bytes().to_vec());
    }
    key.parse::<u32>()
        .map(|i| i.to_be_bytes().to_vec())
        .map_err(|e| hfile::HFileError::Config(format!("Invalid integer key {:?}: {}", key, e)))
}

/// 4-byte keys print as integers, anything else lossily as text
fn display_key(key: Option<&[u8]>) -> String {
    match key {
        None => "-".to_string(),
        Some(k) => match <[u8; 4]>::try_from(k) {
            Ok(bytes) => u32::from_be_bytes(bytes).to_string(),
            Err(_) => String::from_utf8_lossy(k).into_owned(),
        },
    }
}
