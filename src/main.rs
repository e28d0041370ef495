use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use fs_persister::config::StoreConfig;
use fs_persister::persister::{
    DiskAllErase, DiskRead, DiskWrite, FileSystemPersister, Persister, RecordProvider,
};
use fs_persister::resolver::SegmentPathResolver;
use std::io::{Read, Write};
use std::path::PathBuf;

/// fs-persister - inspect and maintain a disk-backed cache store
#[derive(Parser, Debug)]
#[command(name = "fs-persister")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Storage root, overrides the configuration file
    #[arg(short, long)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a file (or stdin) under a key
    Put {
        key: String,
        /// Input file, stdin when omitted
        file: Option<PathBuf>,
    },
    /// Write the entry for a key to stdout
    Get { key: String },
    /// Delete the entry for a key
    Rm { key: String },
    /// List entry paths under a prefix
    Ls {
        #[arg(default_value = "/")]
        prefix: String,
    },
    /// Delete every entry under a prefix
    Purge {
        #[arg(default_value = "/")]
        prefix: String,
    },
    /// Report whether a key is fresh, stale or missing
    State { key: String },
}

fn load_config(args: &Args) -> anyhow::Result<StoreConfig> {
    let mut config = match &args.config {
        Some(path) => StoreConfig::from_file(path).map_err(anyhow::Error::msg)?,
        None => StoreConfig::default(),
    };
    if let Some(root) = &args.root {
        config.root_dir = root.to_string_lossy().to_string();
    }
    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fs_persister::logging::init_subscriber()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {}", e))?;

    let args = Args::parse();
    let config = load_config(&args)?;
    let persister: FileSystemPersister<String, SegmentPathResolver> =
        FileSystemPersister::from_config(&config, SegmentPathResolver::new())
            .with_context(|| format!("Failed to open store at {}", config.root_dir))?;

    match args.command {
        Command::Put { key, file } => {
            let mut data = Vec::new();
            match file {
                Some(path) => {
                    data = std::fs::read(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                }
                None => {
                    std::io::stdin().read_to_end(&mut data)?;
                }
            }
            let len = data.len();
            persister.write(&key, Bytes::from(data)).await?;
            tracing::info!(key = %key, bytes = len, "Stored entry");
        }
        Command::Get { key } => {
            let data = persister.read(&key).await?;
            std::io::stdout().write_all(&data)?;
        }
        Command::Rm { key } => {
            if !persister.delete(&key).await? {
                tracing::info!(key = %key, "No entry to delete");
            }
        }
        Command::Ls { prefix } => {
            let mut paths = persister.list(&prefix).await?;
            paths.sort();
            for path in paths {
                println!("{}", path);
            }
        }
        Command::Purge { prefix } => {
            persister.delete_all(&prefix).await?;
            tracing::info!(prefix = %prefix, "Purged subtree");
        }
        Command::State { key } => {
            let state = persister.record_state(&key).await?;
            println!("{:?}", state);
        }
    }

    Ok(())
}
