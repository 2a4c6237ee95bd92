//! `burrowd` — storage node tool for Burrow.
//!
//! Opens the blob stores and the metadata index under the data directory
//! and runs one command against them.
//!
//! # Usage
//!
//! ```text
//! burrowd put <CONTAINER> ./file.bin                       # store + index
//! burrowd put <CONTAINER> ./small.bin --storage-id 7061636b # into pack "pack"
//! burrowd get-range <CID>/<OID> --offset 0 --length 16     # raw bytes to stdout
//! burrowd get-range <CID>/<OID> --offset 4 --length 8 --large
//! burrowd list --count 50                                  # first page
//! burrowd list --count 50 --cursor p<CID>/<OID>            # next page
//! burrowd -c burrow.toml -d ./node2 list
//! ```

mod config;
mod telemetry;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use burrow_blobstor::{BlobStor, FsTree, PackStore};
use burrow_meta::MetaBase;
use burrow_types::{Address, ContainerId, Object, Partition, Range, StorageId};
use clap::{Parser, Subcommand};
use tracing::{debug, error, info};

use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "burrowd", version, about = "Burrow storage node tool")]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override data directory.
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a file as a new object and index it.
    Put {
        /// Container to store the object in.
        container: ContainerId,

        /// File holding the payload.
        file: PathBuf,

        /// Hex-encoded pack locator. Without it the object goes to the large store.
        #[arg(long)]
        storage_id: Option<String>,
    },

    /// Write a byte range of an object's payload to stdout.
    GetRange {
        /// Object address, `<container>/<object>`.
        address: Address,

        /// First byte of the range.
        #[arg(long)]
        offset: u64,

        /// Number of bytes to read.
        #[arg(long)]
        length: u64,

        /// Hex-encoded small-store locator. Empty selects the large store.
        #[arg(long, conflicts_with = "large")]
        storage_id: Option<String>,

        /// Read from the large store only.
        #[arg(long)]
        large: bool,
    },

    /// Print one page of live addresses from the index.
    List {
        /// Maximum number of addresses to print.
        #[arg(short = 'n', long, default_value = "100")]
        count: u32,

        /// Cursor printed by a previous `list`.
        #[arg(long, default_value = "")]
        cursor: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    telemetry::init_console(&config.log.level);

    // CLI args override config file values.
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }

    match cli.command {
        Commands::Put {
            container,
            file,
            storage_id,
        } => {
            let storage_id = parse_storage_id(storage_id.as_deref())?;
            cmd_put(&config, container, &file, &storage_id).await
        }
        Commands::GetRange {
            address,
            offset,
            length,
            storage_id,
            large,
        } => {
            let storage_id = if large {
                StorageId::Large
            } else {
                parse_storage_id(storage_id.as_deref())?
            };
            cmd_get_range(&config, address, Range::new(offset, length), &storage_id).await
        }
        Commands::List { count, cursor } => cmd_list(&config, count, &cursor),
    }
}

/// Map the `--storage-id` flag to a [`StorageId`].
fn parse_storage_id(raw: Option<&str>) -> Result<StorageId> {
    let locator = raw
        .map(hex::decode)
        .transpose()
        .context("storage id must be hex")?;
    Ok(StorageId::from_raw(locator.as_deref()))
}

// -----------------------------------------------------------------------
// Opening stores
// -----------------------------------------------------------------------

fn open_blobstor(config: &CliConfig) -> Result<BlobStor> {
    let blobs_dir = config.blobs_dir();
    let large = FsTree::new(&blobs_dir)
        .with_context(|| format!("cannot open file tree at {}", blobs_dir.display()))?;
    let packs_dir = config.packs_dir();
    let small = PackStore::open(&packs_dir, config.compressor())
        .with_context(|| format!("cannot open pack store at {}", packs_dir.display()))?;
    debug!(
        blobs = %blobs_dir.display(),
        packs = %packs_dir.display(),
        lookup = ?config.storage.lookup,
        "opened blob stores"
    );
    Ok(BlobStor::new(
        config.blobstor_config(),
        Arc::new(large),
        Arc::new(small),
    ))
}

fn open_meta(config: &CliConfig) -> Result<MetaBase> {
    if config.meta_in_memory() {
        info!("using in-memory metadata index");
        return Ok(MetaBase::in_memory());
    }

    let meta_path = config.meta_dir();
    MetaBase::open(&meta_path).map_err(|e| {
        error!(path = %meta_path.display(), %e, "failed to open metadata index");
        anyhow::anyhow!(
            "cannot open metadata at {}. Is another process using it? ({e})",
            meta_path.display(),
        )
    })
}

// -----------------------------------------------------------------------
// Commands
// -----------------------------------------------------------------------

async fn cmd_put(
    config: &CliConfig,
    container: ContainerId,
    file: &Path,
    storage_id: &StorageId,
) -> Result<()> {
    let payload =
        std::fs::read(file).with_context(|| format!("cannot read {}", file.display()))?;
    let object = Object::new(container, payload);
    let address = object.address();

    let blobs = open_blobstor(config)?;
    let meta = open_meta(config)?;

    let stored = match storage_id {
        StorageId::Small(locator) => blobs.put_small(locator, &object).await,
        StorageId::Unknown | StorageId::Large => blobs.put_large(&object).await,
    };
    stored.with_context(|| format!("failed to store {address}"))?;
    meta.insert(Partition::Primary, &address)
        .with_context(|| format!("failed to index {address}"))?;

    info!(%address, size = object.payload.len(), "stored object");
    println!("{address}");
    Ok(())
}

async fn cmd_get_range(
    config: &CliConfig,
    address: Address,
    range: Range,
    storage_id: &StorageId,
) -> Result<()> {
    let blobs = open_blobstor(config)?;
    let bytes = blobs
        .get_range(address, range, storage_id)
        .await
        .with_context(|| format!("failed to read range of {address}"))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&bytes)?;
    stdout.flush()?;
    Ok(())
}

fn cmd_list(config: &CliConfig, count: u32, cursor: &str) -> Result<()> {
    let meta = open_meta(config)?;

    match meta.list_with_token(count, cursor) {
        Ok(page) => {
            for address in &page.addresses {
                println!("{address}");
            }
            if page.truncated {
                eprintln!("warning: a malformed index entry cut the listing short");
            }
            println!("cursor: {}", page.cursor);
        }
        Err(e) if e.is_end_of_listing() => println!("end of listing"),
        Err(e) => return Err(e).context("listing failed"),
    }
    Ok(())
}
