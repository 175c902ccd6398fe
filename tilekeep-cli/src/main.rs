//! tilekeep CLI - Command-line interface
//!
//! Counts, downloads, copies, deletes and serves slippy-map tiles for
//! offline GPS maps.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tilekeep::config::ConfigFile;
use tilekeep::logging::{init_logging, LogOptions, Verbosity};
use tilekeep::store::{StoreVariant, TileEncoding};

use commands::batch::{self, StoreAction};
use commands::common::CliContext;
use commands::config::ConfigCommands;
use commands::describe::{self, DescribeArgs};
use commands::server::{self, ServerOverrides};
use commands::tileset::TilesetArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "tilekeep")]
#[command(version, about = "Incremental tile cache for offline GPS maps", long_about = None)]
struct Cli {
    /// Only report warnings and errors
    #[arg(long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Report per-tile progress
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a store or show and change its metadata
    Describe {
        /// Database file or folder
        database: PathBuf,

        /// Storage layout: native, maverick, folder or rowfolder
        #[arg(long = "db", value_name = "LAYOUT")]
        variant: Option<StoreVariant>,

        /// Tile encoding: png, jpg or server
        #[arg(long, value_name = "FORMAT")]
        tile_format: Option<TileEncoding>,

        /// Upstream URL template with {zoom}, {x} and {y}
        #[arg(long)]
        url: Option<String>,
    },

    /// Count the tiles of a tile set and how many are stored
    Count {
        database: PathBuf,
        #[command(flatten)]
        tileset: TilesetArgs,
    },

    /// Download or derive the missing tiles of a tile set
    Insert {
        database: PathBuf,
        #[command(flatten)]
        tileset: TilesetArgs,
    },

    /// Delete the tiles of a tile set
    Delete {
        database: PathBuf,
        #[command(flatten)]
        tileset: TilesetArgs,
    },

    /// Copy tiles into another store, keeping tiles it already has
    Export {
        database: PathBuf,

        /// Destination store, created like the source if needed
        #[arg(long)]
        dest: PathBuf,

        #[command(flatten)]
        tileset: TilesetArgs,
    },

    /// Copy tiles from another store, replacing tiles already stored
    Import {
        database: PathBuf,

        /// Store to read tiles from
        #[arg(long)]
        source: PathBuf,

        #[command(flatten)]
        tileset: TilesetArgs,
    },

    /// Show per-zoom tile counts and stored sizes of a tile set
    Stat {
        database: PathBuf,
        #[command(flatten)]
        tileset: TilesetArgs,
    },

    /// Serve tiles over HTTP, fetching misses from the upstream server
    Server {
        database: PathBuf,

        /// Listen address (default from server.host)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (default from server.port)
        #[arg(long)]
        port: Option<u16>,

        /// Derive misses from cached tiles up to this many levels coarser
        #[arg(long)]
        derive_levels: Option<u8>,
    },

    /// View or change settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    // Config commands must work even when the file is broken
    if let Commands::Config { command } = cli.command {
        return commands::config::run(command);
    }

    let config = ConfigFile::load()?;
    let _logging = init_logging(&LogOptions {
        verbosity: Verbosity::from_flags(cli.quiet, cli.verbose),
        file: config.logging.file.clone(),
    })
    .map_err(CliError::LoggingInit)?;

    let context = CliContext::new(config);

    match cli.command {
        Commands::Describe {
            database,
            variant,
            tile_format,
            url,
        } => describe::run(DescribeArgs {
            database: &database,
            variant,
            encoding: tile_format,
            url,
        }),
        Commands::Count { database, tileset } => {
            batch::run(&context, StoreAction::Count, &database, &tileset)
        }
        Commands::Insert { database, tileset } => {
            batch::run(&context, StoreAction::Insert, &database, &tileset)
        }
        Commands::Delete { database, tileset } => {
            batch::run(&context, StoreAction::Delete, &database, &tileset)
        }
        Commands::Export {
            database,
            dest,
            tileset,
        } => batch::run_export(&context, &database, &dest, &tileset),
        Commands::Import {
            database,
            source,
            tileset,
        } => batch::run_import(&context, &database, &source, &tileset),
        Commands::Stat { database, tileset } => batch::run_stat(&context, &database, &tileset),
        Commands::Server {
            database,
            host,
            port,
            derive_levels,
        } => server::run(
            &context,
            &database,
            ServerOverrides {
                host,
                port,
                derive_levels,
            },
        ),
        Commands::Config { .. } => Ok(()),
    }
}
