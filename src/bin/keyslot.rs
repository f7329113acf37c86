//! keyslot command-line interface
//!
//! Works against journaled namespaces in a data directory:
//! - Namespace management (new, list)
//! - Address derivation (no state touched)
//! - Claim, release and membership tests
//! - Journal compaction and statistics
//!
//! # Examples
//!
//! ```bash
//! # Create a namespace
//! keyslot namespace new
//!
//! # Compute an address off-line
//! keyslot derive --namespace 6ba7b810-9dad-11d1-80b4-00c04fd430c8 alice
//!
//! # Claim an integer key
//! keyslot claim --namespace 6ba7b810-9dad-11d1-80b4-00c04fd430c8 u:42
//! ```

use clap::{Parser, Subcommand};
use keyslot::slot::{derive_address, ClaimJournal, NamespaceId, SlotKey};
use keyslot::Settings;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// keyslot - deterministic keyed-slot allocation
#[derive(Parser, Debug)]
#[command(name = "keyslot")]
#[command(version = keyslot::VERSION)]
#[command(about = "Derive, claim and release deterministic child slots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (TOML)
    #[arg(long, global = true, env = "KEYSLOT_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory path (overrides the settings file)
    #[arg(long, global = true, env = "KEYSLOT_DATA")]
    data_dir: Option<PathBuf>,

    /// Log directory path
    #[arg(long, global = true, default_value = "logs", env = "KEYSLOT_LOG_DIR")]
    log_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Namespace management
    Namespace {
        #[command(subcommand)]
        command: NamespaceCommands,
    },

    /// Compute the address of a key without touching any state
    Derive {
        /// Namespace id (UUID)
        #[arg(short, long)]
        namespace: NamespaceId,
        /// Key: u:<n>, hex:<bytes>, account:<hex>, str:<text> or bare text
        key: SlotKey,
    },

    /// Check whether a key is claimed
    Exists {
        #[arg(short, long)]
        namespace: NamespaceId,
        key: SlotKey,
    },

    /// Claim a key and print its address
    Claim {
        #[arg(short, long)]
        namespace: NamespaceId,
        key: SlotKey,
    },

    /// Release a claimed key
    Release {
        #[arg(short, long)]
        namespace: NamespaceId,
        key: SlotKey,
    },

    /// List claimed keys with their addresses
    Keys {
        #[arg(short, long)]
        namespace: NamespaceId,
    },

    /// Rewrite a namespace journal to its minimal form
    Compact {
        #[arg(short, long)]
        namespace: NamespaceId,
    },

    /// Show namespace statistics and counters
    Stats {
        #[arg(short, long)]
        namespace: NamespaceId,
    },

    /// Print the effective settings
    Config,

    /// Show version
    Version,
}

#[derive(Subcommand, Debug)]
enum NamespaceCommands {
    /// Create a namespace journal
    New {
        /// Use this id instead of a random one
        #[arg(long)]
        id: Option<NamespaceId>,
    },

    /// List namespaces in the data directory
    List,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli)?;

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir.clone() {
        settings.data_dir = data_dir;
    }

    match cli.command {
        Commands::Namespace { command } => namespace_command(&settings, command),
        Commands::Derive { namespace, key } => {
            println!("{}", derive_address(&namespace, &key));
            Ok(())
        }
        Commands::Exists { namespace, key } => {
            let journal = open_journal(&settings, namespace)?;
            println!("{}", journal.exists(&key));
            Ok(())
        }
        Commands::Claim { namespace, key } => {
            let mut journal = open_journal(&settings, namespace)?;
            let address = journal.claim(&key)?.redeem();
            info!(namespace = %namespace, key = %key, "Claimed from CLI");
            println!("{}", address);
            Ok(())
        }
        Commands::Release { namespace, key } => {
            let mut journal = open_journal(&settings, namespace)?;
            journal.release(&key)?;
            println!("Released {}", key);
            Ok(())
        }
        Commands::Keys { namespace } => {
            let journal = open_journal(&settings, namespace)?;
            let mut keys: Vec<&SlotKey> = journal.namespace().keys().collect();
            keys.sort();
            for key in keys {
                println!("{}\t{}", key, derive_address(&namespace, key));
            }
            Ok(())
        }
        Commands::Compact { namespace } => {
            let mut journal = open_journal(&settings, namespace)?;
            journal.compact()?;
            println!("Compacted {} ({} keys)", namespace, journal.namespace().len());
            Ok(())
        }
        Commands::Stats { namespace } => {
            let journal = open_journal(&settings, namespace)?;
            println!("Namespace: {}", namespace);
            println!("Journal:   {}", journal.path().display());
            println!("Claimed:   {}", journal.namespace().len());
            println!();
            print!("{}", keyslot::metrics::export_metrics());
            Ok(())
        }
        Commands::Config => {
            print!("{}", settings.to_toml()?);
            Ok(())
        }
        Commands::Version => {
            println!("keyslot {}", keyslot::VERSION);
            Ok(())
        }
    }
}

/// Setup logging with rolling files and console output
fn setup_logging(cli: &Cli) -> anyhow::Result<()> {
    std::fs::create_dir_all(&cli.log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &cli.log_dir, "keyslot.log");

    let log_level = cli
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::WARN);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color)
                .pretty(),
        )
        .with(fmt::layer().with_writer(file_appender).with_ansi(false))
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    Ok(())
}

fn open_journal(settings: &Settings, namespace: NamespaceId) -> anyhow::Result<ClaimJournal> {
    Ok(ClaimJournal::open(
        &settings.data_dir,
        namespace,
        &settings.journal,
    )?)
}

fn namespace_command(settings: &Settings, command: NamespaceCommands) -> anyhow::Result<()> {
    match command {
        NamespaceCommands::New { id } => {
            let id = id.unwrap_or_default();
            let mut journal = open_journal(settings, id)?;
            // An empty compaction materializes the log file
            journal.compact()?;
            info!(namespace = %id, path = ?journal.path(), "Created namespace");
            println!("{}", id);
            Ok(())
        }
        NamespaceCommands::List => {
            let ids = ClaimJournal::list(&settings.data_dir)?;
            if ids.is_empty() {
                println!("No namespaces found.");
            } else {
                for id in ids {
                    println!("{}", id);
                }
            }
            Ok(())
        }
    }
}
