//! Schema Registry server
//!
//! Serves the compatibility config and compatibility check API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use compat_registry::{api, CompatibilityLevel, MemoryStore, RegistrySettings, SchemaRegistry, Seed};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-registry")]
#[command(about = "Compatibility configuration and checking for an Avro schema registry")]
struct Cli {
    /// Path to a config file (registry.toml)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to listen on (overrides config)
        #[arg(short, long)]
        bind: Option<SocketAddr>,
        /// JSON seed of subjects and versions (overrides config)
        #[arg(short, long)]
        seed: Option<PathBuf>,
    },

    /// List accepted compatibility levels
    Levels,
}

fn main() {
    let cli = Cli::parse();

    let settings = match RegistrySettings::load_from(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(cli.command, settings) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands, settings: RegistrySettings) -> anyhow::Result<()> {
    match command {
        Commands::Serve { bind, seed } => {
            let bind = bind.unwrap_or(settings.server.bind);
            let store = match seed.or(settings.registry.seed_file) {
                Some(path) => {
                    let seed = Seed::load(&path)
                        .with_context(|| format!("loading seed {}", path.display()))?;
                    tracing::info!(
                        path = %path.display(),
                        subjects = seed.subjects.len(),
                        "loaded seed"
                    );
                    MemoryStore::from_seed(&seed)?
                }
                None => MemoryStore::new(),
            };
            let registry = SchemaRegistry::in_memory(Arc::new(store));

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(api::serve(bind, registry))?;
            Ok(())
        }

        Commands::Levels => {
            for level in CompatibilityLevel::ALL {
                if level == CompatibilityLevel::DEFAULT {
                    println!("{} (default)", level);
                } else {
                    println!("{}", level);
                }
            }
            Ok(())
        }
    }
}
