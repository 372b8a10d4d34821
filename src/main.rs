use clap::{Parser, Subcommand};
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use ipam::config_loader::{load_registry, ConfigOverrides};
use ipam::ip::{AllocationLedger, AllocationRequest, Reconciler};
use ipam::orchestrator;
use ipam::AllocationError;

/// Allocate stable IP addresses to hosts from declaratively defined pools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the pool configuration YAML file
    #[arg(short, long)]
    config: PathBuf,

    /// Override the maximum number of addresses a single pool may expand to
    #[arg(long)]
    max_catalog_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration and report catalog sizes
    Validate,

    /// Print the expanded address catalog of a pool as JSON
    Catalog {
        #[arg(short, long)]
        pool: String,
    },

    /// Create the allocation, or update it if its state file exists
    Apply {
        #[arg(short, long)]
        pool: String,

        /// Host identifier; repeat for each host
        #[arg(long = "host")]
        hosts: Vec<String>,

        /// Allocation state file (read if present, always written on success)
        #[arg(short, long)]
        state: PathBuf,

        /// State file of another allocation on the same pool whose addresses must not be reused
        #[arg(long = "peer-state")]
        peer_states: Vec<PathBuf>,
    },

    /// Print the stored allocation
    Show {
        #[arg(short, long)]
        state: PathBuf,
    },

    /// Delete the allocation and its state file
    Destroy {
        #[arg(short, long)]
        state: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting IPAM v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {:?}", args.config);

    let overrides = ConfigOverrides {
        max_catalog_size: args.max_catalog_size,
    };
    let registry = Arc::new(load_registry(&args.config, &overrides)?);

    match args.command {
        Command::Validate => {
            for pool in registry.iter() {
                info!("Pool '{}': {} allocatable addresses", pool.name(), pool.catalog.len());
            }
            info!("Configuration is valid ({} pools)", registry.len());
        }
        Command::Catalog { pool } => {
            let catalog = registry
                .catalog(&pool)
                .ok_or_else(|| AllocationError::PoolNotFound(pool.clone()))?;
            println!("{}", serde_json::to_string_pretty(catalog)?);
        }
        Command::Apply {
            pool,
            hosts,
            state,
            peer_states,
        } => {
            let mut reconciler = Reconciler::new(registry);
            if !peer_states.is_empty() {
                reconciler = reconciler.with_ledger(AllocationLedger::shared());
                orchestrator::adopt_peers(&reconciler, &peer_states)?;
            }

            let request = AllocationRequest::new(pool, hosts);
            let allocation = orchestrator::apply(&reconciler, &request, &state)?;
            println!("{}", serde_json::to_string_pretty(&allocation)?);
        }
        Command::Show { state } => {
            let reconciler = Reconciler::new(registry);
            let allocation = orchestrator::show(&reconciler, &state)?;
            println!("{}", serde_json::to_string_pretty(&allocation)?);
        }
        Command::Destroy { state } => {
            let reconciler = Reconciler::new(registry);
            orchestrator::destroy(&reconciler, &state)?;
            info!("Allocation at {:?} destroyed", state);
        }
    }

    Ok(())
}
