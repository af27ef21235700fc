//! ARKFinex CLI
//!
//! Command-line interface for RVU accrual and reward pool allocation.

use anyhow::Context;
use arkfinex_rewards::{
    quick_estimate, AccrualSummary, LedgerTransaction, PoolPolicy, PromotionWindow, RewardPool,
    RewardPoolAllocator, RewardsConfig, Tier, TierRules,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "arkfinex")]
#[command(author = "ARKFinex Engineering")]
#[command(version)]
#[command(about = "ARKFinex rewards - RVU accrual and reward pool distribution", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate a reward pool
    Allocate {
        /// Allocation request (JSON)
        #[arg(short, long)]
        request: PathBuf,

        /// Rewards configuration file
        #[arg(short, long, env = "ARKFINEX_CONFIG", default_value = "rewards.toml")]
        config: PathBuf,
    },

    /// Accrue raw RVUs from a transaction ledger
    Accrue {
        /// Ledger of transactions (JSON array)
        #[arg(short, long)]
        ledger: PathBuf,

        /// First day of the period (YYYY-MM-DD)
        #[arg(long)]
        period_start: NaiveDate,

        /// Last day of the period (YYYY-MM-DD)
        #[arg(long)]
        period_end: NaiveDate,

        /// Participant tier memberships (JSON object of id -> tier); emits pool participants
        #[arg(short, long)]
        memberships: Option<PathBuf>,

        /// Rewards configuration file
        #[arg(short, long, env = "ARKFINEX_CONFIG", default_value = "rewards.toml")]
        config: PathBuf,
    },

    /// Preview a reward with the simulator formula
    Estimate {
        /// Participant RVUs
        #[arg(long)]
        rvus: Decimal,

        /// Pool amount
        #[arg(long)]
        pool: Decimal,

        /// Network-wide RVUs
        #[arg(long)]
        network_rvus: Decimal,
    },

    /// Configuration utilities
    Config {
        #[command(subcommand)]
        config: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write the default configuration
    Init {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Check {
        /// Configuration file
        path: PathBuf,
    },
}

/// Body of an allocation request. Omitted sections come from the configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AllocationRequest {
    pool: RewardPool,
    #[serde(default)]
    tier_rules: Option<TierRules>,
    #[serde(default)]
    promotion: Option<PromotionWindow>,
    #[serde(default)]
    policy: Option<PoolPolicy>,
}

impl AllocationRequest {
    fn allocator(&self, config: &RewardsConfig) -> RewardPoolAllocator {
        RewardPoolAllocator::new(
            self.tier_rules.clone().unwrap_or_else(|| config.tiers.clone()),
            self.promotion.clone().or_else(|| config.promotion.clone()),
            self.policy.clone().unwrap_or_else(|| config.pool.clone()),
        )
    }
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // stdout carries the JSON results
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false),
        )
        .init();
}

fn load_config(path: &Path) -> anyhow::Result<RewardsConfig> {
    if path.exists() {
        tracing::debug!("Loading configuration from {:?}", path);
        RewardsConfig::load(path).with_context(|| format!("invalid configuration {:?}", path))
    } else {
        tracing::info!("Config {:?} not found, using defaults", path);
        Ok(RewardsConfig::default())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {:?}", path))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Allocate { request, config } => {
            let config = load_config(&config)?;
            let request: AllocationRequest = read_json(&request)?;

            tracing::info!(
                period = %request.pool.period_id,
                participants = request.pool.participants.len(),
                "Allocating reward pool"
            );

            let report = request.allocator(&config).report(&request.pool)?;
            print_json(&report)?;
        }

        Commands::Accrue {
            ledger,
            period_start,
            period_end,
            memberships,
            config,
        } => {
            let config = load_config(&config)?;
            let ledger: Vec<LedgerTransaction> = read_json(&ledger)?;
            let summary: AccrualSummary = config
                .accrual_engine()?
                .accrue(&ledger, period_start, period_end)?;

            match memberships {
                Some(path) => {
                    let memberships: HashMap<String, Tier> = read_json(&path)?;
                    print_json(&summary.into_participants(&memberships)?)?;
                }
                None => print_json(&summary)?,
            }
        }

        Commands::Estimate {
            rvus,
            pool,
            network_rvus,
        } => {
            print_json(&quick_estimate(rvus, pool, network_rvus)?)?;
        }

        Commands::Config { config } => match config {
            ConfigCommands::Init { output } => {
                let rendered = RewardsConfig::default().to_toml_string()?;
                match output {
                    Some(path) => {
                        std::fs::write(&path, rendered)
                            .with_context(|| format!("failed to write {:?}", path))?;
                        tracing::info!("Default configuration written to {:?}", path);
                    }
                    None => print!("{}", rendered),
                }
            }
            ConfigCommands::Check { path } => {
                let config = RewardsConfig::load(&path)
                    .with_context(|| format!("invalid configuration {:?}", path))?;
                tracing::info!(
                    transaction_types = config.transaction_types.len(),
                    tiers = config.tiers.len(),
                    promotion = config.promotion.is_some(),
                    "Configuration OK"
                );
            }
        },
    }

    Ok(())
}
