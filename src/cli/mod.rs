//! CLI argument parsing using clap.
//!
//! This module defines the command-line interface for GridPioneer.

mod config;

pub use config::{CliConfigError, PaperRunConfig, PlanCliConfig};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GridPioneer - Grid order management engine
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Set the verbosity level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub verbose: String,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the grid against the paper exchange until Ctrl-C
    Grid {
        /// Path to the grid configuration file (JSON)
        #[arg(long)]
        config: PathBuf,
        /// Centre price of the synthetic trade feed
        #[arg(long, default_value_t = 100.0)]
        initial_price: f64,
        /// Peak price deviation of the feed as a fraction (0.02 = 2%)
        #[arg(long, default_value_t = 0.02)]
        volatility: f64,
        /// Starting quote currency balance
        #[arg(long, default_value_t = 10000.0)]
        quote_balance: f64,
        /// Starting base currency balance
        #[arg(long, default_value_t = 100.0)]
        base_balance: f64,
        /// Milliseconds between synthetic trades
        #[arg(long, default_value_t = 500)]
        tick_ms: u64,
        /// Override the kline length in seconds to warm the bands up faster
        #[arg(long)]
        kline_secs: Option<u64>,
    },

    /// Print the orders the planner would submit for given bands
    Plan {
        /// Path to the grid configuration file (JSON)
        #[arg(long)]
        config: PathBuf,
        /// Lower band; buys ladder down from here
        #[arg(long)]
        lower: f64,
        /// Upper band; sells ladder up from here
        #[arg(long)]
        upper: f64,
        /// Bids already resting
        #[arg(long, default_value_t = 0)]
        bids: usize,
        /// Asks already resting
        #[arg(long, default_value_t = 0)]
        asks: usize,
    },
}
