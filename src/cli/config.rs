//! CLI configuration structs bridging CLI arguments to domain types.
//!
//! Amounts arrive as `f64` from clap and are converted to `Decimal` here,
//! so command handlers only see validated values.

use rust_decimal::prelude::*;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when converting CLI arguments.
#[derive(Debug, Error)]
pub enum CliConfigError {
    #[error("Invalid {name}: {value} (must be a positive number)")]
    NotPositive { name: &'static str, value: f64 },

    #[error("Invalid {name}: {value} (must be zero or a positive number)")]
    Negative { name: &'static str, value: f64 },

    #[error("Invalid tick interval: must be at least 1 ms")]
    ZeroTick,
}

fn positive(name: &'static str, value: f64) -> Result<Decimal, CliConfigError> {
    Decimal::from_f64(value)
        .filter(|d| *d > Decimal::ZERO)
        .ok_or(CliConfigError::NotPositive { name, value })
}

fn non_negative(name: &'static str, value: f64) -> Result<Decimal, CliConfigError> {
    Decimal::from_f64(value)
        .filter(|d| *d >= Decimal::ZERO)
        .ok_or(CliConfigError::Negative { name, value })
}

/// Configuration for a paper grid run.
#[derive(Debug, Clone)]
pub struct PaperRunConfig {
    /// Grid config file
    pub config_path: PathBuf,
    /// Centre price of the synthetic feed
    pub initial_price: Decimal,
    /// Peak deviation of the synthetic feed as a fraction of the price
    pub volatility: f64,
    /// Starting quote currency balance
    pub quote_balance: Decimal,
    /// Starting base currency balance
    pub base_balance: Decimal,
    /// Time between synthetic trades
    pub tick_interval: Duration,
    /// Kline length override; the configured interval when `None`
    pub kline_period: Option<Duration>,
}

impl PaperRunConfig {
    /// # Errors
    /// Returns `CliConfigError` if a price, balance or interval is out of range.
    #[allow(clippy::too_many_arguments)]
    pub fn from_args(
        config_path: PathBuf,
        initial_price: f64,
        volatility: f64,
        quote_balance: f64,
        base_balance: f64,
        tick_ms: u64,
        kline_secs: Option<u64>,
    ) -> Result<Self, CliConfigError> {
        if tick_ms == 0 {
            return Err(CliConfigError::ZeroTick);
        }
        if !(volatility.is_finite() && volatility >= 0.0) {
            return Err(CliConfigError::Negative {
                name: "volatility",
                value: volatility,
            });
        }

        Ok(Self {
            config_path,
            initial_price: positive("initial price", initial_price)?,
            volatility,
            quote_balance: non_negative("quote balance", quote_balance)?,
            base_balance: non_negative("base balance", base_balance)?,
            tick_interval: Duration::from_millis(tick_ms),
            kline_period: kline_secs.filter(|s| *s > 0).map(Duration::from_secs),
        })
    }
}

/// Configuration for printing a planned ladder.
#[derive(Debug, Clone)]
pub struct PlanCliConfig {
    pub config_path: PathBuf,
    pub lower: Decimal,
    pub upper: Decimal,
    /// Bids already resting
    pub bids: usize,
    /// Asks already resting
    pub asks: usize,
}

impl PlanCliConfig {
    /// # Errors
    /// Returns `CliConfigError` if a band value is negative.
    pub fn from_args(
        config_path: PathBuf,
        lower: f64,
        upper: f64,
        bids: usize,
        asks: usize,
    ) -> Result<Self, CliConfigError> {
        // Zero is a valid input: it shows what an unavailable band plans.
        Ok(Self {
            config_path,
            lower: non_negative("lower band", lower)?,
            upper: non_negative("upper band", upper)?,
            bids,
            asks,
        })
    }
}
