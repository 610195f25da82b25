//! Grid configuration loaded from JSON.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::types::{Interval, Market};

/// Grid size used when the config asks for zero orders per side.
pub const DEFAULT_GRID_NUMBER: usize = 2;

/// Errors that can occur when loading or validating a grid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn default_refresh_interval_secs() -> u64 {
    60
}

fn default_bollinger_window() -> usize {
    21
}

fn default_bollinger_band_width() -> Decimal {
    dec!(2)
}

/// Parameters of one grid run. Immutable once the strategy starts.
///
/// Keys are camelCase in the file:
///
/// ```json
/// {
///   "symbol": "BTC-USD",
///   "interval": "1m",
///   "gridPips": "0.5",
///   "gridNumber": 5,
///   "baseQuantity": "0.01"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    /// Trading symbol (e.g., "BTC-USD")
    pub symbol: String,
    /// Kline interval the bands are computed on
    #[serde(default)]
    pub interval: Interval,
    /// Price distance between two rungs
    pub grid_pips: Decimal,
    /// Target resting orders per side (0 means the default of 2)
    #[serde(default)]
    pub grid_number: usize,
    /// Quantity of every rung
    pub base_quantity: Decimal,
    /// Defaults to the part of the symbol before the separator
    #[serde(default)]
    pub base_currency: Option<String>,
    /// Defaults to the part of the symbol after the separator
    #[serde(default)]
    pub quote_currency: Option<String>,
    /// Seconds between replenishment ticks
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_bollinger_window")]
    pub bollinger_window: usize,
    /// Band half-width in standard deviations
    #[serde(default = "default_bollinger_band_width")]
    pub bollinger_band_width: Decimal,
}

impl GridConfig {
    /// Config with defaults for everything but the required fields.
    pub fn new(symbol: impl Into<String>, grid_pips: Decimal, grid_number: usize, base_quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            interval: Interval::default(),
            grid_pips,
            grid_number,
            base_quantity,
            base_currency: None,
            quote_currency: None,
            refresh_interval_secs: default_refresh_interval_secs(),
            bollinger_window: default_bollinger_window(),
            bollinger_band_width: default_bollinger_band_width(),
        }
    }

    /// Load, normalize and validate a config file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed or fails validation.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path.as_ref())?;
        let config: GridConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validated()
    }

    /// Fill defaults and check invariants.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` describing the first violated rule.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".to_string()));
        }
        if self.grid_pips <= Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "gridPips must be positive, got {}",
                self.grid_pips
            )));
        }
        if self.base_quantity <= Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "baseQuantity must be positive, got {}",
                self.base_quantity
            )));
        }
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "refreshIntervalSecs must be at least 1".to_string(),
            ));
        }
        if self.bollinger_window < 2 {
            return Err(ConfigError::Invalid(format!(
                "bollingerWindow must be at least 2, got {}",
                self.bollinger_window
            )));
        }
        if self.bollinger_band_width <= Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "bollingerBandWidth must be positive, got {}",
                self.bollinger_band_width
            )));
        }
        if self.grid_number == 0 {
            info!(
                default = DEFAULT_GRID_NUMBER,
                "gridNumber not set, using default"
            );
            self.grid_number = DEFAULT_GRID_NUMBER;
        }
        self.market()?;
        Ok(self)
    }

    /// Market description derived from the symbol and explicit currencies.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` when a currency is missing and the
    /// symbol has no `-` or `/` separator to derive it from.
    pub fn market(&self) -> Result<Market, ConfigError> {
        let split = self
            .symbol
            .split_once(|c: char| c == '-' || c == '/')
            .filter(|(base, quote)| !base.is_empty() && !quote.is_empty());

        let base = self
            .base_currency
            .clone()
            .or_else(|| split.map(|(b, _)| b.to_string()));
        let quote = self
            .quote_currency
            .clone()
            .or_else(|| split.map(|(_, q)| q.to_string()));

        match (base, quote) {
            (Some(base_currency), Some(quote_currency)) => Ok(Market {
                symbol: self.symbol.clone(),
                base_currency,
                quote_currency,
            }),
            _ => Err(ConfigError::Invalid(format!(
                "cannot derive currencies from symbol '{}'; set baseCurrency and quoteCurrency",
                self.symbol
            ))),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}
