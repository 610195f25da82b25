//! Market data feeds for paper runs.
//!
//! Trade ticks come from a `MarketDataProvider`; `KLineBuilder` folds them
//! into closed kline prices for the band indicator.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::error::Error;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::types::Interval;

/// A single trade print.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketTick {
    pub symbol: String,
    pub price: Decimal,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// Trait for market data providers. Enables swapping between different data sources
/// (WebSocket, synthetic, replay) without changing strategy code.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Subscribe to trades for the given symbols.
    ///
    /// The feed stops once the returned receiver is dropped.
    async fn subscribe(
        &self,
        symbols: Vec<String>,
    ) -> Result<mpsc::Receiver<MarketTick>, Box<dyn Error + Send + Sync>>;
}

/// Synthetic trade feed for running without an exchange connection.
///
/// Prices oscillate around `base_price` on a sine wave, so a grid placed
/// around the start price sees both sides fill over time.
pub struct SyntheticProvider {
    base_price: Decimal,
    volatility: f64,
    tick_interval_ms: u64,
}

impl SyntheticProvider {
    /// Create a new synthetic provider
    ///
    /// # Arguments
    /// * `base_price` - Centre of the oscillation (e.g., 50000 for BTC)
    /// * `volatility` - Peak deviation as a fraction of `base_price` (e.g., 0.01 = 1%)
    /// * `tick_interval_ms` - Time between ticks in milliseconds
    pub fn new(base_price: Decimal, volatility: f64, tick_interval_ms: u64) -> Self {
        Self {
            base_price,
            volatility,
            tick_interval_ms,
        }
    }

    /// Price of the `n`th tick.
    pub fn price_at(&self, n: u64) -> Decimal {
        let offset = (n as f64 * 0.05).sin() * self.volatility;
        let factor = Decimal::ONE + Decimal::try_from(offset).unwrap_or(Decimal::ZERO);
        (self.base_price * factor).round_dp(2)
    }
}

#[async_trait]
impl MarketDataProvider for SyntheticProvider {
    async fn subscribe(
        &self,
        symbols: Vec<String>,
    ) -> Result<mpsc::Receiver<MarketTick>, Box<dyn Error + Send + Sync>> {
        let (tx, rx) = mpsc::channel(1000);
        let provider = SyntheticProvider::new(self.base_price, self.volatility, self.tick_interval_ms);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(provider.tick_interval_ms));
            let mut tick_count: u64 = 0;

            loop {
                ticker.tick().await;
                let price = provider.price_at(tick_count);

                for symbol in &symbols {
                    let tick = MarketTick {
                        symbol: symbol.clone(),
                        price,
                        timestamp: chrono::Utc::now().timestamp_millis(),
                    };

                    // Drop stale ticks rather than lag behind the consumer
                    match tx.try_send(tick) {
                        Ok(_) => {}
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            warn!(symbol = %symbol, "Synthetic tick dropped, consumer lagging");
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => return,
                    }
                }

                tick_count += 1;
            }
        });

        Ok(rx)
    }
}

/// Aggregates trade ticks into kline closes, one builder per symbol.
#[derive(Debug)]
pub struct KLineBuilder {
    interval_ms: i64,
    open_buckets: HashMap<String, (i64, Decimal)>,
}

impl KLineBuilder {
    pub fn new(interval: Interval) -> Self {
        Self::with_period(interval.duration())
    }

    /// Builder with an arbitrary bucket length, for accelerated paper runs.
    pub fn with_period(period: Duration) -> Self {
        Self {
            interval_ms: (period.as_millis() as i64).max(1),
            open_buckets: HashMap::new(),
        }
    }

    /// Record a trade. Returns the close of the previous kline when this
    /// tick opens a new one.
    pub fn on_tick(&mut self, tick: &MarketTick) -> Option<Decimal> {
        let bucket = tick.timestamp.div_euclid(self.interval_ms);

        match self.open_buckets.get_mut(&tick.symbol) {
            Some((open, last)) if *open == bucket => {
                *last = tick.price;
                None
            }
            Some((open, last)) if bucket > *open => {
                let close = *last;
                *open = bucket;
                *last = tick.price;
                debug!(symbol = %tick.symbol, close = %close, "Kline closed");
                Some(close)
            }
            // Out-of-order tick from an already closed kline
            Some(_) => None,
            None => {
                self.open_buckets
                    .insert(tick.symbol.clone(), (bucket, tick.price));
                None
            }
        }
    }
}
