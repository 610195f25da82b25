//! Grid strategy runtime.
//!
//! Two tasks share one [`ActiveOrderBook`]:
//!
//! - the replenisher, which ticks on a timer, reads balances and bands, and
//!   submits whatever the ladder is missing on each side;
//! - the reconciler, which consumes the exchange's order-update stream and
//!   removes or refreshes book entries.
//!
//! Gateway calls are never made while the book lock is held, so a fill can
//! land between a tick's count and its submission. The next tick corrects
//! any resulting over- or undershoot.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::{ConfigError, GridConfig};
use super::planner::LadderPlanner;
use crate::exchange::{Balance, ExchangeGateway, ExchangeSession};
use crate::indicator::{BandSnapshot, SignalSource};
use crate::metrics;
use crate::orders::{ActiveOrderBook, Order, OrderStatus};
use crate::types::{Market, OrderSide};

/// Errors raised when starting a grid. Nothing fails once it runs.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("Invalid grid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Order update stream already taken from session")]
    OrderStreamTaken,
}

/// Why a side was left alone during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Funding currency missing or not positive
    BalanceUnavailable,
    /// Band edge not computed yet
    BandUnavailable,
    /// Side already holds the target number of orders
    TargetMet,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::BalanceUnavailable => "balance_unavailable",
            SkipReason::BandUnavailable => "band_unavailable",
            SkipReason::TargetMet => "target_met",
        }
    }
}

/// What a tick did on one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideOutcome {
    /// Batch accepted; number of orders added to the book
    Submitted(usize),
    Skipped(SkipReason),
    /// Gateway refused the batch; the deficit is retried next tick
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplenishReport {
    pub buy: SideOutcome,
    pub sell: SideOutcome,
}

/// Join handles of the two tasks started by [`GridStrategy::run`].
pub struct GridHandles {
    pub replenisher: JoinHandle<()>,
    pub reconciler: JoinHandle<()>,
}

/// Keeps `grid_number` limit orders resting on each side of a price band.
pub struct GridStrategy {
    config: GridConfig,
    market: Market,
    planner: LadderPlanner,
    book: ActiveOrderBook,
    signals: Arc<dyn SignalSource>,
}

impl GridStrategy {
    /// Create a strategy with an empty book.
    ///
    /// # Errors
    /// Returns `GridError::Config` if the configuration is invalid.
    pub fn new(config: GridConfig, signals: Arc<dyn SignalSource>) -> Result<Self, GridError> {
        let config = config.validated()?;
        let market = config.market()?;
        Ok(Self {
            planner: LadderPlanner::from_config(&config),
            book: ActiveOrderBook::new(config.symbol.clone()),
            config,
            market,
            signals,
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn book(&self) -> &ActiveOrderBook {
        &self.book
    }

    /// Register the market data the band computation needs.
    pub fn subscribe(&self, session: &mut ExchangeSession) {
        session.subscribe_klines(&self.config.symbol, self.config.interval);
    }

    /// Start the replenisher and reconciler tasks and return immediately.
    ///
    /// Both stop when `shutdown` is cancelled. On the way out the replenisher
    /// issues one batch cancel for every order in the book without waiting
    /// for its result. The book is empty at start: orders left resting by a
    /// previous process are not tracked.
    ///
    /// # Errors
    /// Returns `GridError::OrderStreamTaken` if the session's order updates
    /// were already consumed.
    pub fn run(
        self: Arc<Self>,
        shutdown: CancellationToken,
        gateway: Arc<dyn ExchangeGateway>,
        session: &mut ExchangeSession,
    ) -> Result<GridHandles, GridError> {
        let mut updates = session
            .take_order_updates()
            .ok_or(GridError::OrderStreamTaken)?;

        info!(
            symbol = %self.config.symbol,
            grid_number = self.config.grid_number,
            grid_pips = %self.config.grid_pips,
            quantity = %self.config.base_quantity,
            session = session.name(),
            "Starting grid strategy"
        );

        let reconciler = {
            let strategy = Arc::clone(&self);
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => break,
                        update = updates.recv() => match update {
                            Some(order) => strategy.handle_order_update(order).await,
                            None => {
                                warn!("Order update stream closed");
                                break;
                            }
                        },
                    }
                }
            })
        };

        let replenisher = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.refresh_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    // The first tick completes immediately.
                    _ = ticker.tick() => {
                        self.replenish(gateway.as_ref()).await;
                    }
                }
            }

            self.cancel_resting(gateway).await;
        });

        Ok(GridHandles {
            replenisher,
            reconciler,
        })
    }

    /// One replenishment pass over both sides.
    pub async fn replenish(&self, gateway: &dyn ExchangeGateway) -> ReplenishReport {
        let bids = self.book.count_buy().await;
        let asks = self.book.count_sell().await;
        info!(symbol = %self.config.symbol, bids, asks, "checking grid orders");
        self.book.log_orders().await;

        let balances = match gateway.account_balances().await {
            Ok(balances) => Some(balances),
            Err(e) => {
                warn!(error = %e, "Balance query failed; skipping both sides this tick");
                None
            }
        };
        let bands = self.signals.bands();

        let buy = self
            .replenish_side(gateway, OrderSide::Buy, balances.as_ref(), &bands)
            .await;
        let sell = self
            .replenish_side(gateway, OrderSide::Sell, balances.as_ref(), &bands)
            .await;

        ReplenishReport { buy, sell }
    }

    async fn replenish_side(
        &self,
        gateway: &dyn ExchangeGateway,
        side: OrderSide,
        balances: Option<&HashMap<String, Balance>>,
        bands: &BandSnapshot,
    ) -> SideOutcome {
        let currency = self.market.funding_currency(side);
        let funded = balances
            .and_then(|b| b.get(currency))
            .is_some_and(|b| b.available > Decimal::ZERO);
        if !funded {
            return self.skip(side, SkipReason::BalanceUnavailable);
        }

        let edge = match side {
            OrderSide::Buy => bands.lower_edge(),
            OrderSide::Sell => bands.upper_edge(),
        };
        let Some(edge) = edge else {
            return self.skip(side, SkipReason::BandUnavailable);
        };

        let resting = self.book.count(side).await;
        let orders = self.planner.plan(side, resting, edge);
        if orders.is_empty() {
            return self.skip(side, SkipReason::TargetMet);
        }

        info!(
            side = %side,
            resting = resting,
            target = self.planner.target(),
            submitting = orders.len(),
            band_edge = %edge,
            "active orders not enough, updating"
        );

        match gateway.submit_orders(&orders).await {
            Ok(accepted) => {
                let count = accepted.len();
                metrics::record_submitted(&self.config.symbol, side.as_str(), count);
                self.book.add(accepted).await;
                info!(side = %side, count = count, "Orders added to the active order pool");
                SideOutcome::Submitted(count)
            }
            Err(e) => {
                metrics::record_dropped_batch(&self.config.symbol, side.as_str());
                error!(
                    side = %side,
                    orders = orders.len(),
                    error = %e,
                    "Submit order batch failed; dropping batch until next tick"
                );
                SideOutcome::Failed
            }
        }
    }

    fn skip(&self, side: OrderSide, reason: SkipReason) -> SideOutcome {
        debug!(side = %side, reason = reason.as_str(), "Skipping side");
        metrics::record_skipped_side(&self.config.symbol, side.as_str(), reason.as_str());
        SideOutcome::Skipped(reason)
    }

    /// Apply one exchange order update to the book.
    ///
    /// Filled orders are written off, cancelled and rejected ones deleted,
    /// and tracked live orders refreshed in place. Updates for other symbols
    /// or untracked live orders leave the book unchanged.
    pub async fn handle_order_update(&self, order: Order) {
        info!(
            order_id = %order.id,
            symbol = %order.symbol,
            side = %order.side,
            status = %order.status,
            price = %order.price,
            executed = %order.executed_quantity,
            "received order update"
        );

        if order.symbol != self.config.symbol {
            return;
        }

        match order.status {
            OrderStatus::Filled => {
                self.book.write_off(&order).await;
            }
            OrderStatus::Canceled | OrderStatus::Rejected => {
                info!(
                    order_id = %order.id,
                    status = %order.status,
                    "removing order from the active order pool"
                );
                self.book.delete(&order).await;
            }
            OrderStatus::New | OrderStatus::PartiallyFilled => {
                let id = order.id.clone();
                if !self.book.update(order).await {
                    debug!(order_id = %id, "Update for untracked order ignored");
                }
            }
        }
    }

    /// Issue a batch cancel for every tracked order without awaiting it.
    async fn cancel_resting(&self, gateway: Arc<dyn ExchangeGateway>) {
        let orders = self.book.snapshot().await;
        if orders.is_empty() {
            info!("No resting grid orders to cancel");
            return;
        }

        info!(count = orders.len(), "Cancelling resting grid orders");
        tokio::spawn(async move {
            if let Err(e) = gateway.cancel_orders(&orders).await {
                warn!(error = %e, count = orders.len(), "Shutdown cancel failed");
            }
        });
    }
}
