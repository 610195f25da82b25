//! Paper Exchange
//!
//! In-memory venue for paper trading. Orders rest until a trade price
//! crosses them, funds are locked while orders rest, and every state change
//! is pushed to the order-update channel the way a venue's user stream would.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use super::{Balance, ExchangeError, ExchangeGateway};
use crate::orders::{Order, OrderId, OrderStatus, SubmitOrder};
use crate::types::{Market, OrderSide};

#[derive(Debug, Default)]
struct PaperState {
    balances: HashMap<String, Balance>,
    open: HashMap<OrderId, Order>,
}

impl PaperState {
    fn balance_mut(&mut self, currency: &str) -> &mut Balance {
        self.balances
            .entry(currency.to_string())
            .or_insert_with(|| Balance::new(currency, Decimal::ZERO))
    }
}

/// Simulated single-market exchange.
pub struct PaperExchange {
    market: Market,
    state: Mutex<PaperState>,
    updates: mpsc::UnboundedSender<Order>,
}

impl PaperExchange {
    /// Create a paper venue and the receiving end of its order-update stream.
    pub fn new(
        market: Market,
        balances: impl IntoIterator<Item = Balance>,
    ) -> (Self, mpsc::UnboundedReceiver<Order>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let state = PaperState {
            balances: balances
                .into_iter()
                .map(|b| (b.currency.clone(), b))
                .collect(),
            open: HashMap::new(),
        };
        (
            Self {
                market,
                state: Mutex::new(state),
                updates,
            },
            rx,
        )
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    /// Orders currently resting, sorted by price.
    pub async fn open_orders(&self) -> Vec<Order> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state.open.values().cloned().collect();
        orders.sort_by(|a, b| a.price.cmp(&b.price));
        orders
    }

    /// Fill every resting order the trade price crosses.
    ///
    /// Buys fill when the price trades at or below their limit, sells at or
    /// above. Fills execute the whole remaining quantity at the limit price.
    pub async fn on_trade(&self, price: Decimal) -> Vec<Order> {
        let mut state = self.state.lock().await;

        let crossed: Vec<OrderId> = state
            .open
            .values()
            .filter(|o| match o.side {
                OrderSide::Buy => price <= o.price,
                OrderSide::Sell => price >= o.price,
            })
            .map(|o| o.id.clone())
            .collect();

        let mut filled = Vec::with_capacity(crossed.len());
        for id in crossed {
            let Some(mut order) = state.open.remove(&id) else {
                continue;
            };
            let qty = order.remaining_quantity();
            let notional = order.price * qty;
            match order.side {
                OrderSide::Buy => {
                    state.balance_mut(&self.market.quote_currency).locked -= notional;
                    state.balance_mut(&self.market.base_currency).available += qty;
                }
                OrderSide::Sell => {
                    state.balance_mut(&self.market.base_currency).locked -= qty;
                    state.balance_mut(&self.market.quote_currency).available += notional;
                }
            }
            order.executed_quantity = order.quantity;
            order.status = OrderStatus::Filled;
            order.updated_at = Utc::now();

            info!(
                order_id = %order.id,
                side = %order.side,
                price = %order.price,
                quantity = %qty,
                "Paper order filled"
            );
            self.publish(order.clone());
            filled.push(order);
        }
        filled
    }

    fn publish(&self, order: Order) {
        if self.updates.send(order).is_err() {
            debug!("Order update receiver dropped; update discarded");
        }
    }

    /// Amount of funding currency a batch needs, per currency.
    fn required_funds(&self, orders: &[SubmitOrder]) -> HashMap<String, Decimal> {
        let mut required: HashMap<String, Decimal> = HashMap::new();
        for order in orders {
            let (currency, amount) = match order.side {
                OrderSide::Buy => (&self.market.quote_currency, order.notional()),
                OrderSide::Sell => (&self.market.base_currency, order.quantity),
            };
            *required.entry(currency.clone()).or_insert(Decimal::ZERO) += amount;
        }
        required
    }
}

#[async_trait]
impl ExchangeGateway for PaperExchange {
    async fn submit_orders(&self, orders: &[SubmitOrder]) -> Result<Vec<Order>, ExchangeError> {
        if let Some(order) = orders.iter().find(|o| o.symbol != self.market.symbol) {
            return Err(ExchangeError::UnknownSymbol(order.symbol.clone()));
        }
        if let Some(order) = orders
            .iter()
            .find(|o| o.price <= Decimal::ZERO || o.quantity <= Decimal::ZERO)
        {
            return Err(ExchangeError::Api(format!(
                "invalid price {} or quantity {}",
                order.price, order.quantity
            )));
        }

        let required = self.required_funds(orders);
        let mut state = self.state.lock().await;

        // The whole batch is rejected when any currency would be overdrawn.
        for (currency, amount) in &required {
            let available = state
                .balances
                .get(currency)
                .map(|b| b.available)
                .unwrap_or(Decimal::ZERO);
            if *amount > available {
                return Err(ExchangeError::InsufficientFunds {
                    currency: currency.clone(),
                    required: *amount,
                    available,
                });
            }
        }
        for (currency, amount) in required {
            let balance = state.balance_mut(&currency);
            balance.available -= amount;
            balance.locked += amount;
        }

        let now = Utc::now();
        let mut accepted = Vec::with_capacity(orders.len());
        for request in orders {
            let id = OrderId::new(uuid::Uuid::new_v4().to_string());
            let order = Order::accepted(id.clone(), request, now);
            state.open.insert(id, order.clone());
            self.publish(order.clone());
            accepted.push(order);
        }

        debug!(count = accepted.len(), "Paper orders accepted");
        Ok(accepted)
    }

    async fn cancel_orders(&self, orders: &[Order]) -> Result<(), ExchangeError> {
        let mut state = self.state.lock().await;
        for order in orders {
            let Some(mut open) = state.open.remove(&order.id) else {
                debug!(order_id = %order.id, "Cancel for order that is no longer open");
                continue;
            };
            let qty = open.remaining_quantity();
            let (currency, amount) = match open.side {
                OrderSide::Buy => (self.market.quote_currency.clone(), open.price * qty),
                OrderSide::Sell => (self.market.base_currency.clone(), qty),
            };
            let balance = state.balance_mut(&currency);
            balance.locked -= amount;
            balance.available += amount;

            open.status = OrderStatus::Canceled;
            open.updated_at = Utc::now();
            self.publish(open);
        }
        Ok(())
    }

    async fn account_balances(&self) -> Result<HashMap<String, Balance>, ExchangeError> {
        Ok(self.state.lock().await.balances.clone())
    }
}
