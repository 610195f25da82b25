//! Per-venue session: market data subscriptions and the order-update stream.

use tokio::sync::mpsc;
use tracing::info;

use crate::orders::Order;
use crate::types::Interval;

/// Kline channel subscription registered by a strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KLineSubscription {
    pub symbol: String,
    pub interval: Interval,
}

/// Connection-scoped state handed to strategies at setup.
///
/// Strategies register the market data they need with [`subscribe_klines`](Self::subscribe_klines)
/// before the session starts streaming, and take the order-update receiver
/// once when they start running.
pub struct ExchangeSession {
    name: String,
    subscriptions: Vec<KLineSubscription>,
    order_updates: Option<mpsc::UnboundedReceiver<Order>>,
}

impl ExchangeSession {
    /// Create a session fed by an order-update channel.
    ///
    /// Updates are at-least-once and may arrive out of order.
    pub fn new(name: impl Into<String>, order_updates: mpsc::UnboundedReceiver<Order>) -> Self {
        Self {
            name: name.into(),
            subscriptions: Vec::new(),
            order_updates: Some(order_updates),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register interest in closed klines for a symbol. Duplicates are ignored.
    pub fn subscribe_klines(&mut self, symbol: &str, interval: Interval) {
        let subscription = KLineSubscription {
            symbol: symbol.to_string(),
            interval,
        };
        if self.subscriptions.contains(&subscription) {
            return;
        }
        info!(session = %self.name, symbol = symbol, interval = %interval, "Subscribed to klines");
        self.subscriptions.push(subscription);
    }

    pub fn subscriptions(&self) -> &[KLineSubscription] {
        &self.subscriptions
    }

    /// Take the order-update receiver. Returns `None` once taken.
    pub fn take_order_updates(&mut self) -> Option<mpsc::UnboundedReceiver<Order>> {
        self.order_updates.take()
    }
}
