//! Active order book shared by the replenishment loop and the order-update handler.
//!
//! Mirrors the orders we believe are resting at the exchange, split into bids
//! and asks. All access goes through a single lock so counts never observe a
//! half-applied mutation.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use super::types::{Order, OrderId, OrderStatus};
use crate::metrics;
use crate::types::OrderSide;

/// Closed ids remembered per book before the oldest are forgotten.
pub const DEFAULT_CLOSED_CAPACITY: usize = 4096;

/// Recently closed ids, oldest evicted first.
#[derive(Debug)]
struct ClosedIds {
    ids: HashSet<OrderId>,
    order: VecDeque<OrderId>,
    capacity: usize,
}

impl ClosedIds {
    fn new(capacity: usize) -> Self {
        Self {
            ids: HashSet::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    fn insert(&mut self, id: OrderId) {
        if !self.ids.insert(id.clone()) {
            return;
        }
        self.order.push_back(id);
        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
    }

    fn contains(&self, id: &OrderId) -> bool {
        self.ids.contains(id)
    }
}

#[derive(Debug)]
struct BookSides {
    bids: HashMap<OrderId, Order>,
    asks: HashMap<OrderId, Order>,
    /// Ids removed because of a terminal status. A late non-terminal update
    /// or submission result for one of them is ignored.
    closed: ClosedIds,
}

impl BookSides {
    fn side_mut(&mut self, side: OrderSide) -> &mut HashMap<OrderId, Order> {
        match side {
            OrderSide::Buy => &mut self.bids,
            OrderSide::Sell => &mut self.asks,
        }
    }

    fn remove(&mut self, id: &OrderId) -> Option<Order> {
        self.bids.remove(id).or_else(|| self.asks.remove(id))
    }
}

/// Thread-safe book of resting grid orders.
///
/// Cloning is cheap and every clone shares the same underlying state.
///
/// # Consistency
///
/// Membership means "believed resting", not exchange ground truth. An id
/// lives in at most one side and every order sits on the side matching its
/// `side` field. The book starts empty on every process start.
#[derive(Clone)]
pub struct ActiveOrderBook {
    symbol: String,
    sides: Arc<RwLock<BookSides>>,
}

impl ActiveOrderBook {
    /// Create an empty book. `symbol` labels the book's metrics.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self::with_closed_capacity(symbol, DEFAULT_CLOSED_CAPACITY)
    }

    /// Create an empty book remembering at most `closed_capacity` closed ids.
    pub fn with_closed_capacity(symbol: impl Into<String>, closed_capacity: usize) -> Self {
        Self {
            symbol: symbol.into(),
            sides: Arc::new(RwLock::new(BookSides {
                bids: HashMap::new(),
                asks: HashMap::new(),
                closed: ClosedIds::new(closed_capacity),
            })),
        }
    }

    /// Upsert orders by id.
    ///
    /// Duplicate ids replace the stored order. Ids already closed by a
    /// terminal update are ignored, as are orders carrying a terminal status.
    pub async fn add(&self, orders: impl IntoIterator<Item = Order>) {
        let mut sides = self.sides.write().await;
        for order in orders {
            if order.is_terminal() || sides.closed.contains(&order.id) {
                debug!(order_id = %order.id, status = %order.status, "Ignoring closed order");
                continue;
            }
            // Keep the id on exactly one side.
            sides.remove(&order.id);
            let id = order.id.clone();
            sides.side_mut(order.side).insert(id, order);
        }
        self.publish_gauges(&sides);
    }

    /// Refresh a tracked order in place. Returns false if the id is untracked.
    ///
    /// An update reporting less executed quantity than the stored order is
    /// older than what we hold and is dropped; the order stays tracked.
    pub async fn update(&self, order: Order) -> bool {
        let mut sides = self.sides.write().await;
        let stored = sides
            .bids
            .get(&order.id)
            .or_else(|| sides.asks.get(&order.id))
            .map(|o| o.executed_quantity);
        let Some(stored_executed) = stored else {
            return false;
        };
        if order.executed_quantity < stored_executed {
            debug!(
                order_id = %order.id,
                executed = %order.executed_quantity,
                stored = %stored_executed,
                "Ignoring stale order update"
            );
            return true;
        }
        sides.remove(&order.id);
        let id = order.id.clone();
        sides.side_mut(order.side).insert(id, order);
        self.publish_gauges(&sides);
        true
    }

    /// Remove an order that will not rest anymore (cancelled, rejected).
    ///
    /// When the id is absent nothing is removed, but the id is still
    /// remembered as closed: its submission result may not have arrived yet.
    pub async fn delete(&self, order: &Order) -> Option<Order> {
        let reason = match order.status {
            OrderStatus::Canceled => "canceled",
            OrderStatus::Rejected => "rejected",
            _ => "deleted",
        };
        self.remove(order, reason).await
    }

    /// Remove an order because it was filled.
    ///
    /// Behaves exactly like [`delete`](Self::delete); only the recorded reason differs.
    pub async fn write_off(&self, order: &Order) -> Option<Order> {
        self.remove(order, "filled").await
    }

    async fn remove(&self, order: &Order, reason: &str) -> Option<Order> {
        let mut sides = self.sides.write().await;
        sides.closed.insert(order.id.clone());
        let removed = sides.remove(&order.id);
        if let Some(removed) = &removed {
            metrics::record_book_removal(&self.symbol, removed.side.as_str(), reason);
            info!(
                order_id = %removed.id,
                side = %removed.side,
                price = %removed.price,
                reason = reason,
                "Order removed from active book"
            );
        }
        self.publish_gauges(&sides);
        removed
    }

    pub async fn count_buy(&self) -> usize {
        self.sides.read().await.bids.len()
    }

    pub async fn count_sell(&self) -> usize {
        self.sides.read().await.asks.len()
    }

    /// Number of resting orders on one side.
    pub async fn count(&self, side: OrderSide) -> usize {
        match side {
            OrderSide::Buy => self.count_buy().await,
            OrderSide::Sell => self.count_sell().await,
        }
    }

    pub async fn contains(&self, id: &OrderId) -> bool {
        let sides = self.sides.read().await;
        sides.bids.contains_key(id) || sides.asks.contains_key(id)
    }

    /// Copy of every resting order, bids first, each side sorted by id.
    pub async fn snapshot(&self) -> Vec<Order> {
        let sides = self.sides.read().await;
        let mut bids: Vec<Order> = sides.bids.values().cloned().collect();
        let mut asks: Vec<Order> = sides.asks.values().cloned().collect();
        bids.sort_by(|a, b| a.id.cmp(&b.id));
        asks.sort_by(|a, b| a.id.cmp(&b.id));
        bids.extend(asks);
        bids
    }

    /// Dump the book at debug level, best bid/ask first.
    pub async fn log_orders(&self) {
        let sides = self.sides.read().await;
        let mut bids: Vec<&Order> = sides.bids.values().collect();
        let mut asks: Vec<&Order> = sides.asks.values().collect();
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));

        for order in bids.into_iter().chain(asks) {
            debug!(
                order_id = %order.id,
                side = %order.side,
                price = %order.price,
                quantity = %order.quantity,
                executed = %order.executed_quantity,
                status = %order.status,
                "Active order"
            );
        }
    }

    fn publish_gauges(&self, sides: &BookSides) {
        metrics::set_resting_orders(&self.symbol, OrderSide::Buy.as_str(), sides.bids.len());
        metrics::set_resting_orders(&self.symbol, OrderSide::Sell.as_str(), sides.asks.len());
    }
}
