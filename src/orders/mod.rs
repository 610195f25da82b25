//! Order Management Module
//!
//! Order types and the active order book shared between the grid's
//! replenishment loop and its order-update handler.
//!
//! # Architecture
//!
//! - `ActiveOrderBook` - Lock-guarded mirror of resting bids and asks
//! - Core types - `Order`, `OrderId`, `OrderStatus`, `SubmitOrder`
//!
//! # Example
//!
//! ```ignore
//! use gridpioneer::orders::ActiveOrderBook;
//!
//! let book = ActiveOrderBook::new("BTC-USD");
//! book.add(accepted_orders).await;
//! let resting_bids = book.count_buy().await;
//! ```

mod book;
mod types;

pub use book::ActiveOrderBook;
pub use types::{Order, OrderId, OrderStatus, OrderType, SubmitOrder, TimeInForce};
