//! Exchange Abstraction Layer
//!
//! Exchange-agnostic gateway trait used by the grid engine. Venue bindings
//! implement `ExchangeGateway`; the engine never talks to a venue directly.

pub mod paper;
mod session;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::orders::{Order, OrderId, SubmitOrder};

pub use paper::PaperExchange;
pub use session::{ExchangeSession, KLineSubscription};

/// Errors returned by exchange gateways.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    /// Venue refused the request
    #[error("API error: {0}")]
    Api(String),

    /// Transport failure, outcome unknown
    #[error("Network error: {0}")]
    Network(String),

    /// Not enough free balance to fund the batch
    #[error("Insufficient {currency} balance: required {required}, available {available}")]
    InsufficientFunds {
        currency: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),
}

/// Account balance of one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub currency: String,
    /// Free to fund new orders
    pub available: Decimal,
    /// Reserved by resting orders
    pub locked: Decimal,
}

impl Balance {
    pub fn new(currency: impl Into<String>, available: Decimal) -> Self {
        Self {
            currency: currency.into(),
            available,
            locked: Decimal::ZERO,
        }
    }
}

/// Order submission, cancellation and balance queries.
///
/// Every call is a round trip that may fail. Implementations must be safe
/// to call concurrently from several tasks.
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Submit a batch of orders, returning the accepted orders with their ids.
    async fn submit_orders(&self, orders: &[SubmitOrder]) -> Result<Vec<Order>, ExchangeError>;

    /// Cancel a batch of orders.
    async fn cancel_orders(&self, orders: &[Order]) -> Result<(), ExchangeError>;

    /// Balances keyed by currency.
    async fn account_balances(&self) -> Result<HashMap<String, Balance>, ExchangeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_funds_message() {
        let err = ExchangeError::InsufficientFunds {
            currency: "USD".to_string(),
            required: dec!(300),
            available: dec!(100),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient USD balance: required 300, available 100"
        );
    }
}
