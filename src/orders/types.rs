//! Core types for order management.
//!
//! Provides type-safe order identifiers, order requests, and the
//! exchange-reported order lifecycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::OrderSide;

/// Type-safe order identifier (exchange-assigned).
///
/// Uses a newtype wrapper to prevent accidentally mixing order IDs
/// with other string types at compile time.
///
/// # Example
///
/// ```
/// use gridpioneer::orders::OrderId;
///
/// let id = OrderId::new("abc-123-def");
/// assert_eq!(id.as_str(), "abc-123-def");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(String);

impl OrderId {
    /// Create a new OrderId from any string-like type.
    ///
    /// # Panics
    ///
    /// Debug builds will panic if the ID is empty. Release builds log a warning.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let s: String = id.into();
        debug_assert!(!s.is_empty(), "OrderId cannot be empty");
        if s.is_empty() {
            tracing::warn!("Creating OrderId with empty string - this may cause tracking issues");
        }
        Self(s)
    }

    /// Get the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Order lifecycle states as reported by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted and resting, nothing executed yet
    New,
    /// Some quantity executed, remainder still resting
    PartiallyFilled,
    /// All quantity executed
    Filled,
    /// Cancelled (by us, by the user, or by the exchange)
    Canceled,
    /// Refused by the exchange
    Rejected,
}

impl OrderStatus {
    /// Returns true if order is in a terminal state (never resting again).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Canceled | Self::Rejected)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "NEW"),
            Self::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            Self::Filled => write!(f, "FILLED"),
            Self::Canceled => write!(f, "CANCELED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    Market,
}

/// How long an order stays on the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good till canceled
    Gtc,
    /// Immediate or cancel
    Ioc,
}

impl std::fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gtc => write!(f, "GTC"),
            Self::Ioc => write!(f, "IOC"),
        }
    }
}

/// Order request handed to the exchange gateway. Has no id until accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitOrder {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub price: Decimal,
    pub quantity: Decimal,
    pub time_in_force: TimeInForce,
}

impl SubmitOrder {
    /// Good-till-canceled limit order.
    #[must_use]
    pub fn limit(symbol: impl Into<String>, side: OrderSide, price: Decimal, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Limit,
            price,
            quantity,
            time_in_force: TimeInForce::Gtc,
        }
    }

    /// Notional value of the order in quote currency.
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }
}

/// An order known to the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Exchange-assigned order ID
    pub id: OrderId,
    /// Trading symbol (e.g., "BTC-USD")
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub price: Decimal,
    /// Originally requested quantity
    pub quantity: Decimal,
    /// Quantity executed so far
    pub executed_quantity: Decimal,
    pub status: OrderStatus,
    pub time_in_force: TimeInForce,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build the accepted order for a request, in `New` status.
    #[must_use]
    pub fn accepted(id: OrderId, request: &SubmitOrder, now: DateTime<Utc>) -> Self {
        Self {
            id,
            symbol: request.symbol.clone(),
            side: request.side,
            order_type: request.order_type,
            price: request.price,
            quantity: request.quantity,
            executed_quantity: Decimal::ZERO,
            status: OrderStatus::New,
            time_in_force: request.time_in_force,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Quantity still resting on the book.
    pub fn remaining_quantity(&self) -> Decimal {
        (self.quantity - self.executed_quantity).max(Decimal::ZERO)
    }
}
