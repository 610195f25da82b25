//! Common Types Module
//!
//! Shared types used across the codebase to avoid circular dependencies.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Label used for metrics and structured logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static description of the traded instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    /// Trading symbol (e.g., "BTC-USD")
    pub symbol: String,
    /// Currency being bought or sold (e.g., "BTC")
    pub base_currency: String,
    /// Currency prices are quoted in (e.g., "USD")
    pub quote_currency: String,
}

impl Market {
    /// Currency whose balance funds an order on the given side.
    ///
    /// Buys spend quote currency, sells spend base currency.
    pub fn funding_currency(&self, side: OrderSide) -> &str {
        match side {
            OrderSide::Buy => &self.quote_currency,
            OrderSide::Sell => &self.base_currency,
        }
    }
}

/// Kline sampling interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    #[default]
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    FourHours,
    OneDay,
}

impl Interval {
    pub fn duration(&self) -> Duration {
        let secs = match self {
            Interval::OneMinute => 60,
            Interval::FiveMinutes => 5 * 60,
            Interval::FifteenMinutes => 15 * 60,
            Interval::ThirtyMinutes => 30 * 60,
            Interval::OneHour => 60 * 60,
            Interval::FourHours => 4 * 60 * 60,
            Interval::OneDay => 24 * 60 * 60,
        };
        Duration::from_secs(secs)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::OneHour => "1h",
            Interval::FourHours => "4h",
            Interval::OneDay => "1d",
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" => Ok(Interval::OneMinute),
            "5m" => Ok(Interval::FiveMinutes),
            "15m" => Ok(Interval::FifteenMinutes),
            "30m" => Ok(Interval::ThirtyMinutes),
            "1h" => Ok(Interval::OneHour),
            "4h" => Ok(Interval::FourHours),
            "1d" => Ok(Interval::OneDay),
            _ => Err(format!(
                "Unknown interval: '{}'. Valid options: 1m, 5m, 15m, 30m, 1h, 4h, 1d",
                s
            )),
        }
    }
}

impl TryFrom<String> for Interval {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(value: Interval) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_from_str() {
        assert_eq!("1m".parse::<Interval>().unwrap(), Interval::OneMinute);
        assert_eq!("1H".parse::<Interval>().unwrap(), Interval::OneHour);
        assert!("2m".parse::<Interval>().is_err());
        assert_eq!(Interval::FiveMinutes.duration(), Duration::from_secs(300));
    }

    #[test]
    fn test_default_interval_is_one_minute() {
        assert_eq!(Interval::default(), Interval::OneMinute);
        assert_eq!(Interval::default().duration(), Duration::from_secs(60));
    }

    #[test]
    fn test_funding_currency() {
        let market = Market {
            symbol: "BTC-USD".to_string(),
            base_currency: "BTC".to_string(),
            quote_currency: "USD".to_string(),
        };
        assert_eq!(market.funding_currency(OrderSide::Buy), "USD");
        assert_eq!(market.funding_currency(OrderSide::Sell), "BTC");
    }
}
