//! Ladder planning.
//!
//! Pure computation of the orders needed to bring one side of the grid back
//! to its target size. No I/O, no locking.

use rust_decimal::Decimal;

use super::config::GridConfig;
use crate::orders::SubmitOrder;
use crate::types::OrderSide;

/// Computes deficit-filling ladders for one symbol.
///
/// Rungs start at the band edge and step away from it: buys descend from
/// the lower band, sells ascend from the upper band. Prices are not checked
/// against the instrument's tick or lot size; the gateway rejects invalid ones.
#[derive(Debug, Clone, PartialEq)]
pub struct LadderPlanner {
    symbol: String,
    grid_pips: Decimal,
    grid_number: usize,
    quantity: Decimal,
}

impl LadderPlanner {
    pub fn new(symbol: impl Into<String>, grid_pips: Decimal, grid_number: usize, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            grid_pips,
            grid_number,
            quantity,
        }
    }

    pub fn from_config(config: &GridConfig) -> Self {
        Self::new(
            config.symbol.clone(),
            config.grid_pips,
            config.grid_number,
            config.base_quantity,
        )
    }

    /// Target resting orders per side.
    pub fn target(&self) -> usize {
        self.grid_number
    }

    /// Orders missing on a side given how many already rest there.
    pub fn deficit(&self, resting: usize) -> usize {
        self.grid_number.saturating_sub(resting)
    }

    /// Orders to submit on `side`, anchored at `band_edge`.
    ///
    /// Empty when the side is already at target or the band edge is not
    /// positive (band unavailable).
    pub fn plan(&self, side: OrderSide, resting: usize, band_edge: Decimal) -> Vec<SubmitOrder> {
        let deficit = self.deficit(resting);
        if deficit == 0 || band_edge <= Decimal::ZERO {
            return Vec::new();
        }

        let step = match side {
            OrderSide::Buy => -self.grid_pips,
            OrderSide::Sell => self.grid_pips,
        };

        (0..deficit)
            .map(|rung| {
                let price = band_edge + step * Decimal::from(rung as u64);
                SubmitOrder::limit(self.symbol.clone(), side, price, self.quantity)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::TimeInForce;
    use rust_decimal_macros::dec;

    fn prices(orders: &[SubmitOrder]) -> Vec<Decimal> {
        orders.iter().map(|o| o.price).collect()
    }

    #[test]
    fn test_empty_book_ladders_away_from_bands() {
        let planner = LadderPlanner::new("BTC-USD", dec!(1), 3, dec!(0.5));

        let bids = planner.plan(OrderSide::Buy, 0, dec!(100));
        assert_eq!(prices(&bids), vec![dec!(100), dec!(99), dec!(98)]);
        assert!(bids.iter().all(|o| o.side == OrderSide::Buy));

        let asks = planner.plan(OrderSide::Sell, 0, dec!(110));
        assert_eq!(prices(&asks), vec![dec!(110), dec!(111), dec!(112)]);
        assert!(asks
            .iter()
            .all(|o| o.side == OrderSide::Sell && o.quantity == dec!(0.5)));
        assert!(asks.iter().all(|o| o.time_in_force == TimeInForce::Gtc));
        assert!(asks.iter().all(|o| o.symbol == "BTC-USD"));
    }

    #[test]
    fn test_only_deficit_is_planned() {
        let planner = LadderPlanner::new("BTC-USD", dec!(1), 3, dec!(1));
        assert_eq!(planner.plan(OrderSide::Buy, 2, dec!(100)).len(), 1);
        assert!(planner.plan(OrderSide::Buy, 3, dec!(100)).is_empty());
        assert!(planner.plan(OrderSide::Sell, 5, dec!(110)).is_empty());
    }

    #[test]
    fn test_unavailable_band_plans_nothing() {
        let planner = LadderPlanner::new("BTC-USD", dec!(1), 3, dec!(1));
        assert!(planner.plan(OrderSide::Buy, 0, dec!(0)).is_empty());
        assert!(planner.plan(OrderSide::Sell, 0, dec!(-5)).is_empty());
    }

    #[test]
    fn test_decimal_steps_do_not_drift() {
        let planner = LadderPlanner::new("BTC-USD", dec!(0.1), 50, dec!(1));
        let asks = planner.plan(OrderSide::Sell, 0, dec!(0.3));
        assert_eq!(asks[49].price, dec!(5.2));

        let bids = planner.plan(OrderSide::Buy, 0, dec!(10.3));
        assert_eq!(bids[49].price, dec!(5.4));
    }
}
