//! Property-based tests for ladder arithmetic and book bookkeeping
//!
//! These tests use proptest to verify invariants across many random inputs,
//! catching edge cases that unit tests might miss.

use chrono::Utc;
use gridpioneer::grid::LadderPlanner;
use gridpioneer::orders::{ActiveOrderBook, Order, OrderId, OrderStatus, SubmitOrder};
use gridpioneer::types::OrderSide;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};

fn side_strategy() -> impl Strategy<Value = OrderSide> {
    prop_oneof![Just(OrderSide::Buy), Just(OrderSide::Sell)]
}

/// Decimal with two fractional digits in `(0, max]`
fn price_strategy(max_cents: i64) -> impl Strategy<Value = Decimal> {
    (1i64..=max_cents).prop_map(|cents| Decimal::new(cents, 2))
}

#[derive(Debug, Clone)]
enum BookOp {
    Add(u8, OrderSide),
    Update(u8, OrderSide),
    Fill(u8),
    Cancel(u8),
}

fn op_strategy() -> impl Strategy<Value = BookOp> {
    prop_oneof![
        3 => (0u8..16, side_strategy()).prop_map(|(id, side)| BookOp::Add(id, side)),
        1 => (0u8..16, side_strategy()).prop_map(|(id, side)| BookOp::Update(id, side)),
        1 => (0u8..16).prop_map(BookOp::Fill),
        1 => (0u8..16).prop_map(BookOp::Cancel),
    ]
}

fn order(id: u8, side: OrderSide, status: OrderStatus) -> Order {
    let request = SubmitOrder::limit("BTC-USD", side, dec!(100), dec!(1));
    let mut order = Order::accepted(OrderId::new(format!("o-{id:02}")), &request, Utc::now());
    order.status = status;
    order
}

proptest! {
    /// The planner submits exactly the deficit.
    #[test]
    fn prop_plan_size_is_deficit(
        grid_number in 1usize..20,
        resting in 0usize..30,
        side in side_strategy(),
        edge in price_strategy(10_000_000),
    ) {
        let planner = LadderPlanner::new("BTC-USD", dec!(0.5), grid_number, dec!(1));
        let orders = planner.plan(side, resting, edge);
        prop_assert_eq!(orders.len(), grid_number.saturating_sub(resting));
    }

    /// Rungs start at the band edge and move away from it by exactly one step.
    #[test]
    fn prop_rungs_step_away_from_edge(
        grid_number in 1usize..30,
        side in side_strategy(),
        pips in price_strategy(10_000),
        edge in price_strategy(10_000_000),
    ) {
        let planner = LadderPlanner::new("BTC-USD", pips, grid_number, dec!(1));
        let orders = planner.plan(side, 0, edge);

        prop_assert_eq!(orders[0].price, edge);
        for pair in orders.windows(2) {
            let step = pair[1].price - pair[0].price;
            match side {
                OrderSide::Buy => prop_assert_eq!(step, -pips),
                OrderSide::Sell => prop_assert_eq!(step, pips),
            }
        }
        prop_assert!(orders.iter().all(|o| o.side == side && o.quantity == dec!(1)));
    }

    /// Book counts match a simple model under any sequence of updates, and
    /// closed ids never come back.
    #[test]
    fn prop_book_counts_match_model(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let book = ActiveOrderBook::new("BTC-USD");
            let mut model: HashMap<u8, OrderSide> = HashMap::new();
            let mut closed: HashSet<u8> = HashSet::new();

            for op in ops {
                match op {
                    BookOp::Add(id, side) => {
                        book.add([order(id, side, OrderStatus::New)]).await;
                        if !closed.contains(&id) {
                            model.insert(id, side);
                        }
                    }
                    BookOp::Update(id, side) => {
                        let updated = book.update(order(id, side, OrderStatus::PartiallyFilled)).await;
                        assert_eq!(updated, model.contains_key(&id));
                        if updated {
                            model.insert(id, side);
                        }
                    }
                    BookOp::Fill(id) => {
                        book.write_off(&order(id, OrderSide::Buy, OrderStatus::Filled)).await;
                        model.remove(&id);
                        closed.insert(id);
                    }
                    BookOp::Cancel(id) => {
                        book.delete(&order(id, OrderSide::Sell, OrderStatus::Canceled)).await;
                        model.remove(&id);
                        closed.insert(id);
                    }
                }

                let bids = model.values().filter(|s| **s == OrderSide::Buy).count();
                let asks = model.len() - bids;
                assert_eq!(book.count_buy().await, bids);
                assert_eq!(book.count_sell().await, asks);
            }

            let snapshot = book.snapshot().await;
            let ids: HashSet<OrderId> = snapshot.iter().map(|o| o.id.clone()).collect();
            assert_eq!(ids.len(), snapshot.len());
            for id in &closed {
                assert!(!book.contains(&OrderId::new(format!("o-{id:02}"))).await);
            }
        });
    }
}
