use async_trait::async_trait;
use chrono::Utc;
use gridpioneer::exchange::{Balance, ExchangeError, ExchangeGateway, ExchangeSession};
use gridpioneer::grid::{GridConfig, GridStrategy, SideOutcome, SkipReason};
use gridpioneer::indicator::FixedBands;
use gridpioneer::orders::{Order, OrderId, SubmitOrder};
use gridpioneer::types::OrderSide;
use mockall::mock;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// --- Mocks ---

// The mock takes owned batches so expectations can inspect them without
// borrowing across the async_trait boundary; the trait impl below delegates.

mock! {
    pub GatewayImpl {
        fn submit(&self, orders: Vec<SubmitOrder>) -> Result<Vec<Order>, ExchangeError>;
        fn cancel(&self, orders: Vec<Order>) -> Result<(), ExchangeError>;
        fn balances(&self) -> Result<HashMap<String, Balance>, ExchangeError>;
    }
}

#[async_trait]
impl ExchangeGateway for MockGatewayImpl {
    async fn submit_orders(&self, orders: &[SubmitOrder]) -> Result<Vec<Order>, ExchangeError> {
        self.submit(orders.to_vec())
    }

    async fn cancel_orders(&self, orders: &[Order]) -> Result<(), ExchangeError> {
        self.cancel(orders.to_vec())
    }

    async fn account_balances(&self) -> Result<HashMap<String, Balance>, ExchangeError> {
        self.balances()
    }
}

fn funded() -> HashMap<String, Balance> {
    [
        ("USD".to_string(), Balance::new("USD", dec!(10000))),
        ("BTC".to_string(), Balance::new("BTC", dec!(10))),
    ]
    .into_iter()
    .collect()
}

/// Accept every order in the batch with sequential ids.
fn accept_all(counter: &AtomicUsize, orders: &[SubmitOrder]) -> Vec<Order> {
    orders
        .iter()
        .map(|o| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Order::accepted(OrderId::new(format!("ord-{n}")), o, Utc::now())
        })
        .collect()
}

fn grid() -> GridStrategy {
    let config = GridConfig::new("BTC-USD", dec!(1), 3, dec!(0.1));
    GridStrategy::new(config, Arc::new(FixedBands::new(dec!(100), dec!(110)))).unwrap()
}

// --- Tests ---

#[tokio::test]
async fn test_failed_buy_batch_does_not_block_sells() {
    let mut gateway = MockGatewayImpl::new();
    gateway.expect_balances().returning(|| Ok(funded()));

    let bids_down = Arc::new(AtomicBool::new(true));
    let ids = Arc::new(AtomicUsize::new(0));
    {
        let bids_down = bids_down.clone();
        gateway.expect_submit().returning(move |orders| {
            if orders[0].side == OrderSide::Buy && bids_down.load(Ordering::SeqCst) {
                return Err(ExchangeError::Network("connection reset".to_string()));
            }
            Ok(accept_all(&ids, &orders))
        });
    }

    let strategy = grid();
    let report = strategy.replenish(&gateway).await;
    assert_eq!(report.buy, SideOutcome::Failed);
    assert_eq!(report.sell, SideOutcome::Submitted(3));
    assert_eq!(strategy.book().count_buy().await, 0);

    // Nothing is retried within the tick; the next one recomputes the deficit
    bids_down.store(false, Ordering::SeqCst);
    let report = strategy.replenish(&gateway).await;
    assert_eq!(report.buy, SideOutcome::Submitted(3));
    assert_eq!(report.sell, SideOutcome::Skipped(SkipReason::TargetMet));
}

#[tokio::test]
async fn test_balance_query_failure_skips_both_sides() {
    let mut gateway = MockGatewayImpl::new();
    gateway
        .expect_balances()
        .times(1)
        .returning(|| Err(ExchangeError::Api("rate limited".to_string())));
    gateway.expect_submit().times(0);

    let strategy = grid();
    let report = strategy.replenish(&gateway).await;
    assert_eq!(report.buy, SideOutcome::Skipped(SkipReason::BalanceUnavailable));
    assert_eq!(report.sell, SideOutcome::Skipped(SkipReason::BalanceUnavailable));
}

#[tokio::test]
async fn test_missing_base_currency_skips_asks() {
    let mut gateway = MockGatewayImpl::new();
    gateway.expect_balances().returning(|| {
        let mut balances = funded();
        balances.remove("BTC");
        Ok(balances)
    });
    let ids = AtomicUsize::new(0);
    gateway
        .expect_submit()
        .withf(|orders: &Vec<SubmitOrder>| orders.iter().all(|o| o.side == OrderSide::Buy))
        .times(1)
        .returning(move |orders| Ok(accept_all(&ids, &orders)));

    let report = grid().replenish(&gateway).await;
    assert_eq!(report.buy, SideOutcome::Submitted(3));
    assert_eq!(report.sell, SideOutcome::Skipped(SkipReason::BalanceUnavailable));
}

#[tokio::test]
async fn test_shutdown_cancels_every_tracked_order() {
    let mut gateway = MockGatewayImpl::new();
    gateway.expect_balances().returning(|| Ok(funded()));
    let ids = AtomicUsize::new(0);
    gateway
        .expect_submit()
        .times(2)
        .returning(move |orders| Ok(accept_all(&ids, &orders)));
    gateway
        .expect_cancel()
        .withf(|orders: &Vec<Order>| orders.len() == 6)
        .times(1)
        // Failure is only logged
        .returning(|_| Err(ExchangeError::Network("timeout".to_string())));
    let gateway = Arc::new(gateway);

    let strategy = Arc::new(grid());
    let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let mut session = ExchangeSession::new("mock", rx);
    let shutdown = CancellationToken::new();
    let handles = Arc::clone(&strategy)
        .run(shutdown.clone(), gateway.clone(), &mut session)
        .unwrap();

    for _ in 0..100 {
        if strategy.book().count_sell().await == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(strategy.book().count_buy().await, 3);

    shutdown.cancel();
    handles.replenisher.await.unwrap();
    handles.reconciler.await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Expectations are verified when the last reference drops
    drop(strategy);
    let gateway = Arc::try_unwrap(gateway).ok().unwrap();
    drop(gateway);
}
