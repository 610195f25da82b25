//! Grid command handler.
//!
//! Runs the grid strategy against the paper exchange fed by a synthetic
//! trade stream, until Ctrl-C.

use crate::cli::PaperRunConfig;
use crate::exchange::{Balance, ExchangeSession, PaperExchange};
use crate::grid::{GridConfig, GridStrategy};
use crate::indicator::BollingerBands;
use crate::market_data::{KLineBuilder, MarketDataProvider, SyntheticProvider};
use crate::metrics;

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Time given to the fire-and-forget shutdown cancel before the process exits.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Run the grid strategy in paper mode.
///
/// # Errors
/// Returns error if the config cannot be loaded or a task panics.
pub async fn run_grid(run: PaperRunConfig) -> Result<(), Box<dyn std::error::Error>> {
    let config = GridConfig::from_file(&run.config_path)?;
    let market = config.market()?;

    let (exchange, order_updates) = PaperExchange::new(
        market.clone(),
        [
            Balance::new(market.quote_currency.clone(), run.quote_balance),
            Balance::new(market.base_currency.clone(), run.base_balance),
        ],
    );
    let exchange = Arc::new(exchange);
    let mut session = ExchangeSession::new("paper", order_updates);

    let bands = Arc::new(BollingerBands::new(
        config.bollinger_window,
        config.bollinger_band_width,
    ));
    let strategy = Arc::new(GridStrategy::new(config.clone(), bands.clone())?);
    strategy.subscribe(&mut session);

    let kline_period = run.kline_period.unwrap_or_else(|| config.interval.duration());
    info!(
        symbol = %market.symbol,
        kline_secs = kline_period.as_secs(),
        window = bands.window(),
        "Bands become available once the Bollinger window fills"
    );

    let provider = SyntheticProvider::new(
        run.initial_price,
        run.volatility,
        run.tick_interval.as_millis() as u64,
    );
    let symbols = session
        .subscriptions()
        .iter()
        .map(|s| s.symbol.clone())
        .collect();
    let mut ticks = provider
        .subscribe(symbols)
        .await
        .map_err(|e| e as Box<dyn std::error::Error>)?;

    let shutdown = CancellationToken::new();

    // Trades drive both the paper fills and the kline closes
    let feed = {
        let exchange = exchange.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let mut klines = KLineBuilder::with_period(kline_period);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    tick = ticks.recv() => {
                        let Some(tick) = tick else { break };
                        let fills = exchange.on_trade(tick.price).await;
                        if !fills.is_empty() {
                            info!(price = %tick.price, fills = fills.len(), "Paper orders filled");
                        }
                        if let Some(close) = klines.on_tick(&tick) {
                            bands.update(close);
                        }
                    }
                }
            }
        })
    };

    let handles = Arc::clone(&strategy).run(shutdown.clone(), exchange.clone(), &mut session)?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping grid");
    shutdown.cancel();

    handles.replenisher.await?;
    handles.reconciler.await?;
    feed.await?;
    tokio::time::sleep(SHUTDOWN_GRACE).await;

    debug!("Final metrics:\n{}", metrics::gather_metrics());
    info!(
        open_orders = exchange.open_orders().await.len(),
        "Grid stopped"
    );

    Ok(())
}
