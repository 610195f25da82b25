//! Plan command handler.
//!
//! Prints the ladder the planner would submit for the given bands and book
//! state, without touching an exchange.

use crate::cli::PlanCliConfig;
use crate::grid::{GridConfig, LadderPlanner};
use crate::types::OrderSide;

/// Print planned bids and asks.
///
/// # Errors
/// Returns error if the config file cannot be loaded.
pub fn run_plan(plan: PlanCliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let config = GridConfig::from_file(&plan.config_path)?;
    let planner = LadderPlanner::from_config(&config);

    println!("\n--- Grid Plan: {} ---", config.symbol);
    println!(
        "Target: {} per side, step {}, quantity {}",
        planner.target(),
        config.grid_pips,
        config.base_quantity
    );

    for (side, resting, edge) in [
        (OrderSide::Buy, plan.bids, plan.lower),
        (OrderSide::Sell, plan.asks, plan.upper),
    ] {
        let orders = planner.plan(side, resting, edge);
        println!("\n{} ({} resting, band {}):", side, resting, edge);
        if orders.is_empty() {
            println!("  nothing to submit");
        }
        for order in &orders {
            println!("  {} {} @ {}", order.side, order.quantity, order.price);
        }
    }
    println!("------------------------");

    Ok(())
}
