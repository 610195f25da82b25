//! Grid order management.
//!
//! - `config`: run parameters loaded from JSON
//! - `planner`: pure ladder computation
//! - `strategy`: replenishment loop and order-update reconciliation

pub mod config;
pub mod planner;
pub mod strategy;

pub use config::{ConfigError, GridConfig, DEFAULT_GRID_NUMBER};
pub use planner::LadderPlanner;
pub use strategy::{GridError, GridHandles, GridStrategy, ReplenishReport, SideOutcome, SkipReason};
