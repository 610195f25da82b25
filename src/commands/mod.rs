//! CLI command handlers.
//!
//! This module contains the implementation for each CLI subcommand.

mod grid;
mod plan;

pub use grid::run_grid;
pub use plan::run_plan;
