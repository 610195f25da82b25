pub mod cli;
pub mod commands;
pub mod exchange;
pub mod grid;
pub mod indicator;
pub mod market_data;
pub mod metrics;
pub mod orders;
pub mod types;
