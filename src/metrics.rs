//! Prometheus Metrics Module
//!
//! Pre-registered metrics for the grid engine. Dropped batches and book
//! removals are counted here so operators can see them without log scraping.

use lazy_static::lazy_static;
use prometheus::{
    opts, register_int_counter_vec, register_int_gauge_vec, Encoder, IntCounterVec, IntGaugeVec,
    TextEncoder,
};

lazy_static! {
    // --- Order Metrics ---

    /// Orders accepted by the gateway (by symbol, side)
    pub static ref ORDERS_SUBMITTED: IntCounterVec = register_int_counter_vec!(
        opts!("gridpioneer_orders_submitted_total", "Orders accepted by the exchange gateway"),
        &["symbol", "side"]
    ).expect("FATAL: Failed to register ORDERS_SUBMITTED metric - check for duplicate registration");

    /// Batches abandoned after a submission failure
    pub static ref BATCHES_DROPPED: IntCounterVec = register_int_counter_vec!(
        opts!("gridpioneer_batches_dropped_total", "Order batches abandoned after a gateway error"),
        &["symbol", "side"]
    ).expect("FATAL: Failed to register BATCHES_DROPPED metric - check for duplicate registration");

    /// Sides skipped during a replenishment tick
    pub static ref SIDES_SKIPPED: IntCounterVec = register_int_counter_vec!(
        opts!("gridpioneer_sides_skipped_total", "Grid sides skipped during a tick"),
        &["symbol", "side", "reason"]
    ).expect("FATAL: Failed to register SIDES_SKIPPED metric - check for duplicate registration");

    // --- Book Metrics ---

    /// Orders removed from the active book (reason = filled, canceled, rejected, deleted)
    pub static ref BOOK_REMOVALS: IntCounterVec = register_int_counter_vec!(
        opts!("gridpioneer_book_removals_total", "Orders removed from the active order book"),
        &["symbol", "side", "reason"]
    ).expect("FATAL: Failed to register BOOK_REMOVALS metric - check for duplicate registration");

    /// Orders currently believed resting
    pub static ref RESTING_ORDERS: IntGaugeVec = register_int_gauge_vec!(
        opts!("gridpioneer_resting_orders", "Orders currently tracked as resting"),
        &["symbol", "side"]
    ).expect("FATAL: Failed to register RESTING_ORDERS metric - check for duplicate registration");
}

pub fn record_submitted(symbol: &str, side: &str, count: usize) {
    ORDERS_SUBMITTED
        .with_label_values(&[symbol, side])
        .inc_by(count as u64);
}

pub fn record_dropped_batch(symbol: &str, side: &str) {
    BATCHES_DROPPED.with_label_values(&[symbol, side]).inc();
}

pub fn record_skipped_side(symbol: &str, side: &str, reason: &str) {
    SIDES_SKIPPED.with_label_values(&[symbol, side, reason]).inc();
}

pub fn record_book_removal(symbol: &str, side: &str, reason: &str) {
    BOOK_REMOVALS.with_label_values(&[symbol, side, reason]).inc();
}

pub fn set_resting_orders(symbol: &str, side: &str, count: usize) {
    RESTING_ORDERS
        .with_label_values(&[symbol, side])
        .set(count as i64);
}

/// Get metrics in the Prometheus text format.
///
/// Encoding errors are logged and yield an empty string.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode Prometheus metrics: {}", e);
        return String::new();
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Prometheus metrics buffer is not valid UTF-8: {}", e);
            String::new()
        }
    }
}
