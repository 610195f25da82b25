//! Bollinger bands over closed kline prices.

use std::collections::VecDeque;
use std::sync::Mutex;

use rust_decimal::{Decimal, MathematicalOps};
use tracing::{debug, warn};

use super::{BandSnapshot, SignalSource};

#[derive(Debug)]
struct BollingerState {
    closes: VecDeque<Decimal>,
    bands: BandSnapshot,
}

/// Simple-moving-average Bollinger bands, `mean ± width · σ` over the last
/// `window` closes (population standard deviation).
///
/// Bands stay at zero (unavailable) until the window is full.
#[derive(Debug)]
pub struct BollingerBands {
    window: usize,
    width: Decimal,
    state: Mutex<BollingerState>,
}

impl BollingerBands {
    /// # Panics
    ///
    /// Panics if `window` is below 2.
    pub fn new(window: usize, width: Decimal) -> Self {
        assert!(window >= 2, "Bollinger window must be at least 2");
        Self {
            window,
            width,
            state: Mutex::new(BollingerState {
                closes: VecDeque::with_capacity(window + 1),
                bands: BandSnapshot::default(),
            }),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Feed historical closes, oldest first.
    pub fn warmup(&self, closes: &[Decimal]) {
        for close in closes {
            self.update(*close);
        }
    }

    /// Push a closed kline price and recompute the bands.
    pub fn update(&self, close: Decimal) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.closes.push_back(close);
        if state.closes.len() > self.window {
            state.closes.pop_front();
        }
        if state.closes.len() < self.window {
            return;
        }

        let n = Decimal::from(self.window as u64);
        let mean = state.closes.iter().sum::<Decimal>() / n;
        let variance = state
            .closes
            .iter()
            .map(|c| (*c - mean) * (*c - mean))
            .sum::<Decimal>()
            / n;
        let Some(std_dev) = variance.sqrt() else {
            warn!(variance = %variance, "Cannot take square root of variance; bands unchanged");
            return;
        };

        state.bands = BandSnapshot::new(mean - self.width * std_dev, mean + self.width * std_dev);
        debug!(
            lower = %state.bands.lower,
            upper = %state.bands.upper,
            mean = %mean,
            "Bollinger bands updated"
        );
    }
}

impl SignalSource for BollingerBands {
    fn bands(&self) -> BandSnapshot {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).bands
    }
}
