//! Band signal sources for the grid.
//!
//! The grid only needs the latest lower and upper band; where they come from
//! is behind the `SignalSource` trait.

mod bollinger;

pub use bollinger::BollingerBands;

use rust_decimal::Decimal;

/// Latest lower and upper band values.
///
/// A value at or below zero means the band is not available yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BandSnapshot {
    pub lower: Decimal,
    pub upper: Decimal,
}

impl BandSnapshot {
    pub fn new(lower: Decimal, upper: Decimal) -> Self {
        Self { lower, upper }
    }

    /// Lower band if available. Buys ladder down from here.
    pub fn lower_edge(&self) -> Option<Decimal> {
        (self.lower > Decimal::ZERO).then_some(self.lower)
    }

    /// Upper band if available. Sells ladder up from here.
    pub fn upper_edge(&self) -> Option<Decimal> {
        (self.upper > Decimal::ZERO).then_some(self.upper)
    }
}

/// Source of the price band the grid is anchored to.
pub trait SignalSource: Send + Sync {
    /// Both bands read together so a caller never mixes two computations.
    fn bands(&self) -> BandSnapshot;
}

/// Constant bands, for paper runs and planning.
#[derive(Debug, Clone, Copy)]
pub struct FixedBands(pub BandSnapshot);

impl FixedBands {
    pub fn new(lower: Decimal, upper: Decimal) -> Self {
        Self(BandSnapshot::new(lower, upper))
    }
}

impl SignalSource for FixedBands {
    fn bands(&self) -> BandSnapshot {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_non_positive_band_is_unavailable() {
        let bands = BandSnapshot::new(dec!(0), dec!(-1));
        assert_eq!(bands.lower_edge(), None);
        assert_eq!(bands.upper_edge(), None);

        let bands = FixedBands::new(dec!(100), dec!(110)).bands();
        assert_eq!(bands.lower_edge(), Some(dec!(100)));
        assert_eq!(bands.upper_edge(), Some(dec!(110)));
    }
}
