//! Borrow positions and health.
//!
//! A position spreads collateral across a contiguous band range and draws debt
//! against it. The range is a weak reference: many positions may overlap the
//! same bands, so a position only remembers its index span and resolves bands
//! through the market. Soft liquidation needs no discrete event: the walk
//! converts the range's collateral band by band as price falls through it, and
//! a fully-converted range IS the completed liquidation.

use crate::types::{AccountId, BandIndex, MarketId, Price, Timestamp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Borrow limits, fixed at market creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorrowParams {
    /// Fraction of worst-case collateral value that may be drawn as debt.
    pub max_ltv: Decimal,
}

impl Default for BorrowParams {
    fn default() -> Self {
        Self {
            max_ltv: dec!(0.9),
        }
    }
}

/// One borrower's debt against a band range. One position per
/// (market, borrower).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowPosition {
    pub market: MarketId,
    pub borrower: AccountId,
    pub collateral_deposited: Decimal,
    pub debt_borrowed: Decimal,
    /// Inclusive band span; `range_high` is the deepest (lowest-price) band.
    pub range_low: BandIndex,
    pub range_high: BandIndex,
    pub opened_at: Timestamp,
}

impl BorrowPosition {
    pub fn band_count(&self) -> u32 {
        (self.range_high.0 as i32 - self.range_low.0 as i32 + 1) as u32
    }

    pub fn contains(&self, index: BandIndex) -> bool {
        index >= self.range_low && index <= self.range_high
    }

    pub fn band_range(&self) -> impl Iterator<Item = BandIndex> {
        (self.range_low.0..=self.range_high.0).map(BandIndex)
    }
}

/// Maximum debt drawable against `collateral` valued at the worst-case price,
/// the lower bound of the deepest band in the range. None on overflow.
pub fn max_borrowable(
    collateral: Decimal,
    worst_case_price: Price,
    params: &BorrowParams,
) -> Option<Decimal> {
    collateral
        .checked_mul(worst_case_price.value())?
        .checked_mul(params.max_ltv)
}

/// Point-in-time health of a position after a sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PositionHealth {
    /// Price sits above the range; no conversion has touched it.
    Healthy {
        collateral_value: Decimal,
        debt: Decimal,
    },
    /// The walk is converting inside the range.
    SoftLiquidating {
        bands_converted: u32,
        bands_total: u32,
        collateral_value: Decimal,
        debt: Decimal,
    },
    /// Every band in the range now holds debt: the soft liquidation completed
    /// without a discrete liquidation transaction or penalty.
    FullyConverted {
        debt_recovered: Decimal,
        debt: Decimal,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(low: i16, high: i16) -> BorrowPosition {
        BorrowPosition {
            market: MarketId(1),
            borrower: AccountId(7),
            collateral_deposited: dec!(4000),
            debt_borrowed: dec!(1000),
            range_low: BandIndex(low),
            range_high: BandIndex(high),
            opened_at: Timestamp::from_secs(0),
        }
    }

    #[test]
    fn band_count_and_membership() {
        let pos = position(0, 3);
        assert_eq!(pos.band_count(), 4);
        assert!(pos.contains(BandIndex(0)));
        assert!(pos.contains(BandIndex(3)));
        assert!(!pos.contains(BandIndex(4)));
        assert!(!pos.contains(BandIndex(-1)));

        let collected: Vec<_> = pos.band_range().collect();
        assert_eq!(
            collected,
            vec![BandIndex(0), BandIndex(1), BandIndex(2), BandIndex(3)]
        );
    }

    #[test]
    fn single_band_range() {
        let pos = position(2, 2);
        assert_eq!(pos.band_count(), 1);
        assert_eq!(pos.band_range().collect::<Vec<_>>(), vec![BandIndex(2)]);
    }

    #[test]
    fn negative_range_spans_zero() {
        let pos = position(-2, 1);
        assert_eq!(pos.band_count(), 4);
        assert!(pos.contains(BandIndex(-2)));
        assert!(pos.contains(BandIndex(0)));
    }

    #[test]
    fn max_borrowable_applies_ltv() {
        let params = BorrowParams::default();
        let limit =
            max_borrowable(dec!(4000), Price::new_unchecked(dec!(96.059601)), &params).unwrap();
        // 4000 * 96.059601 * 0.9
        assert_eq!(limit, dec!(345814.56360));
    }
}
