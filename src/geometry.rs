// 2.0 geometry.rs: band price geometry. pure functions of (base_price, A, index),
// reproducible anywhere without touching band state.
//
// hi(i) = base * ratio^i, lo(i) = base * ratio^(i+1) with ratio = (A-1)/A, so
// hi(i+1) == lo(i) exactly and the bands tile the price axis without gaps.
// index increases toward lower prices: walking down through liquidation depth
// means walking up through indices. this ordering is load-bearing and tested.
//
// containment convention: the walk maps a price exactly on a shared boundary to
// the band below it, i.e. a band covers (lo, hi]. deposits use the looser
// `price >= lo` guard.

use crate::types::{Amplification, BandIndex, Price};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::MathematicalOps;

/// Price bounds of one band. `lo < hi` always.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandBounds {
    pub hi: Price,
    pub lo: Price,
}

impl BandBounds {
    /// Walk containment: (lo, hi].
    pub fn contains(&self, price: Price) -> bool {
        price > self.lo && price <= self.hi
    }
}

/// Upper price bound of band `index`. None on arithmetic overflow.
pub fn band_hi(base_price: Price, amp: Amplification, index: BandIndex) -> Option<Price> {
    let factor = amp.price_ratio().checked_powi(index.0 as i64)?;
    Price::new(base_price.value().checked_mul(factor)?)
}

/// Lower price bound of band `index`, identical to `band_hi` of the band below.
pub fn band_lo(base_price: Price, amp: Amplification, index: BandIndex) -> Option<Price> {
    let factor = amp.price_ratio().checked_powi(index.0 as i64 + 1)?;
    Price::new(base_price.value().checked_mul(factor)?)
}

pub fn band_bounds(base_price: Price, amp: Amplification, index: BandIndex) -> Option<BandBounds> {
    Some(BandBounds {
        hi: band_hi(base_price, amp, index)?,
        lo: band_lo(base_price, amp, index)?,
    })
}

/// The band whose (lo, hi] range contains `price`.
///
/// Estimated as floor(log_ratio(price / base)) and then repaired against the
/// exact bounds, since the logarithm is only approximate at band boundaries.
/// None if the index falls outside i16 or the bounds overflow.
pub fn band_for_price(base_price: Price, amp: Amplification, price: Price) -> Option<BandIndex> {
    let ratio_ln = amp.price_ratio().checked_ln()?;
    let rel = price.value().checked_div(base_price.value())?;
    let estimate = (rel.checked_ln()? / ratio_ln).floor().to_i64()?;

    let mut index = i64::max(i64::from(i16::MIN), i64::min(i64::from(i16::MAX), estimate));
    // repair the estimate against exact bounds
    loop {
        let band = BandIndex(i16::try_from(index).ok()?);
        let bounds = band_bounds(base_price, amp, band)?;
        if price <= bounds.lo {
            index += 1;
        } else if price > bounds.hi {
            index -= 1;
        } else {
            return Some(band);
        }
    }
}
