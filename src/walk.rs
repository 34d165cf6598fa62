//! Soft-liquidation conversion steps.
//!
//! While the oracle price sits inside a band's range, the band's holdings move
//! along a single curve: the collateral fraction is affine in log(price), i.e.
//! conversion density is constant per unit of log-price. Walking DOWN sells
//! collateral into debt slice by slice, each slice executing at the
//! instantaneous price, so a finite move clears at the logarithmic mean of its
//! endpoints and never at a price outside the band. Walking UP mirrors the
//! process on the debt leg. Closed forms for a move from `p0` to `p1`:
//!
//!   down:  sold   = c * ln(p0/p1) / ln(p0/lo)
//!          gained = c * (p0 - p1) / ln(p0/lo)
//!   up:    spent  = d * (p1 - p0) / (hi - p0)
//!          gained = d * ln(p1/p0) / (hi - p0)
//!
//! For holdings produced by the walk itself (a band entered at its boundary,
//! the cascade's normal case) the state stays exactly on the curve, so a price
//! round trip restores the original pair. The step functions are pure; the
//! market layer owns clamping, cascading, and reserve bookkeeping.

use crate::types::Price;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

/// Conversion knobs, fixed at market creation. The fee is charged on the
/// output side of every conversion and accrues to the market admin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkParams {
    /// Fraction of conversion output withheld as an admin fee.
    pub fee_rate: Decimal,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            fee_rate: Decimal::ZERO,
        }
    }
}

impl WalkParams {
    pub fn with_fee(fee_rate: Decimal) -> Option<Self> {
        if fee_rate >= Decimal::ZERO && fee_rate < Decimal::ONE {
            Some(Self { fee_rate })
        } else {
            None
        }
    }
}

/// Result of one conversion step applied to a single band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Band collateral after the step.
    pub collateral: Decimal,
    /// Band debt after the step.
    pub debt: Decimal,
    /// Collateral sold (down) or bought back (up) by this step.
    pub collateral_converted: Decimal,
    /// Debt gained net of fee (down) or spent (up) by this step.
    pub debt_converted: Decimal,
    /// Fee withheld from the output side.
    pub fee_accrued: Decimal,
}

impl StepOutcome {
    fn unchanged(collateral: Decimal, debt: Decimal) -> Self {
        Self {
            collateral,
            debt,
            collateral_converted: Decimal::ZERO,
            debt_converted: Decimal::ZERO,
            fee_accrued: Decimal::ZERO,
        }
    }
}

/// Logarithmic mean of two prices: the effective execution rate of a finite
/// conversion. Always strictly between the two for distinct inputs.
pub fn log_mean(a: Price, b: Price) -> Option<Decimal> {
    if a == b {
        return Some(a.value());
    }
    let diff = a.value().checked_sub(b.value())?;
    let ratio_ln = a.value().checked_div(b.value())?.checked_ln()?;
    diff.checked_div(ratio_ln)
}

/// Sell collateral into debt as price falls from `p_from` to `p_to`, both
/// clamped by the caller into the band's range; `lo` is the band's lower bound.
/// None signals arithmetic overflow, which the caller must surface as an error.
pub fn step_down(
    collateral: Decimal,
    debt: Decimal,
    p_from: Price,
    p_to: Price,
    lo: Price,
    params: &WalkParams,
) -> Option<StepOutcome> {
    if collateral <= Decimal::ZERO || p_to >= p_from || p_from <= lo {
        return Some(StepOutcome::unchanged(collateral, debt));
    }

    let span = p_from.value().checked_div(lo.value())?.checked_ln()?;
    let sold = if p_to <= lo {
        collateral
    } else {
        let travelled = p_from.value().checked_div(p_to.value())?.checked_ln()?;
        collateral.checked_mul(travelled)?.checked_div(span)?
    };

    let clamped_to = p_to.max(lo);
    let gross = collateral
        .checked_mul(p_from.value().checked_sub(clamped_to.value())?)?
        .checked_div(span)?;
    let fee = gross.checked_mul(params.fee_rate)?;
    let gained = gross.checked_sub(fee)?;

    Some(StepOutcome {
        collateral: collateral.checked_sub(sold)?,
        debt: debt.checked_add(gained)?,
        collateral_converted: sold,
        debt_converted: gained,
        fee_accrued: fee,
    })
}

/// Buy collateral back with debt as price rises from `p_from` to `p_to`; `hi`
/// is the band's upper bound.
pub fn step_up(
    collateral: Decimal,
    debt: Decimal,
    p_from: Price,
    p_to: Price,
    hi: Price,
    params: &WalkParams,
) -> Option<StepOutcome> {
    if debt <= Decimal::ZERO || p_to <= p_from || p_from >= hi {
        return Some(StepOutcome::unchanged(collateral, debt));
    }

    let span = hi.value().checked_sub(p_from.value())?;
    let spent = if p_to >= hi {
        debt
    } else {
        debt.checked_mul(p_to.value().checked_sub(p_from.value())?)?
            .checked_div(span)?
    };

    let clamped_to = p_to.min(hi);
    let travelled = clamped_to
        .value()
        .checked_div(p_from.value())?
        .checked_ln()?;
    let gross = debt.checked_mul(travelled)?.checked_div(span)?;
    let fee = gross.checked_mul(params.fee_rate)?;
    let gained = gross.checked_sub(fee)?;

    Some(StepOutcome {
        collateral: collateral.checked_add(gained)?,
        debt: debt.checked_sub(spent)?,
        collateral_converted: gained,
        debt_converted: spent,
        fee_accrued: fee,
    })
}
