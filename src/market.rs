//! Market configuration and state.
//!
//! A market pairs one issuer's debt asset with one collateral asset. It owns
//! the amplification parameter that fixes band geometry, the band set itself,
//! and the aggregate reserve counters. It also owns the lazy band walk: a
//! single watermark price records how far conversions have been replayed, so a
//! price delta is applied exactly once no matter how many operations observe it.

use crate::band::{Band, BandError, MintOutcome, RedeemOutcome};
use crate::borrow::BorrowParams;
use crate::geometry::{self, BandBounds};
use crate::oracle::{OracleConfig, OracleReading};
use crate::types::{
    AccountId, Amplification, AssetId, BandIndex, IssuerId, MarketId, Price, Timestamp,
};
use crate::walk::{self, WalkParams};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Static market configuration (immutable after creation). Amplification can
/// never change: mutating it would silently re-derive every band's price
/// bounds, so there is no setter and no migration path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    pub id: MarketId,
    pub issuer: IssuerId,
    pub collateral_asset: AssetId,
    pub amplification: Amplification,
    pub oracle: OracleConfig,
    pub borrow_params: BorrowParams,
    pub walk_params: WalkParams,
}

/// What one lazy replay did: which direction, how many bands it touched, and
/// how much moved between the two reserve sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkReport {
    pub from: Price,
    pub to: Price,
    pub bands_touched: u32,
    pub collateral_converted: Decimal,
    pub debt_converted: Decimal,
    /// Admin fees withheld from conversion output, in output-side units.
    pub fees_accrued: Decimal,
    /// Bands that reached full conversion during this replay.
    pub newly_converted: Vec<BandIndex>,
}

impl WalkReport {
    fn empty(from: Price, to: Price) -> Self {
        Self {
            from,
            to,
            bands_touched: 0,
            collateral_converted: Decimal::ZERO,
            debt_converted: Decimal::ZERO,
            fees_accrued: Decimal::ZERO,
            newly_converted: Vec::new(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.bands_touched == 0
    }
}

/// Dynamic market state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketState {
    pub config: MarketConfig,
    /// Oracle snapshot at creation; anchors band index 0.
    pub base_price: Price,
    pub bands: BTreeMap<BandIndex, Band>,
    /// Sum of band collateral, maintained in lockstep with every band mutation.
    pub collateral_reserve: Decimal,
    /// Sum of band debt, same discipline.
    pub debt_reserve: Decimal,
    /// Conversion fees withheld for the issuer admin, per output side.
    pub admin_fees_collateral: Decimal,
    pub admin_fees_debt: Decimal,
    /// Watermark: conversions are replayed up to here and never twice.
    pub sync_price: Price,
    pub latest_reading: Option<OracleReading>,
    pub last_updated: Timestamp,
}

impl MarketState {
    pub fn new(config: MarketConfig, base_price: Price, timestamp: Timestamp) -> Self {
        Self {
            config,
            base_price,
            bands: BTreeMap::new(),
            collateral_reserve: Decimal::ZERO,
            debt_reserve: Decimal::ZERO,
            admin_fees_collateral: Decimal::ZERO,
            admin_fees_debt: Decimal::ZERO,
            sync_price: base_price,
            latest_reading: None,
            last_updated: timestamp,
        }
    }

    /// Price bounds of `index`, derived fresh from (base_price, A, index).
    pub fn bounds_of(&self, index: BandIndex) -> Result<BandBounds, MarketError> {
        geometry::band_bounds(self.base_price, self.config.amplification, index)
            .ok_or(MarketError::BoundsOverflow(index))
    }

    pub fn band(&self, index: BandIndex) -> Result<&Band, MarketError> {
        self.bands
            .get(&index)
            .ok_or(MarketError::BandNotFound(index))
    }

    pub fn has_band(&self, index: BandIndex) -> bool {
        self.bands.contains_key(&index)
    }

    /// Explicit band creation. Never happens implicitly; duplicate creation
    /// fails so the host can treat creation as an idempotency fence.
    pub fn create_band(&mut self, index: BandIndex) -> Result<(), MarketError> {
        // reject indices whose bounds cannot be represented at all
        self.bounds_of(index)?;

        if self.bands.contains_key(&index) {
            return Err(MarketError::BandExists(index));
        }
        self.bands.insert(index, Band::new(index));
        Ok(())
    }

    /// Deposit collateral into a band at the current watermark price. The
    /// caller must have replayed the walk first so the price is current.
    pub fn deposit(
        &mut self,
        depositor: AccountId,
        index: BandIndex,
        amount: Decimal,
    ) -> Result<MintOutcome, MarketError> {
        let bounds = self.bounds_of(index)?;
        let price = self.sync_price;

        // the band is mid-liquidation once price has fallen below it entirely;
        // topping it up would hand the new collateral straight to the walk
        if price < bounds.lo {
            return Err(MarketError::Band(BandError::Liquidating {
                index,
                price,
                lower: bounds.lo,
            }));
        }

        let band = self
            .bands
            .get_mut(&index)
            .ok_or(MarketError::BandNotFound(index))?;
        let outcome = band.deposit(depositor, amount, price)?;

        self.collateral_reserve = self
            .collateral_reserve
            .checked_add(amount)
            .ok_or(MarketError::Overflow)?;

        Ok(outcome)
    }

    /// Redeem shares for the band's current collateral/debt mixture.
    pub fn withdraw(
        &mut self,
        depositor: AccountId,
        index: BandIndex,
        shares: Decimal,
    ) -> Result<RedeemOutcome, MarketError> {
        let band = self
            .bands
            .get_mut(&index)
            .ok_or(MarketError::BandNotFound(index))?;
        let outcome = band.withdraw(depositor, shares)?;

        self.collateral_reserve = self
            .collateral_reserve
            .checked_sub(outcome.collateral_out)
            .ok_or(MarketError::Overflow)?;
        self.debt_reserve = self
            .debt_reserve
            .checked_sub(outcome.debt_out)
            .ok_or(MarketError::Overflow)?;

        Ok(outcome)
    }

    /// Replay the band walk from the watermark to `target`, cascading across
    /// every created band whose range the move crosses. Bands outside the move
    /// and bands that were never created are untouched.
    pub fn sync_to_price(&mut self, target: Price) -> Result<WalkReport, MarketError> {
        let from = self.sync_price;
        let mut report = WalkReport::empty(from, target);
        if from == target {
            return Ok(report);
        }

        let base = self.base_price;
        let amp = self.config.amplification;
        let params = self.config.walk_params;

        let first = geometry::band_for_price(base, amp, from)
            .ok_or(MarketError::PriceOutOfRange(from))?;
        let last = geometry::band_for_price(base, amp, target)
            .ok_or(MarketError::PriceOutOfRange(target))?;

        if target < from {
            // falling price: ascending indices, descending price tiers
            let touched: Vec<BandIndex> = self.bands.range(first..=last).map(|(i, _)| *i).collect();
            for index in touched {
                let bounds = geometry::band_bounds(base, amp, index)
                    .ok_or(MarketError::BoundsOverflow(index))?;
                let seg_from = from.min(bounds.hi);
                let seg_to = target.max(bounds.lo);
                if seg_to >= seg_from {
                    continue;
                }

                let band = match self.bands.get_mut(&index) {
                    Some(band) => band,
                    None => continue,
                };
                let was_converted = band.fully_converted();
                let out = walk::step_down(
                    band.collateral,
                    band.debt,
                    seg_from,
                    seg_to,
                    bounds.lo,
                    &params,
                )
                .ok_or(MarketError::Overflow)?;
                if out.collateral_converted.is_zero() {
                    continue;
                }

                band.collateral = out.collateral;
                band.debt = out.debt;
                let now_converted = band.fully_converted();

                self.collateral_reserve = self
                    .collateral_reserve
                    .checked_sub(out.collateral_converted)
                    .ok_or(MarketError::Overflow)?;
                self.debt_reserve = self
                    .debt_reserve
                    .checked_add(out.debt_converted)
                    .ok_or(MarketError::Overflow)?;
                self.admin_fees_debt = self
                    .admin_fees_debt
                    .checked_add(out.fee_accrued)
                    .ok_or(MarketError::Overflow)?;

                report.bands_touched += 1;
                report.collateral_converted = report
                    .collateral_converted
                    .checked_add(out.collateral_converted)
                    .ok_or(MarketError::Overflow)?;
                report.debt_converted = report
                    .debt_converted
                    .checked_add(out.debt_converted)
                    .ok_or(MarketError::Overflow)?;
                report.fees_accrued = report
                    .fees_accrued
                    .checked_add(out.fee_accrued)
                    .ok_or(MarketError::Overflow)?;
                if !was_converted && now_converted {
                    report.newly_converted.push(index);
                }
            }
        } else {
            // rising price: highest index (deepest band) recovers first
            let touched: Vec<BandIndex> = self.bands.range(last..=first).map(|(i, _)| *i).collect();
            for index in touched.into_iter().rev() {
                let bounds = geometry::band_bounds(base, amp, index)
                    .ok_or(MarketError::BoundsOverflow(index))?;
                let seg_from = from.max(bounds.lo);
                let seg_to = target.min(bounds.hi);
                if seg_to <= seg_from {
                    continue;
                }

                let band = match self.bands.get_mut(&index) {
                    Some(band) => band,
                    None => continue,
                };
                let out = walk::step_up(
                    band.collateral,
                    band.debt,
                    seg_from,
                    seg_to,
                    bounds.hi,
                    &params,
                )
                .ok_or(MarketError::Overflow)?;
                if out.debt_converted.is_zero() {
                    continue;
                }

                band.collateral = out.collateral;
                band.debt = out.debt;

                self.collateral_reserve = self
                    .collateral_reserve
                    .checked_add(out.collateral_converted)
                    .ok_or(MarketError::Overflow)?;
                self.debt_reserve = self
                    .debt_reserve
                    .checked_sub(out.debt_converted)
                    .ok_or(MarketError::Overflow)?;
                self.admin_fees_collateral = self
                    .admin_fees_collateral
                    .checked_add(out.fee_accrued)
                    .ok_or(MarketError::Overflow)?;

                report.bands_touched += 1;
                report.collateral_converted = report
                    .collateral_converted
                    .checked_add(out.collateral_converted)
                    .ok_or(MarketError::Overflow)?;
                report.debt_converted = report
                    .debt_converted
                    .checked_add(out.debt_converted)
                    .ok_or(MarketError::Overflow)?;
                report.fees_accrued = report
                    .fees_accrued
                    .checked_add(out.fee_accrued)
                    .ok_or(MarketError::Overflow)?;
            }
        }

        self.sync_price = target;
        Ok(report)
    }

    /// Ground-truth reserve recomputation from the per-band sums. The running
    /// counters must always match; any drift is a bug, never tolerated state.
    pub fn recompute_reserves(&self) -> (Decimal, Decimal) {
        let collateral = self.bands.values().map(|b| b.collateral).sum();
        let debt = self.bands.values().map(|b| b.debt).sum();
        (collateral, debt)
    }

    pub fn reserves_consistent(&self) -> bool {
        let (collateral, debt) = self.recompute_reserves();
        collateral == self.collateral_reserve && debt == self.debt_reserve
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarketError {
    #[error("{0} already exists")]
    BandExists(BandIndex),

    #[error("{0} not found")]
    BandNotFound(BandIndex),

    #[error("price bounds of {0} overflow the representable range")]
    BoundsOverflow(BandIndex),

    #[error("price {0} is outside the representable band range")]
    PriceOutOfRange(Price),

    #[error("arithmetic overflow updating market reserves")]
    Overflow,

    #[error(transparent)]
    Band(#[from] BandError),
}
