//! Borrow position operations: open, repay, health.

use super::core::Engine;
use super::results::{BorrowResult, EngineError, RepayResult};
use crate::band::BandError;
use crate::borrow::{max_borrowable, BorrowPosition, PositionHealth};
use crate::events::{BorrowOpenedEvent, DebtRepaidEvent, EventPayload, PositionClosedEvent};
use crate::ledger::TokenLedger;
use crate::market::MarketError;
use crate::types::{AccountId, BandIndex, MarketId};
use rust_decimal::Decimal;

impl Engine {
    /// Open a borrow: spread collateral evenly across a contiguous band range
    /// and draw debt against its worst-case value. Every band in the range
    /// must already exist; nothing is created implicitly.
    pub fn open_borrow(
        &mut self,
        market_id: MarketId,
        borrower: AccountId,
        collateral_amount: Decimal,
        range_low: BandIndex,
        range_high: BandIndex,
        debt_amount: Decimal,
    ) -> Result<BorrowResult, EngineError> {
        if collateral_amount <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(collateral_amount));
        }
        if debt_amount <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(debt_amount));
        }
        if range_low > range_high {
            return Err(EngineError::InvalidRange {
                low: range_low,
                high: range_high,
            });
        }
        if self.positions.contains_key(&(market_id, borrower)) {
            return Err(EngineError::PositionExists(borrower, market_id));
        }

        self.sync_market(market_id)?;
        let (authority, collateral_asset, debt_asset) = self.market_accounts(market_id)?;

        // validate the whole range before touching anything
        let limit = {
            let market = self
                .markets
                .get(&market_id)
                .ok_or(EngineError::MarketNotFound(market_id))?;
            for index in (range_low.0..=range_high.0).map(BandIndex) {
                if !market.has_band(index) {
                    return Err(MarketError::BandNotFound(index).into());
                }
                let bounds = market.bounds_of(index)?;
                if market.sync_price < bounds.lo {
                    return Err(MarketError::Band(BandError::Liquidating {
                        index,
                        price: market.sync_price,
                        lower: bounds.lo,
                    })
                    .into());
                }
            }

            // health bound at the worst-case price: the deepest band's floor
            let worst_case = market.bounds_of(range_high)?.lo;
            max_borrowable(collateral_amount, worst_case, &market.config.borrow_params)
                .ok_or(MarketError::Overflow)?
        };
        if debt_amount > limit {
            return Err(EngineError::InsufficientCollateral {
                requested: debt_amount,
                limit,
            });
        }

        self.ledger
            .ensure_funds(borrower, collateral_asset, collateral_amount)?;

        let band_count = i64::from(range_high.0) - i64::from(range_low.0) + 1;
        let per_band = collateral_amount
            .checked_div(Decimal::from(band_count))
            .ok_or(MarketError::Overflow)?;

        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        let mut placed = Decimal::ZERO;
        for (k, index) in (range_low.0..=range_high.0).map(BandIndex).enumerate() {
            // last band takes the rounding remainder so the spread sums exactly
            let amount = if k as i64 == band_count - 1 {
                collateral_amount - placed
            } else {
                per_band
            };
            market.deposit(borrower, index, amount)?;
            placed += amount;
        }

        self.ledger
            .transfer(borrower, authority, collateral_asset, collateral_amount)?;
        self.ledger.mint(borrower, debt_asset, debt_amount)?;

        let position = BorrowPosition {
            market: market_id,
            borrower,
            collateral_deposited: collateral_amount,
            debt_borrowed: debt_amount,
            range_low,
            range_high,
            opened_at: self.current_time,
        };
        self.positions.insert((market_id, borrower), position);

        self.emit_event(EventPayload::BorrowOpened(BorrowOpenedEvent {
            market_id,
            borrower,
            collateral: collateral_amount,
            debt: debt_amount,
            range_low,
            range_high,
        }));

        Ok(BorrowResult {
            borrow_limit: limit,
            collateral_per_band: per_band,
        })
    }

    /// Repay outstanding debt. Once debt reaches zero the position closes and
    /// the borrower's share of the range - whatever mixture the walk has left
    /// in it - is released back.
    pub fn repay(
        &mut self,
        market_id: MarketId,
        borrower: AccountId,
        amount: Decimal,
    ) -> Result<RepayResult, EngineError> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(amount));
        }

        self.sync_market(market_id)?;
        let (authority, collateral_asset, debt_asset) = self.market_accounts(market_id)?;

        let debt_borrowed = self
            .positions
            .get(&(market_id, borrower))
            .ok_or(EngineError::PositionNotFound(borrower, market_id))?
            .debt_borrowed;
        if amount > debt_borrowed {
            return Err(EngineError::RepayExceedsDebt {
                amount,
                debt: debt_borrowed,
            });
        }

        self.ledger.ensure_funds(borrower, debt_asset, amount)?;
        self.ledger.burn(borrower, debt_asset, amount)?;

        let remaining = debt_borrowed - amount;
        if let Some(position) = self.positions.get_mut(&(market_id, borrower)) {
            position.debt_borrowed = remaining;
        }

        self.emit_event(EventPayload::DebtRepaid(DebtRepaidEvent {
            market_id,
            borrower,
            amount,
            remaining,
        }));

        if remaining > Decimal::ZERO {
            return Ok(RepayResult {
                remaining_debt: remaining,
                closed: false,
                collateral_returned: Decimal::ZERO,
                debt_returned: Decimal::ZERO,
            });
        }

        // debt cleared: release the borrower's slice of every band in range
        let position = self
            .positions
            .get(&(market_id, borrower))
            .ok_or(EngineError::PositionNotFound(borrower, market_id))?
            .clone();

        let mut collateral_returned = Decimal::ZERO;
        let mut debt_returned = Decimal::ZERO;
        {
            let market = self
                .markets
                .get_mut(&market_id)
                .ok_or(EngineError::MarketNotFound(market_id))?;
            for index in position.band_range() {
                let shares = market.band(index)?.shares_of(borrower);
                if shares > Decimal::ZERO {
                    let out = market.withdraw(borrower, index, shares)?;
                    collateral_returned += out.collateral_out;
                    debt_returned += out.debt_out;
                }
            }
        }

        if collateral_returned > Decimal::ZERO {
            self.ledger
                .transfer(authority, borrower, collateral_asset, collateral_returned)?;
        }
        if debt_returned > Decimal::ZERO {
            self.ledger
                .transfer(authority, borrower, debt_asset, debt_returned)?;
        }

        self.positions.remove(&(market_id, borrower));

        self.emit_event(EventPayload::PositionClosed(PositionClosedEvent {
            market_id,
            borrower,
            collateral_returned,
            debt_returned,
        }));

        Ok(RepayResult {
            remaining_debt: Decimal::ZERO,
            closed: true,
            collateral_returned,
            debt_returned,
        })
    }

    /// Health of a position at the latest oracle price. Replays the walk
    /// first, so the answer reflects the present.
    pub fn position_health(
        &mut self,
        market_id: MarketId,
        borrower: AccountId,
    ) -> Result<PositionHealth, EngineError> {
        self.sync_market(market_id)?;

        let position = self
            .positions
            .get(&(market_id, borrower))
            .ok_or(EngineError::PositionNotFound(borrower, market_id))?
            .clone();
        let market = self
            .markets
            .get(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        let price = market.sync_price;

        let mut bands_converted = 0u32;
        let mut collateral_value = Decimal::ZERO;
        let mut debt_recovered = Decimal::ZERO;
        for index in position.band_range() {
            let band = market.band(index)?;
            if band.fully_converted() {
                bands_converted += 1;
            }
            if band.total_shares > Decimal::ZERO {
                let fraction = band.shares_of(borrower) / band.total_shares;
                let value = band
                    .value_in_debt(price)
                    .ok_or(MarketError::Overflow)?;
                collateral_value += fraction * value;
                debt_recovered += fraction * band.debt;
            }
        }

        let bands_total = position.band_count();
        if bands_converted == bands_total {
            return Ok(PositionHealth::FullyConverted {
                debt_recovered,
                debt: position.debt_borrowed,
            });
        }

        let range_top = market.bounds_of(position.range_low)?.hi;
        if bands_converted > 0 || price < range_top {
            return Ok(PositionHealth::SoftLiquidating {
                bands_converted,
                bands_total,
                collateral_value,
                debt: position.debt_borrowed,
            });
        }

        Ok(PositionHealth::Healthy {
            collateral_value,
            debt: position.debt_borrowed,
        })
    }
}
