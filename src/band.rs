// 3.0 band.rs: one discretized price-range liquidity bucket and the share ledger
// over it. a band holds a collateral/debt pair that the walk converts as price
// moves through its range; depositors own proportional shares of the pooled value.
//
// every arithmetic path is checked: silent wraparound in share math is a
// fund-loss bug, so any overflow aborts the operation instead.

use crate::types::{AccountId, BandIndex, Price};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// 3.1: virtual-share offset. the mint formula prices shares as if the pool
// already held one virtual share against one virtual unit of value, which caps
// the multiplier a first depositor can extract by seeding a dust deposit.
pub const VIRTUAL_SHARES: Decimal = dec!(1);
pub const VIRTUAL_BALANCE: Decimal = dec!(1);

/// One depositor's claim on a band's pooled value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandDeposit {
    pub band: BandIndex,
    pub depositor: AccountId,
    pub shares: Decimal,
}

impl BandDeposit {
    fn new(band: BandIndex, depositor: AccountId) -> Self {
        Self {
            band,
            depositor,
            shares: Decimal::ZERO,
        }
    }
}

/// A price-range liquidity bucket. Created explicitly, persists forever even at
/// zero balance: deposits and borrow ranges may still address it by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub index: BandIndex,
    pub collateral: Decimal,
    pub debt: Decimal,
    pub total_shares: Decimal,
    /// Zero-share records are retained: bands are permanent, so are their slots.
    pub deposits: HashMap<AccountId, BandDeposit>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MintOutcome {
    pub shares_minted: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedeemOutcome {
    pub collateral_out: Decimal,
    pub debt_out: Decimal,
}

impl Band {
    pub fn new(index: BandIndex) -> Self {
        Self {
            index,
            collateral: Decimal::ZERO,
            debt: Decimal::ZERO,
            total_shares: Decimal::ZERO,
            deposits: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.collateral.is_zero() && self.debt.is_zero()
    }

    /// The walk has sold every collateral unit in this band.
    pub fn fully_converted(&self) -> bool {
        self.collateral.is_zero() && self.debt > Decimal::ZERO
    }

    /// Pooled value in collateral terms at `price` (debt converted back at the
    /// current exchange rate).
    pub fn pool_value(&self, price: Price) -> Option<Decimal> {
        let debt_as_collateral = self.debt.checked_div(price.value())?;
        self.collateral.checked_add(debt_as_collateral)
    }

    /// Pooled value in debt terms at `price`.
    pub fn value_in_debt(&self, price: Price) -> Option<Decimal> {
        self.collateral.checked_mul(price.value())?.checked_add(self.debt)
    }

    pub fn shares_of(&self, depositor: AccountId) -> Decimal {
        self.deposits
            .get(&depositor)
            .map(|d| d.shares)
            .unwrap_or(Decimal::ZERO)
    }

    /// Mint shares for a collateral contribution priced at the current oracle
    /// exchange rate. Bootstrap is ~1:1 through the virtual offset.
    pub fn deposit(
        &mut self,
        depositor: AccountId,
        amount: Decimal,
        price: Price,
    ) -> Result<MintOutcome, BandError> {
        if amount <= Decimal::ZERO {
            return Err(BandError::InvalidAmount(amount));
        }

        let pool_value = self.pool_value(price).ok_or(BandError::Overflow)?;
        let minted = amount
            .checked_mul(
                self.total_shares
                    .checked_add(VIRTUAL_SHARES)
                    .ok_or(BandError::Overflow)?,
            )
            .ok_or(BandError::Overflow)?
            .checked_div(
                pool_value
                    .checked_add(VIRTUAL_BALANCE)
                    .ok_or(BandError::Overflow)?,
            )
            .ok_or(BandError::Overflow)?;

        if minted <= Decimal::ZERO {
            return Err(BandError::InvalidAmount(amount));
        }

        self.collateral = self.collateral.checked_add(amount).ok_or(BandError::Overflow)?;
        self.total_shares = self
            .total_shares
            .checked_add(minted)
            .ok_or(BandError::Overflow)?;

        let entry = self
            .deposits
            .entry(depositor)
            .or_insert_with(|| BandDeposit::new(self.index, depositor));
        entry.shares = entry.shares.checked_add(minted).ok_or(BandError::Overflow)?;

        Ok(MintOutcome {
            shares_minted: minted,
        })
    }

    /// Redeem shares for a proportional slice of BOTH holdings: after the walk
    /// has partially converted a band, a withdrawal pays out the mixture.
    pub fn withdraw(
        &mut self,
        depositor: AccountId,
        shares: Decimal,
    ) -> Result<RedeemOutcome, BandError> {
        if shares <= Decimal::ZERO {
            return Err(BandError::InvalidAmount(shares));
        }

        let held = self.shares_of(depositor);
        if shares > held {
            return Err(BandError::InsufficientShares {
                requested: shares,
                held,
            });
        }

        let collateral_out = shares
            .checked_mul(self.collateral)
            .ok_or(BandError::Overflow)?
            .checked_div(self.total_shares)
            .ok_or(BandError::Overflow)?;
        let debt_out = shares
            .checked_mul(self.debt)
            .ok_or(BandError::Overflow)?
            .checked_div(self.total_shares)
            .ok_or(BandError::Overflow)?;

        self.collateral = self
            .collateral
            .checked_sub(collateral_out)
            .ok_or(BandError::Overflow)?;
        self.debt = self.debt.checked_sub(debt_out).ok_or(BandError::Overflow)?;
        self.total_shares = self
            .total_shares
            .checked_sub(shares)
            .ok_or(BandError::Overflow)?;

        let entry = self
            .deposits
            .get_mut(&depositor)
            .ok_or(BandError::InsufficientShares {
                requested: shares,
                held: Decimal::ZERO,
            })?;
        entry.shares = entry.shares.checked_sub(shares).ok_or(BandError::Overflow)?;

        Ok(RedeemOutcome {
            collateral_out,
            debt_out,
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BandError {
    #[error("amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    #[error("insufficient shares: requested {requested}, held {held}")]
    InsufficientShares { requested: Decimal, held: Decimal },

    #[error("{index} is liquidating: oracle price {price} is below its lower bound {lower}")]
    Liquidating {
        index: BandIndex,
        price: Price,
        lower: Price,
    },

    #[error("arithmetic overflow in share accounting")]
    Overflow,
}
