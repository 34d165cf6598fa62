//! Band creation and liquidity operations.

use super::core::Engine;
use super::results::{DepositResult, EngineError, WithdrawResult};
use crate::events::{
    BandCreatedEvent, CollateralDepositedEvent, CollateralWithdrawnEvent, DepositRejectedEvent,
    EventPayload,
};
use crate::ledger::TokenLedger;
use crate::types::{AccountId, BandIndex, MarketId};
use rust_decimal::Decimal;

impl Engine {
    /// Explicitly create a band by index. Anyone may create one; it persists
    /// forever afterwards.
    pub fn create_band(
        &mut self,
        market_id: MarketId,
        index: BandIndex,
    ) -> Result<(), EngineError> {
        let now = self.current_time;
        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        market.create_band(index)?;
        market.last_updated = now;

        self.emit_event(EventPayload::BandCreated(BandCreatedEvent {
            market_id,
            index,
        }));
        Ok(())
    }

    /// Deposit collateral into a band, minting proportional shares. Replays
    /// the walk first so the mint prices the band's current mixture.
    pub fn deposit_collateral(
        &mut self,
        market_id: MarketId,
        depositor: AccountId,
        index: BandIndex,
        amount: Decimal,
    ) -> Result<DepositResult, EngineError> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(amount));
        }

        self.sync_market(market_id)?;
        let (authority, collateral_asset, _) = self.market_accounts(market_id)?;
        self.ledger.ensure_funds(depositor, collateral_asset, amount)?;

        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        let outcome = match market.deposit(depositor, index, amount) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.emit_event(EventPayload::DepositRejected(DepositRejectedEvent {
                    market_id,
                    index,
                    depositor,
                    amount,
                    reason: e.to_string(),
                }));
                return Err(e.into());
            }
        };
        let band = market.band(index)?;
        let (band_collateral, band_total_shares) = (band.collateral, band.total_shares);

        self.ledger
            .transfer(depositor, authority, collateral_asset, amount)?;

        self.emit_event(EventPayload::CollateralDeposited(CollateralDepositedEvent {
            market_id,
            index,
            depositor,
            amount,
            shares_minted: outcome.shares_minted,
        }));

        Ok(DepositResult {
            shares_minted: outcome.shares_minted,
            band_collateral,
            band_total_shares,
        })
    }

    /// Redeem shares for the band's current collateral/debt mixture and return
    /// both components to the depositor.
    pub fn withdraw(
        &mut self,
        market_id: MarketId,
        depositor: AccountId,
        index: BandIndex,
        shares: Decimal,
    ) -> Result<WithdrawResult, EngineError> {
        self.sync_market(market_id)?;
        let (authority, collateral_asset, debt_asset) = self.market_accounts(market_id)?;

        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        let outcome = market.withdraw(depositor, index, shares)?;

        if outcome.collateral_out > Decimal::ZERO {
            self.ledger
                .transfer(authority, depositor, collateral_asset, outcome.collateral_out)?;
        }
        if outcome.debt_out > Decimal::ZERO {
            self.ledger
                .transfer(authority, depositor, debt_asset, outcome.debt_out)?;
        }

        self.emit_event(EventPayload::CollateralWithdrawn(CollateralWithdrawnEvent {
            market_id,
            index,
            depositor,
            shares,
            collateral_out: outcome.collateral_out,
            debt_out: outcome.debt_out,
        }));

        Ok(WithdrawResult {
            collateral_out: outcome.collateral_out,
            debt_out: outcome.debt_out,
        })
    }
}
