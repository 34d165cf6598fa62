//! Issuer and market lifecycle operations.

use super::core::Engine;
use super::results::EngineError;
use crate::borrow::BorrowParams;
use crate::events::{EventPayload, IssuerInitializedEvent, MarketCreatedEvent};
use crate::issuer::Issuer;
use crate::market::{MarketConfig, MarketState};
use crate::oracle::{OracleConfig, OracleReading};
use crate::types::{AccountId, Amplification, AssetId, IssuerId, MarketId};
use crate::walk::WalkParams;

/// Everything a new market needs beyond its asset pair. Amplification is
/// validated at creation and immutable afterwards.
#[derive(Debug, Clone)]
pub struct MarketParams {
    pub amplification: u32,
    pub oracle: OracleConfig,
    pub borrow: BorrowParams,
    pub walk: WalkParams,
}

impl MarketParams {
    pub fn new(amplification: u32) -> Self {
        Self {
            amplification,
            oracle: OracleConfig::default(),
            borrow: BorrowParams::default(),
            walk: WalkParams::default(),
        }
    }
}

impl Engine {
    /// Create the issuer record and its authority scope for a debt asset.
    pub fn initialize_issuer(
        &mut self,
        admin: AccountId,
        debt_asset: AssetId,
    ) -> Result<IssuerId, EngineError> {
        if self.issuers_by_asset.contains_key(&debt_asset) {
            return Err(EngineError::IssuerExists(debt_asset));
        }

        let authority = self.allocate_account();
        let issuer_id = IssuerId(self.next_issuer_id);
        self.next_issuer_id += 1;

        self.issuers
            .insert(issuer_id, Issuer::new(issuer_id, admin, debt_asset, authority));
        self.issuers_by_asset.insert(debt_asset, issuer_id);

        self.emit_event(EventPayload::IssuerInitialized(IssuerInitializedEvent {
            issuer_id,
            admin,
            debt_asset,
            authority,
        }));

        Ok(issuer_id)
    }

    /// Authorize and create a market under an issuer. Admin-gated; snapshots
    /// the oracle price as the base price anchoring band index 0.
    pub fn create_market(
        &mut self,
        caller: AccountId,
        issuer_id: IssuerId,
        collateral_asset: AssetId,
        params: MarketParams,
        reading: OracleReading,
    ) -> Result<MarketId, EngineError> {
        let issuer = self
            .issuers
            .get(&issuer_id)
            .ok_or(EngineError::IssuerNotFound(issuer_id))?;
        if !issuer.is_admin(caller) {
            return Err(EngineError::Unauthorized(caller));
        }

        if self
            .market_lookup
            .contains_key(&(issuer_id, collateral_asset))
        {
            return Err(EngineError::MarketExists(issuer_id, collateral_asset));
        }

        let amplification = Amplification::new(params.amplification)
            .ok_or(EngineError::InvalidAmplification(params.amplification))?;

        reading.ensure_fresh(self.current_time, &params.oracle)?;

        let market_id = MarketId(self.next_market_id);
        self.next_market_id += 1;

        let config = MarketConfig {
            id: market_id,
            issuer: issuer_id,
            collateral_asset,
            amplification,
            oracle: params.oracle,
            borrow_params: params.borrow,
            walk_params: params.walk,
        };
        let base_price = reading.price;
        let mut market = MarketState::new(config, base_price, self.current_time);
        market.latest_reading = Some(reading);

        self.markets.insert(market_id, market);
        self.market_lookup
            .insert((issuer_id, collateral_asset), market_id);

        self.emit_event(EventPayload::MarketCreated(MarketCreatedEvent {
            market_id,
            issuer_id,
            collateral_asset,
            amplification: amplification.value(),
            base_price,
        }));

        Ok(market_id)
    }
}
