// 7.1 engine/core.rs: main engine struct. holds all issuers, markets, borrow
// positions, the mock ledger, and the audit event log.

use super::config::EngineConfig;
use super::results::EngineError;
use crate::borrow::BorrowPosition;
use crate::events::{Event, EventId, EventPayload};
use crate::issuer::Issuer;
use crate::ledger::{Asset, MockLedger};
use crate::market::MarketState;
use crate::types::{AccountId, AssetId, IssuerId, MarketId, Timestamp};
use std::collections::HashMap;

#[derive(Debug)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) issuers: HashMap<IssuerId, Issuer>,
    pub(super) issuers_by_asset: HashMap<AssetId, IssuerId>,
    pub(super) markets: HashMap<MarketId, MarketState>,
    pub(super) market_lookup: HashMap<(IssuerId, AssetId), MarketId>,
    pub(super) positions: HashMap<(MarketId, AccountId), BorrowPosition>,
    pub(super) ledger: MockLedger,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) next_issuer_id: u32,
    pub(super) next_market_id: u32,
    pub(super) next_account_id: u64,
    pub(super) current_time: Timestamp,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            issuers: HashMap::new(),
            issuers_by_asset: HashMap::new(),
            markets: HashMap::new(),
            market_lookup: HashMap::new(),
            positions: HashMap::new(),
            ledger: MockLedger::new(),
            events: Vec::new(),
            next_event_id: 1,
            next_issuer_id: 1,
            next_market_id: 1,
            next_account_id: 1,
            current_time: Timestamp::from_secs(0),
        }
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn advance_time(&mut self, secs: i64) {
        self.current_time = Timestamp::from_secs(self.current_time.as_secs() + secs);
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    /// Hand out a fresh opaque account id. The host ledger owns real address
    /// derivation; inside the engine an id only needs to be unique.
    pub fn allocate_account(&mut self) -> AccountId {
        let id = AccountId(self.next_account_id);
        self.next_account_id += 1;
        id
    }

    pub fn get_issuer(&self, issuer_id: IssuerId) -> Option<&Issuer> {
        self.issuers.get(&issuer_id)
    }

    pub fn issuer_for_asset(&self, debt_asset: AssetId) -> Option<&Issuer> {
        self.issuers_by_asset
            .get(&debt_asset)
            .and_then(|id| self.issuers.get(id))
    }

    pub fn get_market(&self, market_id: MarketId) -> Option<&MarketState> {
        self.markets.get(&market_id)
    }

    pub fn find_market(&self, issuer_id: IssuerId, collateral_asset: AssetId) -> Option<MarketId> {
        self.market_lookup
            .get(&(issuer_id, collateral_asset))
            .copied()
    }

    pub fn get_position(&self, market_id: MarketId, borrower: AccountId) -> Option<&BorrowPosition> {
        self.positions.get(&(market_id, borrower))
    }

    pub fn ledger(&self) -> &MockLedger {
        &self.ledger
    }

    /// Test and simulation hook for funding accounts.
    pub fn ledger_mut(&mut self) -> &mut MockLedger {
        &mut self.ledger
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    /// The authority account and the two asset handles a market moves value in.
    pub(super) fn market_accounts(
        &self,
        market_id: MarketId,
    ) -> Result<(AccountId, Asset, Asset), EngineError> {
        let market = self
            .markets
            .get(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        let issuer = self
            .issuers
            .get(&market.config.issuer)
            .ok_or(EngineError::IssuerNotFound(market.config.issuer))?;
        Ok((
            issuer.authority,
            Asset::Collateral(market.config.collateral_asset),
            Asset::Debt(issuer.debt_asset),
        ))
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        if self.config.verbose {
            println!("[Event {}] {:?}", event.id.0, event.payload);
        }

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}
