// 8.0: every state change produces an event. used for audit trails, state
// reconstruction, and notifying external systems. the EventPayload enum lists
// all event types. rejected operations are logged too: a failed deposit is an
// audit fact even though no state moved.

use crate::types::{AccountId, AssetId, BandIndex, IssuerId, MarketId, Price, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // lifecycle events
    IssuerInitialized(IssuerInitializedEvent),
    MarketCreated(MarketCreatedEvent),
    BandCreated(BandCreatedEvent),

    // liquidity events
    CollateralDeposited(CollateralDepositedEvent),
    CollateralWithdrawn(CollateralWithdrawnEvent),
    DepositRejected(DepositRejectedEvent),

    // price and conversion events
    PriceSynced(PriceSyncedEvent),
    BandConverted(BandConvertedEvent),

    // borrow events
    BorrowOpened(BorrowOpenedEvent),
    DebtRepaid(DebtRepaidEvent),
    PositionClosed(PositionClosedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerInitializedEvent {
    pub issuer_id: IssuerId,
    pub admin: AccountId,
    pub debt_asset: AssetId,
    pub authority: AccountId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketCreatedEvent {
    pub market_id: MarketId,
    pub issuer_id: IssuerId,
    pub collateral_asset: AssetId,
    pub amplification: u32,
    pub base_price: Price,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandCreatedEvent {
    pub market_id: MarketId,
    pub index: BandIndex,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralDepositedEvent {
    pub market_id: MarketId,
    pub index: BandIndex,
    pub depositor: AccountId,
    pub amount: Decimal,
    pub shares_minted: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralWithdrawnEvent {
    pub market_id: MarketId,
    pub index: BandIndex,
    pub depositor: AccountId,
    pub shares: Decimal,
    pub collateral_out: Decimal,
    pub debt_out: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRejectedEvent {
    pub market_id: MarketId,
    pub index: BandIndex,
    pub depositor: AccountId,
    pub amount: Decimal,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSyncedEvent {
    pub market_id: MarketId,
    pub from: Price,
    pub to: Price,
    pub bands_touched: u32,
    pub collateral_converted: Decimal,
    pub debt_converted: Decimal,
}

/// A band's collateral is gone: the walk finished selling through it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandConvertedEvent {
    pub market_id: MarketId,
    pub index: BandIndex,
    pub debt_held: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorrowOpenedEvent {
    pub market_id: MarketId,
    pub borrower: AccountId,
    pub collateral: Decimal,
    pub debt: Decimal,
    pub range_low: BandIndex,
    pub range_high: BandIndex,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtRepaidEvent {
    pub market_id: MarketId,
    pub borrower: AccountId,
    pub amount: Decimal,
    pub remaining: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionClosedEvent {
    pub market_id: MarketId,
    pub borrower: AccountId,
    pub collateral_returned: Decimal,
    pub debt_returned: Decimal,
}
