// 7.0.2: result types and errors for engine operations.

use crate::ledger::LedgerError;
use crate::market::MarketError;
use crate::oracle::OracleError;
use crate::types::{AccountId, AssetId, BandIndex, IssuerId, MarketId};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct DepositResult {
    pub shares_minted: Decimal,
    pub band_collateral: Decimal,
    pub band_total_shares: Decimal,
}

#[derive(Debug, Clone)]
pub struct WithdrawResult {
    pub collateral_out: Decimal,
    pub debt_out: Decimal,
}

#[derive(Debug, Clone)]
pub struct BorrowResult {
    /// Worst-case health bound the request was checked against.
    pub borrow_limit: Decimal,
    /// Collateral placed into each band of the range.
    pub collateral_per_band: Decimal,
}

#[derive(Debug, Clone)]
pub struct RepayResult {
    pub remaining_debt: Decimal,
    pub closed: bool,
    pub collateral_returned: Decimal,
    pub debt_returned: Decimal,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("issuer already exists for debt asset {0:?}")]
    IssuerExists(AssetId),

    #[error("issuer {0:?} not found")]
    IssuerNotFound(IssuerId),

    #[error("market already exists for issuer {0:?} and collateral {1:?}")]
    MarketExists(IssuerId, AssetId),

    #[error("market {0:?} not found")]
    MarketNotFound(MarketId),

    #[error("caller {0:?} is not the issuer admin")]
    Unauthorized(AccountId),

    #[error("amplification must be at least 2, got {0}")]
    InvalidAmplification(u32),

    #[error("invalid band range: low {low} is below high {high}")]
    InvalidRange { low: BandIndex, high: BandIndex },

    #[error("amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    #[error("position already open for borrower {0:?} in market {1:?}")]
    PositionExists(AccountId, MarketId),

    #[error("no position for borrower {0:?} in market {1:?}")]
    PositionNotFound(AccountId, MarketId),

    #[error("insufficient collateral: requested debt {requested} exceeds limit {limit}")]
    InsufficientCollateral { requested: Decimal, limit: Decimal },

    #[error("repayment {amount} exceeds outstanding debt {debt}")]
    RepayExceedsDebt { amount: Decimal, debt: Decimal },

    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("market error: {0}")]
    Market(#[from] MarketError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
