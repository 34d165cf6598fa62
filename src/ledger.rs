// 9.0 ledger.rs: MOCKED token movement. just balance changes, no real transfers.
//
// the real system debits and credits asset accounts through the host ledger's
// transfer primitive; the core only ever asks for exact amounts and never
// partial fills. TokenLedger is the seam a host implements; MockLedger backs
// tests and the simulation.

use crate::types::{AccountId, AssetId, AssetKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// the two-case asset tag: same arithmetic everywhere, different transfer hooks.
// debt is minted/burned under the issuer authority, collateral only moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    Debt(AssetId),
    Collateral(AssetId),
}

impl Asset {
    pub fn id(&self) -> AssetId {
        match self {
            Asset::Debt(id) | Asset::Collateral(id) => *id,
        }
    }

    pub fn kind(&self) -> AssetKind {
        match self {
            Asset::Debt(_) => AssetKind::Debt,
            Asset::Collateral(_) => AssetKind::Collateral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient balance: account {account:?} holds {available} of {asset:?}, needs {requested}")]
    InsufficientBalance {
        account: AccountId,
        asset: Asset,
        requested: Decimal,
        available: Decimal,
    },

    #[error("transfer amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    #[error("arithmetic overflow in balance accounting")]
    Overflow,
}

/// Exact-amount balance movement. A host ledger implements this over real
/// token accounts; every call either fully applies or fully fails.
pub trait TokenLedger {
    fn balance_of(&self, account: AccountId, asset: Asset) -> Decimal;

    fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        asset: Asset,
        amount: Decimal,
    ) -> Result<(), LedgerError>;

    /// Create new units. Only the issuer authority path calls this, and only
    /// for debt assets.
    fn mint(&mut self, to: AccountId, asset: Asset, amount: Decimal) -> Result<(), LedgerError>;

    fn burn(&mut self, from: AccountId, asset: Asset, amount: Decimal) -> Result<(), LedgerError>;
}

/// In-memory ledger for tests and simulation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockLedger {
    balances: HashMap<(AccountId, Asset), Decimal>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: credit an account out of thin air.
    pub fn fund(&mut self, account: AccountId, asset: Asset, amount: Decimal) {
        *self.balances.entry((account, asset)).or_default() += amount;
    }

    /// Precondition check so callers can validate before mutating anything.
    pub fn ensure_funds(
        &self,
        account: AccountId,
        asset: Asset,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        let available = self.balance_of(account, asset);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account,
                asset,
                requested: amount,
                available,
            });
        }
        Ok(())
    }

    fn debit(
        &mut self,
        account: AccountId,
        asset: Asset,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        self.ensure_funds(account, asset, amount)?;
        let balance = self.balances.entry((account, asset)).or_default();
        *balance = balance.checked_sub(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    fn credit(
        &mut self,
        account: AccountId,
        asset: Asset,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        let balance = self.balances.entry((account, asset)).or_default();
        *balance = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }
}

impl TokenLedger for MockLedger {
    fn balance_of(&self, account: AccountId, asset: Asset) -> Decimal {
        self.balances
            .get(&(account, asset))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        asset: Asset,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        self.debit(from, asset, amount)?;
        self.credit(to, asset, amount)
    }

    fn mint(&mut self, to: AccountId, asset: Asset, amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        self.credit(to, asset, amount)
    }

    fn burn(&mut self, from: AccountId, asset: Asset, amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        self.debit(from, asset, amount)
    }
}
