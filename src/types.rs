// 1.0: all the primitives live here. nothing in the engine works without these types.
// IDs, prices, band indices, amplification, timestamps. each is a newtype so the
// compiler catches type mixups. all ids are opaque: the host ledger derives the real
// addresses, the core only needs stable identifiers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssuerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub u64);

// 1.1: signed band index. the external SDK addresses a band by a 16-bit little-endian
// index, so the core uses i16 as well. index increases toward LOWER price tiers:
// band i+1 sits directly below band i. negative indices are bands above the base price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BandIndex(pub i16);

impl BandIndex {
    /// The adjacent band one price tier below (next index up).
    pub fn below(&self) -> Option<BandIndex> {
        self.0.checked_add(1).map(BandIndex)
    }

    /// The adjacent band one price tier above (next index down).
    pub fn above(&self) -> Option<BandIndex> {
        self.0.checked_sub(1).map(BandIndex)
    }
}

impl fmt::Display for BandIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "band[{}]", self.0)
    }
}

// 1.2: the two asset roles a market deals in. debt is minted/burned under the issuer
// authority, collateral only ever moves between accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Debt,
    Collateral,
}

// 1.3: price of one collateral unit in debt terms. must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn new_unchecked(value: Decimal) -> Self {
        debug_assert!(value > Decimal::ZERO);
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn min(self, other: Price) -> Price {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    pub fn max(self, other: Price) -> Price {
        if self.0 >= other.0 {
            self
        } else {
            other
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.4: amplification A. fixes band geometry for the lifetime of a market:
// price_ratio = (A-1)/A, so higher A means narrower bands and finer liquidation
// granularity. A < 2 collapses the geometry and is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amplification(u32);

impl Amplification {
    pub const MIN: u32 = 2;

    #[must_use]
    pub fn new(value: u32) -> Option<Self> {
        if value >= Self::MIN {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// (A - 1) / A, the per-band price ratio in (0, 1).
    pub fn price_ratio(&self) -> Decimal {
        Decimal::from(self.0 - 1) / Decimal::from(self.0)
    }
}

impl fmt::Display for Amplification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A={}", self.0)
    }
}

// 1.5: second-resolution timestamp. oracle publication times and the engine clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp())
    }

    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }

    /// Seconds elapsed since `earlier`. Negative if `earlier` is in the future.
    pub fn secs_since(&self, earlier: Timestamp) -> i64 {
        self.0 - earlier.0
    }
}
