// Oracle boundary.
//
// The engine never fetches prices itself: readings are pushed in by the host and
// every price-dependent operation re-validates freshness synchronously. A stale
// reading fails the call; nothing ever waits for a better price. The OracleFeed
// trait is the adapter seam for whatever network (Pyth-style feeds with a
// confidence interval, or anything else) the host wires up.

use crate::types::{Price, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single oracle observation: price, publication time, and the publisher's
/// confidence interval around the price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OracleReading {
    pub price: Price,
    pub published_at: Timestamp,
    pub confidence: Decimal,
}

impl OracleReading {
    pub fn new(price: Price, published_at: Timestamp) -> Self {
        Self {
            price,
            published_at,
            confidence: Decimal::ZERO,
        }
    }

    pub fn with_confidence(mut self, confidence: Decimal) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn is_stale(&self, now: Timestamp, max_staleness_secs: u64) -> bool {
        now.secs_since(self.published_at) > max_staleness_secs as i64
    }

    /// Freshness precondition. Stale readings abort the whole operation.
    pub fn ensure_fresh(&self, now: Timestamp, config: &OracleConfig) -> Result<(), OracleError> {
        let age = now.secs_since(self.published_at);
        if age > config.max_staleness_secs as i64 {
            return Err(OracleError::Stale {
                age_secs: age,
                max_secs: config.max_staleness_secs,
            });
        }
        Ok(())
    }
}

/// Per-market oracle acceptance policy, fixed at market creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Maximum age in seconds before a reading is rejected.
    pub max_staleness_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            max_staleness_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("oracle reading is {age_secs}s old, max staleness is {max_secs}s")]
    Stale { age_secs: i64, max_secs: u64 },

    #[error("no oracle reading available")]
    NoReading,
}

/// Trait for oracle adapters. Implement this to integrate a real feed.
pub trait OracleFeed {
    /// Human readable name of the feed.
    fn name(&self) -> &str;

    /// Latest reading, if the feed is reachable.
    fn read(&self) -> Option<OracleReading>;

    fn is_healthy(&self) -> bool;
}

/// Mock feed for tests and simulation.
pub struct MockOracle {
    name: String,
    price: Price,
    published_at: Timestamp,
    confidence: Decimal,
    healthy: bool,
}

impl MockOracle {
    pub fn new(name: &str, price: Price, published_at: Timestamp) -> Self {
        Self {
            name: name.to_string(),
            price,
            published_at,
            confidence: Decimal::ZERO,
            healthy: true,
        }
    }

    pub fn set_price(&mut self, price: Price, published_at: Timestamp) {
        self.price = price;
        self.published_at = published_at;
    }

    pub fn set_confidence(&mut self, confidence: Decimal) {
        self.confidence = confidence;
    }

    pub fn set_healthy(&mut self, healthy: bool) {
        self.healthy = healthy;
    }
}

impl OracleFeed for MockOracle {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Option<OracleReading> {
        if self.healthy {
            Some(OracleReading::new(self.price, self.published_at).with_confidence(self.confidence))
        } else {
            None
        }
    }

    fn is_healthy(&self) -> bool {
        self.healthy
    }
}
