// cushion-core: band-based collateralized lending engine.
// accounting-first architecture: share math and the soft-liquidation band walk
// take priority. all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: ids, BandIndex, Price, Amplification, Timestamp
//   2.x  geometry.rs: band price bounds as pure functions of (base, A, index)
//   3.x  band.rs: band state + share accounting with virtual-share offset
//   4.x  issuer.rs: issuer authority scope, one per debt asset
//   5.x  market.rs: market config/state, reserves, lazy walk watermark
//   6.x  walk.rs: soft-liquidation conversion steps along the band curve
//   6.5  borrow.rs: borrow positions, worst-case health bound, position health
//   7.x  engine/: core engine: issuers, liquidity, pricing, borrows
//   8.x  events.rs: state transition events for audit
//   9.x  oracle.rs: oracle boundary (mocked feed adapter)
//   9.2  ledger.rs: token movement seam (mocked)

// core accounting modules
pub mod band;
pub mod borrow;
pub mod engine;
pub mod events;
pub mod geometry;
pub mod issuer;
pub mod market;
pub mod types;
pub mod walk;

// integration modules
pub mod ledger;
pub mod oracle;

// re exports for convenience
pub use band::*;
pub use borrow::*;
pub use engine::*;
pub use events::*;
pub use geometry::*;
pub use issuer::*;
pub use market::*;
pub use types::*;
pub use walk::*;
pub use ledger::{Asset, LedgerError, MockLedger, TokenLedger};
pub use oracle::{MockOracle, OracleConfig, OracleError, OracleFeed, OracleReading};
