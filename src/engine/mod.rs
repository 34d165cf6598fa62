// 7.0: core engine. coordinates issuers, markets, the lazy band-walk replay,
// liquidity operations, and borrow positions. deterministic and event-driven
// with no external I/O: oracle readings are pushed in, token movement goes
// through the ledger seam.

mod borrows;
mod config;
mod core;
mod issuers;
mod liquidity;
mod pricing;
mod results;

pub use config::EngineConfig;
pub use core::Engine;
pub use issuers::MarketParams;
pub use results::{BorrowResult, DepositResult, EngineError, RepayResult, WithdrawResult};
