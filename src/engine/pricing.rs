//! Oracle submission and the lazy walk replay.
//!
//! There is no background process. A fresh reading can be pushed at any time,
//! and every band-touching operation first replays the walk from the market's
//! watermark to the latest observed price, so stored state is brought to the
//! present exactly once per price delta.

use super::core::Engine;
use super::results::EngineError;
use crate::events::{BandConvertedEvent, EventPayload, PriceSyncedEvent};
use crate::ledger::TokenLedger;
use crate::market::WalkReport;
use crate::oracle::{OracleError, OracleReading};
use crate::types::MarketId;
use rust_decimal::Decimal;

impl Engine {
    /// Push a new oracle reading and replay the walk up to its price.
    pub fn submit_oracle_price(
        &mut self,
        market_id: MarketId,
        reading: OracleReading,
    ) -> Result<WalkReport, EngineError> {
        let now = self.current_time;
        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;

        reading.ensure_fresh(now, &market.config.oracle)?;
        market.latest_reading = Some(reading);
        market.last_updated = now;

        let report = market.sync_to_price(reading.price)?;
        self.apply_walk_to_ledger(market_id, &report)?;
        self.emit_walk_events(market_id, &report);
        Ok(report)
    }

    /// Bring a market's bands to the present before acting on them. Checks the
    /// stored reading's freshness at call time: an operation arriving after the
    /// trust window closed fails rather than acting on a stale price.
    pub(super) fn sync_market(&mut self, market_id: MarketId) -> Result<WalkReport, EngineError> {
        let now = self.current_time;
        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;

        let reading = market
            .latest_reading
            .ok_or(EngineError::Oracle(OracleError::NoReading))?;
        reading.ensure_fresh(now, &market.config.oracle)?;

        let report = market.sync_to_price(reading.price)?;
        self.apply_walk_to_ledger(market_id, &report)?;
        self.emit_walk_events(market_id, &report);
        Ok(report)
    }

    /// Mirror a replay's conversions in the ledger. The walk exchanges band
    /// holdings with the outside world at oracle prices: sold collateral leaves
    /// the authority, received debt arrives (gross of the admin fee), and the
    /// reverse on recovery.
    fn apply_walk_to_ledger(
        &mut self,
        market_id: MarketId,
        report: &WalkReport,
    ) -> Result<(), EngineError> {
        if report.is_noop() {
            return Ok(());
        }
        let (authority, collateral_asset, debt_asset) = self.market_accounts(market_id)?;

        if report.to < report.from {
            if report.collateral_converted > Decimal::ZERO {
                self.ledger
                    .burn(authority, collateral_asset, report.collateral_converted)?;
            }
            let debt_in = report.debt_converted + report.fees_accrued;
            if debt_in > Decimal::ZERO {
                self.ledger.mint(authority, debt_asset, debt_in)?;
            }
        } else {
            let collateral_in = report.collateral_converted + report.fees_accrued;
            if collateral_in > Decimal::ZERO {
                self.ledger.mint(authority, collateral_asset, collateral_in)?;
            }
            if report.debt_converted > Decimal::ZERO {
                self.ledger.burn(authority, debt_asset, report.debt_converted)?;
            }
        }
        Ok(())
    }

    fn emit_walk_events(&mut self, market_id: MarketId, report: &WalkReport) {
        if report.is_noop() {
            return;
        }

        self.emit_event(EventPayload::PriceSynced(PriceSyncedEvent {
            market_id,
            from: report.from,
            to: report.to,
            bands_touched: report.bands_touched,
            collateral_converted: report.collateral_converted,
            debt_converted: report.debt_converted,
        }));

        let debts: Vec<(crate::types::BandIndex, Decimal)> = report
            .newly_converted
            .iter()
            .filter_map(|index| {
                self.markets
                    .get(&market_id)
                    .and_then(|m| m.bands.get(index))
                    .map(|band| (*index, band.debt))
            })
            .collect();
        for (index, debt_held) in debts {
            self.emit_event(EventPayload::BandConverted(BandConvertedEvent {
                market_id,
                index,
                debt_held,
            }));
        }
    }
}
