//! Cushion Core Simulation.
//!
//! Walks the full engine lifecycle: issuer and market setup, band liquidity,
//! a price decline driving the soft-liquidation cascade, recovery, and a
//! borrow position riding through it all.

use cushion_core::*;
use rust_decimal_macros::dec;

const DEBT: AssetId = AssetId(1);
const COLLATERAL: AssetId = AssetId(2);

fn main() {
    println!("Cushion Core Engine Simulation");
    println!("Band AMM, Soft Liquidation, Full Lifecycle\n");

    scenario_1_market_setup();
    scenario_2_liquidation_cascade();
    scenario_3_price_recovery();
    scenario_4_borrow_lifecycle();

    println!("\nAll simulations completed successfully.");
}

fn reading(price: rust_decimal::Decimal, at: i64) -> OracleReading {
    OracleReading::new(Price::new_unchecked(price), Timestamp::from_secs(at))
}

/// Issuer, market, one band, first deposit.
fn scenario_1_market_setup() {
    println!("Scenario 1: Market Setup and First Deposit\n");

    let mut engine = Engine::new(EngineConfig::default());
    let admin = engine.allocate_account();
    let alice = engine.allocate_account();

    let issuer = engine.initialize_issuer(admin, DEBT).unwrap();
    let market = engine
        .create_market(admin, issuer, COLLATERAL, MarketParams::new(100), reading(dec!(100), 0))
        .unwrap();

    println!("  Issuer created, market created with A=100 at oracle price 100");

    engine.create_band(market, BandIndex(0)).unwrap();
    let bounds = engine
        .get_market(market)
        .unwrap()
        .bounds_of(BandIndex(0))
        .unwrap();
    println!("  Band 0 bounds: [{}; {})", bounds.lo, bounds.hi);

    engine
        .ledger_mut()
        .fund(alice, Asset::Collateral(COLLATERAL), dec!(1000));
    let result = engine
        .deposit_collateral(market, alice, BandIndex(0), dec!(1000))
        .unwrap();

    println!(
        "  Alice deposits 1000: minted {} shares, band holds {}, reserve {}\n",
        result.shares_minted,
        result.band_collateral,
        engine.get_market(market).unwrap().collateral_reserve
    );
}

/// Price falls through three bands; the walk converts them one by one.
fn scenario_2_liquidation_cascade() {
    println!("Scenario 2: Soft-Liquidation Cascade\n");

    let mut engine = Engine::new(EngineConfig::default());
    let admin = engine.allocate_account();
    let lp = engine.allocate_account();

    let issuer = engine.initialize_issuer(admin, DEBT).unwrap();
    let market = engine
        .create_market(admin, issuer, COLLATERAL, MarketParams::new(100), reading(dec!(100), 0))
        .unwrap();

    engine
        .ledger_mut()
        .fund(lp, Asset::Collateral(COLLATERAL), dec!(3000));
    for i in 0..3 {
        engine.create_band(market, BandIndex(i)).unwrap();
        engine
            .deposit_collateral(market, lp, BandIndex(i), dec!(1000))
            .unwrap();
    }
    println!("  3000 collateral spread over bands 0..=2");

    let mut feed = MockOracle::new(
        "sim-feed",
        Price::new_unchecked(dec!(100)),
        Timestamp::from_secs(0),
    );

    for (step, price) in [dec!(99.5), dec!(98.5), dec!(97.5), dec!(96.5)]
        .into_iter()
        .enumerate()
    {
        engine.advance_time(10);
        feed.set_price(Price::new_unchecked(price), engine.time());
        let report = engine
            .submit_oracle_price(market, feed.read().unwrap())
            .unwrap();
        let state = engine.get_market(market).unwrap();
        println!(
            "  Step {}: price {} -> touched {} bands, reserves: {} collateral / {} debt",
            step + 1,
            price,
            report.bands_touched,
            state.collateral_reserve.round_dp(2),
            state.debt_reserve.round_dp(2),
        );
    }

    let state = engine.get_market(market).unwrap();
    let converted = state
        .bands
        .values()
        .filter(|band| band.fully_converted())
        .count();
    println!("  Bands fully converted: {converted}/3\n");
}

/// A round trip through a band restores its holdings.
fn scenario_3_price_recovery() {
    println!("Scenario 3: Price Recovery Reversibility\n");

    let mut engine = Engine::new(EngineConfig::default());
    let admin = engine.allocate_account();
    let lp = engine.allocate_account();

    let issuer = engine.initialize_issuer(admin, DEBT).unwrap();
    let market = engine
        .create_market(admin, issuer, COLLATERAL, MarketParams::new(100), reading(dec!(100), 0))
        .unwrap();

    engine.create_band(market, BandIndex(0)).unwrap();
    engine
        .ledger_mut()
        .fund(lp, Asset::Collateral(COLLATERAL), dec!(1000));
    engine
        .deposit_collateral(market, lp, BandIndex(0), dec!(1000))
        .unwrap();

    engine.advance_time(10);
    engine
        .submit_oracle_price(market, reading(dec!(99.2), engine.time().as_secs()))
        .unwrap();
    {
        let band = engine.get_market(market).unwrap().band(BandIndex(0)).unwrap();
        println!(
            "  Price 99.2: band holds {} collateral / {} debt",
            band.collateral.round_dp(4),
            band.debt.round_dp(4)
        );
    }

    engine.advance_time(10);
    engine
        .submit_oracle_price(market, reading(dec!(100), engine.time().as_secs()))
        .unwrap();
    let band = engine.get_market(market).unwrap().band(BandIndex(0)).unwrap();
    println!(
        "  Back at 100: band holds {} collateral / {} debt\n",
        band.collateral.round_dp(4),
        band.debt.round_dp(4)
    );
}

/// Borrow against a range, watch health degrade, repay and close.
fn scenario_4_borrow_lifecycle() {
    println!("Scenario 4: Borrow Lifecycle\n");

    let mut engine = Engine::new(EngineConfig::default());
    let admin = engine.allocate_account();
    let bob = engine.allocate_account();

    let issuer = engine.initialize_issuer(admin, DEBT).unwrap();
    let market = engine
        .create_market(admin, issuer, COLLATERAL, MarketParams::new(100), reading(dec!(100), 0))
        .unwrap();

    for i in 0..=3 {
        engine.create_band(market, BandIndex(i)).unwrap();
    }

    engine
        .ledger_mut()
        .fund(bob, Asset::Collateral(COLLATERAL), dec!(4000));
    let result = engine
        .open_borrow(market, bob, dec!(4000), BandIndex(0), BandIndex(3), dec!(300000))
        .unwrap();
    println!(
        "  Bob borrows 300000 against 4000 collateral over bands 0..=3 (limit {})",
        result.borrow_limit.round_dp(2)
    );

    engine.advance_time(10);
    engine
        .submit_oracle_price(market, reading(dec!(97.5), engine.time().as_secs()))
        .unwrap();
    match engine.position_health(market, bob).unwrap() {
        PositionHealth::SoftLiquidating {
            bands_converted,
            bands_total,
            ..
        } => println!("  Price 97.5: soft-liquidating, {bands_converted}/{bands_total} bands converted"),
        other => println!("  Price 97.5: {other:?}"),
    }

    engine.advance_time(10);
    engine
        .submit_oracle_price(market, reading(dec!(100), engine.time().as_secs()))
        .unwrap();
    let repay = engine.repay(market, bob, dec!(300000)).unwrap();
    println!(
        "  Price recovers; Bob repays in full: closed={}, got back {} collateral / {} debt",
        repay.closed,
        repay.collateral_returned.round_dp(4),
        repay.debt_returned.round_dp(4)
    );
}
