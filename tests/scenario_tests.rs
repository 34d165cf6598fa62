//! End-to-end scenarios against the engine: the concrete market setup from the
//! account schema, the borrow health bound, lazy sync behavior, and the full
//! error taxonomy.

use cushion_core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const DEBT: AssetId = AssetId(1);
const COLL: AssetId = AssetId(2);

fn reading(price: Decimal, at: i64) -> OracleReading {
    OracleReading::new(Price::new_unchecked(price), Timestamp::from_secs(at))
}

fn setup() -> (Engine, IssuerId, MarketId, AccountId) {
    let mut engine = Engine::new(EngineConfig::default());
    let admin = engine.allocate_account();
    let issuer = engine.initialize_issuer(admin, DEBT).unwrap();
    let market = engine
        .create_market(admin, issuer, COLL, MarketParams::new(100), reading(dec!(100), 0))
        .unwrap();
    (engine, issuer, market, admin)
}

fn funded_account(engine: &mut Engine, amount: Decimal) -> AccountId {
    let account = engine.allocate_account();
    engine
        .ledger_mut()
        .fund(account, Asset::Collateral(COLL), amount);
    account
}

#[test]
fn concrete_market_scenario() {
    // issuer for debt asset D, market (D, C) with A = 100 at oracle price 100:
    // band 0 spans [99, 100), a 1000 deposit mints 1000 shares
    let (mut engine, _, market, _) = setup();
    let alice = funded_account(&mut engine, dec!(1000));

    engine.create_band(market, BandIndex(0)).unwrap();
    let bounds = engine
        .get_market(market)
        .unwrap()
        .bounds_of(BandIndex(0))
        .unwrap();
    assert_eq!(bounds.hi.value(), dec!(100));
    assert_eq!(bounds.lo.value(), dec!(99));

    let result = engine
        .deposit_collateral(market, alice, BandIndex(0), dec!(1000))
        .unwrap();
    assert_eq!(result.shares_minted, dec!(1000));

    let state = engine.get_market(market).unwrap();
    assert_eq!(state.band(BandIndex(0)).unwrap().collateral, dec!(1000));
    assert_eq!(state.band(BandIndex(0)).unwrap().shares_of(alice), dec!(1000));
    assert_eq!(state.collateral_reserve, dec!(1000));
}

#[test]
fn borrow_health_bound_is_worst_case_price() {
    let (mut engine, _, market, _) = setup();
    let bob = funded_account(&mut engine, dec!(8000));
    for i in 0..=3 {
        engine.create_band(market, BandIndex(i)).unwrap();
    }

    // worst case price is lo(3) = 100 * 0.99^4 = 96.059601;
    // limit = 4000 * 96.059601 * 0.9
    let limit = dec!(345814.5636);

    let result = engine
        .open_borrow(market, bob, dec!(4000), BandIndex(0), BandIndex(3), limit)
        .unwrap();
    assert_eq!(result.borrow_limit, limit);
    assert_eq!(
        engine.ledger().balance_of(bob, Asset::Debt(DEBT)),
        limit
    );

    // one unit above the bound fails, and fails atomically
    let carol = funded_account(&mut engine, dec!(8000));
    let err = engine
        .open_borrow(market, carol, dec!(4000), BandIndex(0), BandIndex(3), limit + dec!(1))
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientCollateral { .. }));
    assert_eq!(
        engine.ledger().balance_of(carol, Asset::Collateral(COLL)),
        dec!(8000)
    );
    assert!(engine.get_position(market, carol).is_none());
}

#[test]
fn borrow_spreads_collateral_evenly() {
    let (mut engine, _, market, _) = setup();
    let bob = funded_account(&mut engine, dec!(4000));
    for i in 0..=3 {
        engine.create_band(market, BandIndex(i)).unwrap();
    }

    engine
        .open_borrow(market, bob, dec!(4000), BandIndex(0), BandIndex(3), dec!(1000))
        .unwrap();

    let state = engine.get_market(market).unwrap();
    for i in 0..=3 {
        assert_eq!(state.band(BandIndex(i)).unwrap().collateral, dec!(1000));
        assert_eq!(state.band(BandIndex(i)).unwrap().shares_of(bob), dec!(1000));
    }
    assert_eq!(state.collateral_reserve, dec!(4000));
}

#[test]
fn lazy_sync_replays_before_acting() {
    let (mut engine, _, market, _) = setup();
    let alice = funded_account(&mut engine, dec!(2000));
    engine.create_band(market, BandIndex(0)).unwrap();
    engine
        .deposit_collateral(market, alice, BandIndex(0), dec!(1000))
        .unwrap();

    // push a lower price; the submit itself replays the walk
    engine.advance_time(10);
    engine
        .submit_oracle_price(market, reading(dec!(99.5), 10))
        .unwrap();

    let band = engine.get_market(market).unwrap().band(BandIndex(0)).unwrap();
    assert!(band.collateral < dec!(1000));
    assert!(band.debt > Decimal::ZERO);

    // a second deposit prices the converted mixture, not the stale one
    let result = engine
        .deposit_collateral(market, alice, BandIndex(0), dec!(500))
        .unwrap();
    assert!(result.shares_minted > Decimal::ZERO);
    assert!(engine.get_market(market).unwrap().reserves_consistent());
}

#[test]
fn watermark_never_replays_a_delta_twice() {
    let (mut engine, _, market, _) = setup();
    let alice = funded_account(&mut engine, dec!(1000));
    engine.create_band(market, BandIndex(0)).unwrap();
    engine
        .deposit_collateral(market, alice, BandIndex(0), dec!(1000))
        .unwrap();

    engine.advance_time(5);
    let first = engine
        .submit_oracle_price(market, reading(dec!(99.5), 5))
        .unwrap();
    assert_eq!(first.bands_touched, 1);

    // same price again: the delta is already consumed
    engine.advance_time(5);
    let second = engine
        .submit_oracle_price(market, reading(dec!(99.5), 10))
        .unwrap();
    assert!(second.is_noop());

    let band = engine.get_market(market).unwrap().band(BandIndex(0)).unwrap();
    let after_first = first.debt_converted;
    assert_eq!(band.debt, after_first);
}

#[test]
fn full_range_conversion_is_completed_soft_liquidation() {
    let (mut engine, _, market, _) = setup();
    let bob = funded_account(&mut engine, dec!(4000));
    for i in 0..=1 {
        engine.create_band(market, BandIndex(i)).unwrap();
    }

    engine
        .open_borrow(market, bob, dec!(4000), BandIndex(0), BandIndex(1), dec!(1000))
        .unwrap();

    match engine.position_health(market, bob).unwrap() {
        PositionHealth::Healthy { debt, .. } => assert_eq!(debt, dec!(1000)),
        other => panic!("expected Healthy, got {other:?}"),
    }

    // fall partway into the range
    engine.advance_time(10);
    engine
        .submit_oracle_price(market, reading(dec!(98.5), 10))
        .unwrap();
    match engine.position_health(market, bob).unwrap() {
        PositionHealth::SoftLiquidating {
            bands_converted,
            bands_total,
            ..
        } => {
            assert_eq!(bands_converted, 1);
            assert_eq!(bands_total, 2);
        }
        other => panic!("expected SoftLiquidating, got {other:?}"),
    }

    // fall through the whole range: no discrete liquidation event, the range
    // is simply all debt now
    engine.advance_time(10);
    engine
        .submit_oracle_price(market, reading(dec!(97), 20))
        .unwrap();
    match engine.position_health(market, bob).unwrap() {
        PositionHealth::FullyConverted { debt_recovered, debt } => {
            assert!(debt_recovered > Decimal::ZERO);
            assert_eq!(debt, dec!(1000));
        }
        other => panic!("expected FullyConverted, got {other:?}"),
    }
}

#[test]
fn repay_in_full_releases_the_mixture() {
    let (mut engine, _, market, _) = setup();
    let bob = funded_account(&mut engine, dec!(2000));
    engine.create_band(market, BandIndex(0)).unwrap();
    engine
        .open_borrow(market, bob, dec!(2000), BandIndex(0), BandIndex(0), dec!(1000))
        .unwrap();

    // partial conversion, then repay everything
    engine.advance_time(10);
    engine
        .submit_oracle_price(market, reading(dec!(99.5), 10))
        .unwrap();

    let result = engine.repay(market, bob, dec!(1000)).unwrap();
    assert!(result.closed);
    assert!(result.collateral_returned > Decimal::ZERO);
    assert!(result.debt_returned > Decimal::ZERO);
    assert!(engine.get_position(market, bob).is_none());

    // the borrower's wallet received both components
    assert_eq!(
        engine.ledger().balance_of(bob, Asset::Collateral(COLL)),
        result.collateral_returned
    );
    assert_eq!(
        engine.ledger().balance_of(bob, Asset::Debt(DEBT)),
        result.debt_returned
    );

    // partial repayment path stays open
    let dana = funded_account(&mut engine, dec!(2000));
    engine.create_band(market, BandIndex(5)).unwrap();
    engine
        .open_borrow(market, dana, dec!(2000), BandIndex(5), BandIndex(5), dec!(500))
        .unwrap();
    let partial = engine.repay(market, dana, dec!(200)).unwrap();
    assert!(!partial.closed);
    assert_eq!(partial.remaining_debt, dec!(300));
    assert!(engine.get_position(market, dana).is_some());
}

#[test]
fn duplicate_creation_fails_everywhere() {
    let (mut engine, issuer, market, admin) = setup();

    // one issuer per debt asset
    let other_admin = engine.allocate_account();
    assert!(matches!(
        engine.initialize_issuer(other_admin, DEBT),
        Err(EngineError::IssuerExists(_))
    ));

    // one market per (issuer, collateral)
    assert!(matches!(
        engine.create_market(admin, issuer, COLL, MarketParams::new(50), reading(dec!(100), 0)),
        Err(EngineError::MarketExists(_, _))
    ));

    // one band per index
    engine.create_band(market, BandIndex(0)).unwrap();
    assert!(matches!(
        engine.create_band(market, BandIndex(0)),
        Err(EngineError::Market(MarketError::BandExists(_)))
    ));

    // one position per (market, borrower)
    let bob = funded_account(&mut engine, dec!(4000));
    engine
        .open_borrow(market, bob, dec!(1000), BandIndex(0), BandIndex(0), dec!(500))
        .unwrap();
    assert!(matches!(
        engine.open_borrow(market, bob, dec!(1000), BandIndex(0), BandIndex(0), dec!(500)),
        Err(EngineError::PositionExists(_, _))
    ));
}

#[test]
fn market_creation_gating() {
    let (mut engine, issuer, _, admin) = setup();

    // only the admin may authorize markets
    let mallory = engine.allocate_account();
    assert!(matches!(
        engine.create_market(mallory, issuer, AssetId(3), MarketParams::new(100), reading(dec!(50), 0)),
        Err(EngineError::Unauthorized(_))
    ));

    // degenerate amplification collapses band geometry
    assert!(matches!(
        engine.create_market(admin, issuer, AssetId(3), MarketParams::new(1), reading(dec!(50), 0)),
        Err(EngineError::InvalidAmplification(1))
    ));

    // stale oracle snapshot is refused
    engine.set_time(Timestamp::from_secs(1_000));
    assert!(matches!(
        engine.create_market(admin, issuer, AssetId(3), MarketParams::new(100), reading(dec!(50), 0)),
        Err(EngineError::Oracle(OracleError::Stale { .. }))
    ));

    // unknown issuer
    assert!(matches!(
        engine.create_market(admin, IssuerId(99), AssetId(3), MarketParams::new(100), reading(dec!(50), 1_000)),
        Err(EngineError::IssuerNotFound(_))
    ));
}

#[test]
fn stale_reading_blocks_band_operations() {
    let (mut engine, _, market, _) = setup();
    let alice = funded_account(&mut engine, dec!(1000));
    engine.create_band(market, BandIndex(0)).unwrap();

    // the stored reading ages past the market's trust window
    engine.set_time(Timestamp::from_secs(61));
    assert!(matches!(
        engine.deposit_collateral(market, alice, BandIndex(0), dec!(100)),
        Err(EngineError::Oracle(OracleError::Stale { .. }))
    ));

    // a fresh reading unblocks the same call
    engine
        .submit_oracle_price(market, reading(dec!(100), 61))
        .unwrap();
    engine
        .deposit_collateral(market, alice, BandIndex(0), dec!(100))
        .unwrap();
}

#[test]
fn invalid_parameters_are_rejected() {
    let (mut engine, _, market, _) = setup();
    let alice = funded_account(&mut engine, dec!(1000));
    engine.create_band(market, BandIndex(0)).unwrap();

    assert!(matches!(
        engine.deposit_collateral(market, alice, BandIndex(0), Decimal::ZERO),
        Err(EngineError::InvalidAmount(_))
    ));
    assert!(matches!(
        engine.deposit_collateral(market, alice, BandIndex(0), dec!(-10)),
        Err(EngineError::InvalidAmount(_))
    ));
    assert!(matches!(
        engine.open_borrow(market, alice, dec!(100), BandIndex(3), BandIndex(1), dec!(50)),
        Err(EngineError::InvalidRange { .. })
    ));
    assert!(matches!(
        engine.withdraw(market, alice, BandIndex(9), dec!(10)),
        Err(EngineError::Market(MarketError::BandNotFound(_)))
    ));
}

#[test]
fn withdraw_more_shares_than_held_fails() {
    let (mut engine, _, market, _) = setup();
    let alice = funded_account(&mut engine, dec!(1000));
    engine.create_band(market, BandIndex(0)).unwrap();
    engine
        .deposit_collateral(market, alice, BandIndex(0), dec!(1000))
        .unwrap();

    let err = engine
        .withdraw(market, alice, BandIndex(0), dec!(1001))
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Market(MarketError::Band(BandError::InsufficientShares { .. }))
    ));
}

#[test]
fn deposit_below_liquidated_band_rejected_and_audited() {
    let (mut engine, _, market, _) = setup();
    let alice = funded_account(&mut engine, dec!(2000));
    engine.create_band(market, BandIndex(0)).unwrap();
    engine
        .deposit_collateral(market, alice, BandIndex(0), dec!(1000))
        .unwrap();

    // price falls clean through band 0
    engine.advance_time(10);
    engine
        .submit_oracle_price(market, reading(dec!(98), 10))
        .unwrap();

    let err = engine
        .deposit_collateral(market, alice, BandIndex(0), dec!(500))
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Market(MarketError::Band(BandError::Liquidating { .. }))
    ));

    // the rejection is an audit fact
    let rejected = engine
        .events()
        .iter()
        .any(|e| matches!(e.payload, EventPayload::DepositRejected(_)));
    assert!(rejected);
}

#[test]
fn borrow_requires_existing_bands() {
    let (mut engine, _, market, _) = setup();
    let bob = funded_account(&mut engine, dec!(4000));
    engine.create_band(market, BandIndex(0)).unwrap();
    // band 1 missing: creation is never implicit
    let err = engine
        .open_borrow(market, bob, dec!(4000), BandIndex(0), BandIndex(1), dec!(100))
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Market(MarketError::BandNotFound(BandIndex(1)))
    ));
}

#[test]
fn repay_cannot_exceed_debt() {
    let (mut engine, _, market, _) = setup();
    let bob = funded_account(&mut engine, dec!(2000));
    engine.create_band(market, BandIndex(0)).unwrap();
    engine
        .open_borrow(market, bob, dec!(2000), BandIndex(0), BandIndex(0), dec!(500))
        .unwrap();

    assert!(matches!(
        engine.repay(market, bob, dec!(501)),
        Err(EngineError::RepayExceedsDebt { .. })
    ));
    assert!(matches!(
        engine.repay(market, bob, dec!(100)),
        Ok(RepayResult { closed: false, .. })
    ));

    let stranger = engine.allocate_account();
    assert!(matches!(
        engine.repay(market, stranger, dec!(1)),
        Err(EngineError::PositionNotFound(_, _))
    ));
}

#[test]
fn every_mutation_emits_an_audit_event() {
    let (mut engine, _, market, _) = setup();
    let alice = funded_account(&mut engine, dec!(2000));

    engine.create_band(market, BandIndex(0)).unwrap();
    engine
        .deposit_collateral(market, alice, BandIndex(0), dec!(1000))
        .unwrap();
    engine.advance_time(10);
    engine
        .submit_oracle_price(market, reading(dec!(98), 10))
        .unwrap();

    let payloads: Vec<&EventPayload> = engine.events().iter().map(|e| &e.payload).collect();
    assert!(payloads.iter().any(|p| matches!(p, EventPayload::IssuerInitialized(_))));
    assert!(payloads.iter().any(|p| matches!(p, EventPayload::MarketCreated(_))));
    assert!(payloads.iter().any(|p| matches!(p, EventPayload::BandCreated(_))));
    assert!(payloads.iter().any(|p| matches!(p, EventPayload::CollateralDeposited(_))));
    assert!(payloads.iter().any(|p| matches!(p, EventPayload::PriceSynced(_))));
    assert!(payloads.iter().any(|p| matches!(p, EventPayload::BandConverted(_))));

    // events are externally consumable as JSON
    let json = serde_json::to_string(engine.events()).unwrap();
    assert!(json.contains("CollateralDeposited"));
    assert!(json.contains("BandConverted"));
}
