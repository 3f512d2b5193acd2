use agrohedge_core::engine::{analyze_hedge, compute_outcome, HedgeInput, HedgeOutcome};
use agrohedge_core::model::{CostItem, CostStructure, HedgeLock, ProductionEstimate, SimulationInputs};
use agrohedge_core::HedgeError;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn assert_close(actual: f64, expected: f64, tol: f64, what: &str) {
    assert!(
        (actual - expected).abs() <= tol,
        "{what}: expected {expected}, got {actual}"
    );
}

/// The fixture used throughout: 45 000 bu locked, 90 sacks/ha over 500 ha.
fn golden() -> HedgeOutcome {
    let sim = SimulationInputs {
        chicago_price: 11.29,
        physical_price: 134.00,
        fx_rate: 5.3832,
        ..SimulationInputs::reference()
    };
    let lock = HedgeLock {
        bushel_quantity: 45000.0,
        locked_forward_soy_price: 11.14,
        locked_forward_fx_rate: 5.5605,
        ..HedgeLock::reference()
    };
    let production = ProductionEstimate {
        sacks_per_hectare: 90.0,
        area: 500.0,
        freight_cost_total: 0.0,
    };
    compute_outcome(&sim, &lock, &production, 4120.33 * 500.0)
}

// ===========================================================================
// Golden fixture
// ===========================================================================

#[test]
fn test_golden_volumes() {
    let out = golden();
    assert_eq!(out.total_sacks, 45000.0);
    assert_close(out.protected_sacks, 20417.42, 0.005, "protected sacks");
    assert_close(out.exposed_sacks, 24582.58, 0.005, "exposed sacks");
}

#[test]
fn test_outcome_uses_contract_helpers() {
    let lock = HedgeLock::reference();
    let sim = SimulationInputs::reference();
    let out = compute_outcome(&sim, &lock, &ProductionEstimate::reference(), 0.0);
    assert_eq!(out.protected_sacks, lock.protected_sacks());
    assert_eq!(
        out.fx_adjustment,
        (lock.locked_forward_fx_rate - sim.fx_rate) * lock.dollar_notional()
    );
}

#[test]
fn test_golden_revenue_and_profit() {
    let out = golden();
    // 134 * 20417.42 - 6750 * 5.3832 + 88880.49
    assert_close(out.revenue_protected, 2_788_478.554, 0.01, "protected revenue");
    assert_close(out.revenue_exposed, 3_294_065.336, 0.01, "exposed revenue");
    assert_close(out.revenue_total, 6_082_543.89, 0.01, "total revenue");
    assert_close(out.profit_total, 4_022_378.89, 0.01, "total profit");
    assert_close(out.value_per_sack_total, 135.167642, 1e-6, "value per sack");
    assert_close(out.value_per_sack_protected, 136.573483, 1e-6, "protected value per sack");
    assert_eq!(out.value_per_sack_exposed, 134.0);
}

#[test]
fn test_golden_ratios() {
    let out = golden();
    assert_close(out.margin_pct, 66.129879, 1e-5, "margin");
    assert_close(out.roi_pct, 195.245473, 1e-5, "roi");
    assert_close(out.lock_premium, 0.048973, 1e-6, "lock premium");
}

// ===========================================================================
// Invariants
// ===========================================================================

#[test]
fn test_partition_invariant() {
    for (sacks_per_hectare, area) in [(90.0, 500.0), (55.5, 1234.0), (10.0, 100.0), (120.0, 3.5)] {
        let mut input = HedgeInput::reference();
        input.production.sacks_per_hectare = sacks_per_hectare;
        input.production.area = area;
        let out = analyze_hedge(&input).unwrap().result;
        assert!(
            (out.protected_sacks + out.exposed_sacks - out.total_sacks).abs() < 1e-9,
            "partition broken for {sacks_per_hectare} x {area}"
        );
    }
}

#[test]
fn test_profit_is_revenue_minus_cost() {
    let input = HedgeInput::reference();
    let out = analyze_hedge(&input).unwrap().result;
    let operating = input.operating_cost();
    assert_close(
        out.profit_total,
        out.revenue_total - operating,
        1e-6,
        "profit identity",
    );
}

#[test]
fn test_determinism_bit_identical() {
    let input = HedgeInput::reference();
    let a = analyze_hedge(&input).unwrap().result;
    let b = analyze_hedge(&input).unwrap().result;
    let bits = |o: &HedgeOutcome| {
        serde_json::to_value(o)
            .unwrap()
            .as_object()
            .unwrap()
            .values()
            .map(|v| v.as_f64().map(f64::to_bits))
            .collect::<Vec<_>>()
    };
    assert_eq!(bits(&a), bits(&b));
    assert_eq!(a.profit_total.to_bits(), b.profit_total.to_bits());
}

#[test]
fn test_zero_total_sacks_no_panic() {
    let mut input = HedgeInput::reference();
    input.production.sacks_per_hectare = 0.0;
    let output = analyze_hedge(&input).unwrap();
    let out = output.result;
    assert_eq!(out.total_sacks, 0.0);
    assert!(!out.value_per_sack_total.is_finite());
    assert!(!out.cost_protected.is_finite());
    assert!(!output.warnings.is_empty());
}

#[test]
fn test_zero_operating_cost_roi_undefined() {
    let mut input = HedgeInput::reference();
    input.costs = CostStructure::default();
    let output = analyze_hedge(&input).unwrap();
    assert!(output.result.roi_pct.is_infinite());
    assert!(output.warnings.iter().any(|w| w.contains("ROI")));
}

#[test]
fn test_operating_cost_tracks_ledger_edit() {
    let mut input = HedgeInput::reference();
    let before = analyze_hedge(&input).unwrap().result;
    input.costs.set(CostItem::Fertilizers, dec!(1024.34));
    let after = analyze_hedge(&input).unwrap().result;
    // +100 R$/ha over 500 ha
    assert_close(
        before.profit_total - after.profit_total,
        50_000.0,
        1e-6,
        "profit delta",
    );
    // Fixed costs never reach the engine.
    input.costs.set(CostItem::LandRemuneration, dec!(0));
    let fixed_edit = analyze_hedge(&input).unwrap().result;
    assert_eq!(fixed_edit.profit_total, after.profit_total);
}

#[test]
fn test_reference_dataset_outcome() {
    let out = analyze_hedge(&HedgeInput::reference()).unwrap();
    // operating cost 3177.76 R$/ha over 500 ha
    assert_close(out.result.profit_total, 6_082_543.89 - 1_588_880.0, 1e-4, "profit");
    assert_close(out.result.roi_pct, 282.819589, 1e-5, "roi");
    assert_eq!(out.assumptions["bushels_per_sack"], 2.204);
}

#[test]
fn test_non_finite_input_rejected_with_field_name() {
    let mut input = HedgeInput::reference();
    input.hedge_lock.bushel_quantity = f64::INFINITY;
    match analyze_hedge(&input) {
        Err(HedgeError::InvalidInput { field, .. }) => {
            assert_eq!(field, "hedge_lock.bushel_quantity")
        }
        other => panic!("expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn test_input_json_roundtrip_recomputes_totals() {
    let input = HedgeInput::reference();
    let json = serde_json::to_string(&input).unwrap();
    let parsed: HedgeInput = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, input);
    assert_eq!(parsed.costs.operating_cost(), dec!(3177.76));
}

#[test]
fn test_non_finite_outputs_serialize_as_null() {
    let mut input = HedgeInput::reference();
    input.production.area = 0.0;
    let out = analyze_hedge(&input).unwrap().result;
    let json = serde_json::to_value(out).unwrap();
    assert!(json["value_per_sack_total"].is_null());
    assert!(json["coverage_ratio"].is_null());
    assert_eq!(json["total_sacks"], 0.0);
}
