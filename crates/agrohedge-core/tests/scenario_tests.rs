use agrohedge_core::engine::{compute_outcome, HedgeInput};
use agrohedge_core::model::{ScenarioBook, ScenarioId, ScenarioKind, SimulationInputs};
use agrohedge_core::scenarios::{
    best_by, compare_scenarios, evaluate_all, ScenarioComparisonInput, ScenarioMetric,
};
use agrohedge_core::HedgeError;
use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;

fn created() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 3, 9, 30, 0).unwrap()
}

fn sim(chicago: f64, physical: f64, fx: f64) -> SimulationInputs {
    SimulationInputs {
        chicago_price: chicago,
        physical_price: physical,
        fx_rate: fx,
        ..SimulationInputs::reference()
    }
}

fn book() -> ScenarioBook {
    let mut book = ScenarioBook::new();
    book.create("Bear", ScenarioKind::Pessimistic, sim(10.2, 118.0, 5.05), created())
        .unwrap();
    book.create("Base", ScenarioKind::Realistic, sim(11.29, 134.0, 5.3832), created())
        .unwrap();
    book.create("Bull", ScenarioKind::Optimistic, sim(12.4, 152.0, 5.75), created())
        .unwrap();
    book
}

// ===========================================================================
// Scenario book
// ===========================================================================

#[test]
fn test_book_assigns_sequential_ids() {
    let book = book();
    let ids: Vec<&str> = book.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["scenario-0", "scenario-1", "scenario-2"]);
}

#[test]
fn test_book_rejects_blank_name() {
    let mut book = ScenarioBook::new();
    let err = book
        .create("   ", ScenarioKind::Custom, SimulationInputs::reference(), created())
        .unwrap_err();
    assert!(matches!(err, HedgeError::InvalidInput { .. }));
    assert!(book.is_empty());
}

#[test]
fn test_removed_ids_are_not_reused() {
    let mut book = book();
    let removed = book.remove(&ScenarioId::new("scenario-2")).unwrap();
    assert_eq!(removed.name, "Bull");
    let id = book
        .create("Again", ScenarioKind::Custom, SimulationInputs::reference(), created())
        .unwrap()
        .id
        .clone();
    assert_eq!(id.as_str(), "scenario-3");
    assert_eq!(book.len(), 3);
}

// ===========================================================================
// Evaluation and ranking
// ===========================================================================

#[test]
fn test_results_match_engine_per_scenario() {
    let base = HedgeInput::reference();
    let context = base.context();
    let book = book();
    let results = evaluate_all(book.as_slice(), &context);
    assert_eq!(results.len(), 3);
    for (scenario, result) in book.iter().zip(&results) {
        let direct = compute_outcome(
            &scenario.inputs,
            &context.hedge_lock,
            &context.production,
            context.operating_cost,
        );
        assert_eq!(result.outcome, direct);
        assert_eq!(&result.scenario, scenario);
    }
}

#[test]
fn test_best_by_each_metric() {
    let results = evaluate_all(book().as_slice(), &HedgeInput::reference().context());
    for metric in ScenarioMetric::ALL {
        let best = best_by(metric, &results).unwrap();
        assert_eq!(best.scenario.name, "Bull", "metric {metric:?}");
    }
}

#[test]
fn test_ranking_ties_resolve_to_first() {
    let mut book = ScenarioBook::new();
    for name in ["First", "Second", "Third"] {
        book.create(name, ScenarioKind::Custom, sim(11.0, 140.0, 5.4), created())
            .unwrap();
    }
    let results = evaluate_all(book.as_slice(), &HedgeInput::reference().context());
    for metric in ScenarioMetric::ALL {
        assert_eq!(best_by(metric, &results).unwrap().scenario.name, "First");
    }
}

#[test]
fn test_reordering_changes_tie_winner_only() {
    let mut book = ScenarioBook::new();
    book.create("A", ScenarioKind::Custom, sim(11.0, 140.0, 5.4), created())
        .unwrap();
    book.create("B", ScenarioKind::Custom, sim(11.0, 140.0, 5.4), created())
        .unwrap();
    let mut scenarios = book.as_slice().to_vec();
    scenarios.reverse();
    let results = evaluate_all(&scenarios, &HedgeInput::reference().context());
    let best = best_by(ScenarioMetric::ProfitTotal, &results).unwrap();
    assert_eq!(best.scenario.name, "B");
}

#[test]
fn test_best_by_empty() {
    assert!(best_by(ScenarioMetric::RevenueTotal, &[]).is_none());
}

// ===========================================================================
// Comparison envelope
// ===========================================================================

#[test]
fn test_compare_scenarios_reports_winners() {
    let input = ScenarioComparisonInput {
        base: HedgeInput::reference(),
        scenarios: book().as_slice().to_vec(),
    };
    let out = compare_scenarios(&input).unwrap();
    assert_eq!(out.result.results.len(), 3);
    assert_eq!(out.result.best.len(), 4);
    for best in &out.result.best {
        assert_eq!(best.scenario_id, "scenario-2");
        assert_eq!(best.name, "Bull");
    }
    assert_eq!(out.assumptions["num_scenarios"], 3);
    assert!(out.warnings.is_empty());
}

#[test]
fn test_compare_base_matches_realistic_scenario() {
    let input = ScenarioComparisonInput {
        base: HedgeInput::reference(),
        scenarios: book().as_slice().to_vec(),
    };
    let out = compare_scenarios(&input).unwrap();
    // "Base" carries the reference simulation inputs.
    assert_eq!(out.result.results[1].outcome, out.result.base);
}

#[test]
fn test_compare_warns_on_undefined_scenario_outputs() {
    let mut base = HedgeInput::reference();
    base.production.area = 0.0;
    let input = ScenarioComparisonInput {
        base,
        scenarios: book().as_slice().to_vec(),
    };
    let out = compare_scenarios(&input).unwrap();
    assert!(out
        .warnings
        .iter()
        .any(|w| w.starts_with("Scenario 'Bear'")));
}

#[test]
fn test_comparison_input_from_json() {
    let json = serde_json::json!({
        "base": serde_json::to_value(HedgeInput::reference()).unwrap(),
        "scenarios": [{
            "id": "bear",
            "name": "Bear",
            "kind": "pessimistic",
            "created_at": "2025-11-03T09:30:00Z",
            "inputs": { "chicago_price": 10.2, "physical_price": 118.0, "fx_rate": 5.05 }
        }]
    });
    let input: ScenarioComparisonInput = serde_json::from_value(json).unwrap();
    assert_eq!(input.scenarios[0].inputs.freight_cost, 0.0);
    let out = compare_scenarios(&input).unwrap();
    assert_eq!(out.result.best[0].scenario_id, "bear");
}
