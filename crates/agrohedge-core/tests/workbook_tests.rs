use agrohedge_core::engine::{compute_outcome, HedgeInput, HedgeOutcome};
use agrohedge_core::model::{CostCategory, CostLine, ScenarioBook, ScenarioKind, SimulationInputs};
use agrohedge_core::scenarios::{best_by, evaluate_all, ScenarioMetric};
use agrohedge_core::workbook::{
    best_name_cell, compile_workbook, evaluate_workbook, CellRef, Evaluation, Layout, Quantity,
    ScenarioColumn, SheetKind, Value, Workbook, WorkbookInput,
};
use agrohedge_core::HedgeError;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

const REL_TOL: f64 = 1e-6;

fn assert_rel(actual: f64, expected: f64, what: &str) {
    if !expected.is_finite() {
        assert!(!actual.is_finite(), "{what}: expected {expected}, got {actual}");
        return;
    }
    let scale = expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() / scale <= REL_TOL,
        "{what}: expected {expected}, got {actual}"
    );
}

fn input_with(base: &HedgeInput, scenarios: usize) -> WorkbookInput {
    let mut book = ScenarioBook::new();
    let at = Utc.with_ymd_and_hms(2025, 11, 3, 12, 0, 0).unwrap();
    for i in 0..scenarios {
        let step = i as f64;
        let inputs = SimulationInputs {
            chicago_price: 10.5 + 0.4 * step,
            physical_price: 120.0 + 7.0 * step,
            fx_rate: 5.0 + 0.15 * step,
            ..base.simulation
        };
        book.create(format!("Scenario {}", i + 1), ScenarioKind::Custom, inputs, at)
            .unwrap();
    }
    WorkbookInput::from_hedge_input(base, book.as_slice().to_vec())
}

fn compile(input: &WorkbookInput) -> (Workbook, Layout, Evaluation) {
    let workbook = compile_workbook(input).unwrap();
    let layout = Layout::new(&input.cost_lines, input.scenarios.len()).unwrap();
    let evaluation = evaluate_workbook(&workbook).unwrap();
    (workbook, layout, evaluation)
}

fn dashboard_pairs(out: &HedgeOutcome) -> Vec<(Quantity, f64)> {
    vec![
        (Quantity::TotalSacks, out.total_sacks),
        (Quantity::ProtectedSacks, out.protected_sacks),
        (Quantity::ExposedSacks, out.exposed_sacks),
        (Quantity::CoverageRatio, out.coverage_ratio),
        (Quantity::SoyAdjustment, out.soy_adjustment),
        (Quantity::FxAdjustment, out.fx_adjustment),
        (Quantity::RevenueProtected, out.revenue_protected),
        (Quantity::RevenueExposed, out.revenue_exposed),
        (Quantity::RevenueTotal, out.revenue_total),
        (Quantity::CostProtected, out.cost_protected),
        (Quantity::CostExposed, out.cost_exposed),
        (Quantity::ProfitProtected, out.profit_protected),
        (Quantity::ProfitExposed, out.profit_exposed),
        (Quantity::ProfitTotal, out.profit_total),
        (Quantity::ValuePerSackTotal, out.value_per_sack_total),
        (Quantity::ValuePerSackProtected, out.value_per_sack_protected),
        (Quantity::ValuePerSackExposed, out.value_per_sack_exposed),
        (Quantity::MarginPct, out.margin_pct),
        (Quantity::RoiPct, out.roi_pct),
        (Quantity::LockPremium, out.lock_premium),
    ]
}

// ===========================================================================
// Formula-graph equivalence
// ===========================================================================

#[test]
fn test_dashboard_matches_engine() {
    let base = HedgeInput::reference();
    let (_, layout, evaluation) = compile(&input_with(&base, 0));
    let expected = compute_outcome(
        &base.simulation,
        &base.hedge_lock,
        &base.production,
        base.operating_cost(),
    );
    for (quantity, value) in dashboard_pairs(&expected) {
        let actual = evaluation.number(layout.addr(quantity)).unwrap();
        assert_rel(actual, value, &format!("{quantity:?}"));
    }
}

#[test]
fn test_cost_totals_match_ledger() {
    let base = HedgeInput::reference();
    let (_, layout, evaluation) = compile(&input_with(&base, 0));
    let area = base.production.area;
    let number = |q: Quantity| evaluation.number(layout.addr(q)).unwrap();
    assert_rel(number(Quantity::VariableCostsTotal), 3177.76 * area, "variable");
    assert_rel(number(Quantity::FixedCostsTotal), 2692.87 * area, "fixed");
    assert_rel(number(Quantity::OperatingCost), base.operating_cost(), "operating");
    assert_rel(number(Quantity::TotalCost), 5870.63 * area, "total");
    let per_ha = evaluation
        .number(layout.addr(Quantity::TotalCost).with_col(1))
        .unwrap();
    assert_rel(per_ha, 5870.63, "total per hectare");
}

#[test]
fn test_scenario_rows_match_engine() {
    let base = HedgeInput::reference();
    let input = input_with(&base, 5);
    let (_, layout, evaluation) = compile(&input);
    let block = layout.scenarios().unwrap();
    let results = evaluate_all(&input.scenarios, &base.context());
    for (i, result) in results.iter().enumerate() {
        let cell = |c: ScenarioColumn| evaluation.number(block.cell(i, c)).unwrap();
        let out = &result.outcome;
        assert_rel(cell(ScenarioColumn::Revenue), out.revenue_total, "revenue");
        assert_rel(cell(ScenarioColumn::Profit), out.profit_total, "profit");
        assert_rel(cell(ScenarioColumn::ValuePerSack), out.value_per_sack_total, "value/sack");
        assert_rel(cell(ScenarioColumn::MarginPct), out.margin_pct, "margin");
        assert_rel(cell(ScenarioColumn::RoiPct), out.roi_pct, "roi");
    }
}

#[test]
fn test_comparative_analysis_matches_best_by() {
    let base = HedgeInput::reference();
    let mut input = input_with(&base, 5);
    // Put the strongest scenario in the middle.
    input.scenarios.swap(2, 4);
    let (_, layout, evaluation) = compile(&input);
    let block = layout.scenarios().unwrap();
    let results = evaluate_all(&input.scenarios, &base.context());
    for metric in ScenarioMetric::ALL {
        let winner = best_by(metric, &results).unwrap();
        let at = best_name_cell(block, metric).unwrap();
        assert_eq!(
            evaluation.value(at),
            Value::Text(winner.scenario.name.clone()),
            "metric {metric:?}"
        );
        assert_rel(
            evaluation.number(at.with_col(2)).unwrap(),
            winner.value(metric),
            "best value",
        );
    }
}

#[test]
fn test_equivalence_with_zero_production() {
    let mut base = HedgeInput::reference();
    base.production.area = 0.0;
    let (_, layout, evaluation) = compile(&input_with(&base, 1));
    let expected = compute_outcome(
        &base.simulation,
        &base.hedge_lock,
        &base.production,
        base.operating_cost(),
    );
    for (quantity, value) in dashboard_pairs(&expected) {
        let actual = evaluation.number(layout.addr(quantity)).unwrap();
        if value.is_nan() {
            assert!(actual.is_nan(), "{quantity:?} should be NaN, got {actual}");
        } else {
            assert_rel(actual, value, &format!("{quantity:?}"));
        }
    }
}

// ===========================================================================
// Dynamic ranges
// ===========================================================================

#[test]
fn test_zero_scenarios_omit_sheet() {
    let (workbook, layout, _) = compile(&input_with(&HedgeInput::reference(), 0));
    assert!(workbook.sheet(SheetKind::Scenarios).is_none());
    assert!(layout.scenarios().is_none());
    assert_eq!(workbook.sheets().len(), 5);
}

#[test]
fn test_scenario_ranges_do_not_overlap() {
    for count in [1usize, 5] {
        let (workbook, layout, _) = compile(&input_with(&HedgeInput::reference(), count));
        let block = layout.scenarios().unwrap();
        assert_eq!(block.len(), count);
        assert_eq!(block.first_row(), 4);
        assert_eq!(block.last_row(), 4 + count as u32 - 1);

        let mut best_rows: Vec<u32> = ScenarioMetric::ALL
            .iter()
            .map(|m| block.best_row(*m).unwrap())
            .collect();
        assert!(best_rows.iter().all(|r| *r > block.last_row() + 1));
        best_rows.dedup();
        assert_eq!(best_rows.len(), ScenarioMetric::ALL.len());

        let sheet = workbook.sheet(SheetKind::Scenarios).unwrap();
        let header_name = format!("Scenario {count}");
        assert_eq!(
            sheet.get(block.last_row(), 0),
            Some(&agrohedge_core::workbook::Cell::literal(header_name.as_str()))
        );
    }
}

#[test]
fn test_single_scenario_summary_range() {
    let input = input_with(&HedgeInput::reference(), 1);
    let (workbook, layout, evaluation) = compile(&input);
    let block = layout.scenarios().unwrap();
    let at = best_name_cell(block, ScenarioMetric::ProfitTotal).unwrap();
    let text = workbook.cell(at).and_then(|c| c.as_formula()).unwrap().text();
    assert_eq!(text, "=INDEX(A5:A5,MATCH(MAX(G5:G5),G5:G5,0))");
    assert_eq!(evaluation.value(at), Value::Text("Scenario 1".into()));
}

// ===========================================================================
// Formula text and references
// ===========================================================================

#[test]
fn test_formula_text_samples() {
    let (workbook, layout, _) = compile(&input_with(&HedgeInput::reference(), 2));
    let text = |at: CellRef| {
        workbook
            .cell(at)
            .and_then(|c| c.as_formula())
            .map(|f| f.text().to_string())
            .unwrap_or_default()
    };
    assert_eq!(text(layout.addr(Quantity::ExposedSacks)), "=Estimates!B6-B12");
    assert_eq!(text(layout.addr(Quantity::SoyAdjustment)), "=('Hedge Lock'!B6-B5)*'Hedge Lock'!B10");
    assert_eq!(text(layout.addr(Quantity::MarginPct)), "=B32/B23*100");
    assert_eq!(text(layout.addr(Quantity::OperatingCostPerSack)), "=D28/Estimates!B6");

    let block = layout.scenarios().unwrap();
    assert_eq!(
        text(block.cell(1, ScenarioColumn::Profit)),
        "=F6-Dashboard!B26-Dashboard!B27"
    );
}

#[test]
fn test_every_formula_reference_resolves() {
    let (workbook, _, _) = compile(&input_with(&HedgeInput::reference(), 3));
    let mut formulas = 0;
    for (at, formula) in workbook.formulas() {
        formulas += 1;
        assert!(!formula.references().is_empty(), "{at} reads nothing");
        for reference in formula.references() {
            assert!(
                workbook.sheet(reference.sheet).is_some(),
                "{at} points at missing sheet {}",
                reference.sheet
            );
            let cell = workbook.cell(*reference);
            assert!(
                cell.map(|c| !c.is_empty()).unwrap_or(false),
                "{at} reads empty cell {reference}"
            );
        }
    }
    assert!(formulas > 60);
}

#[test]
fn test_workbook_serializes_formulas_as_strings() {
    let (workbook, _, _) = compile(&input_with(&HedgeInput::reference(), 1));
    let json = serde_json::to_value(&workbook).unwrap();
    let sheets = json["sheets"].as_array().unwrap();
    assert_eq!(sheets[0]["name"], "Costs");
    assert_eq!(sheets[5]["name"], "Scenarios");
    assert_eq!(sheets[0]["rows"][14][3]["formula"], "=SUM(D5:D14)");
    assert_eq!(sheets[0]["rows"][4][0], "Machinery Operation");
    let per_ha = sheets[0]["rows"][4][1].as_f64().unwrap();
    assert!((per_ha - 414.14).abs() < 1e-9);
}

// ===========================================================================
// Configuration errors
// ===========================================================================

#[test]
fn test_sixteen_cost_lines_rejected() {
    let mut input = input_with(&HedgeInput::reference(), 0);
    input.cost_lines.pop();
    let err = compile_workbook(&input).unwrap_err();
    match err {
        HedgeError::Configuration { context, reason } => {
            assert_eq!(context, "cost lines");
            assert!(reason.contains("got 16"));
        }
        other => panic!("expected Configuration error, got {other:?}"),
    }
}

#[test]
fn test_misplaced_fixed_line_rejected() {
    let mut input = input_with(&HedgeInput::reference(), 0);
    input.cost_lines[3] = CostLine {
        label: "Land Remuneration".into(),
        category: CostCategory::Fixed,
        per_hectare: dec!(1453.92),
    };
    assert!(matches!(
        compile_workbook(&input),
        Err(HedgeError::Configuration { .. })
    ));
}

#[test]
fn test_duplicate_scenario_ids_rejected() {
    let mut input = input_with(&HedgeInput::reference(), 3);
    input.scenarios[2].id = input.scenarios[0].id.clone();
    match compile_workbook(&input) {
        Err(HedgeError::Configuration { context, reason }) => {
            assert_eq!(context, "scenarios");
            assert!(reason.contains("scenario-0"));
        }
        other => panic!("expected Configuration error, got {other:?}"),
    }
}
