use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::engine::outcome::{
    compute_outcome, undefined_value_warnings, validate_simulation, HedgeContext, HedgeInput,
    HedgeOutcome,
};
use crate::error::HedgeError;
use crate::model::{ensure_unique_ids, Scenario};
use crate::types::*;
use crate::HedgeResult;

/// Metric a scenario can be ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioMetric {
    RevenueTotal,
    ProfitTotal,
    ValuePerSackTotal,
    RoiPct,
}

impl ScenarioMetric {
    pub const ALL: [ScenarioMetric; 4] = [
        ScenarioMetric::RevenueTotal,
        ScenarioMetric::ProfitTotal,
        ScenarioMetric::ValuePerSackTotal,
        ScenarioMetric::RoiPct,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ScenarioMetric::RevenueTotal => "Revenue",
            ScenarioMetric::ProfitTotal => "Profit",
            ScenarioMetric::ValuePerSackTotal => "Value/Sack",
            ScenarioMetric::RoiPct => "ROI",
        }
    }
}

/// Outcome of one scenario. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub outcome: HedgeOutcome,
}

impl ScenarioResult {
    pub fn value(&self, metric: ScenarioMetric) -> Real {
        match metric {
            ScenarioMetric::RevenueTotal => self.outcome.revenue_total,
            ScenarioMetric::ProfitTotal => self.outcome.profit_total,
            ScenarioMetric::ValuePerSackTotal => self.outcome.value_per_sack_total,
            ScenarioMetric::RoiPct => self.outcome.roi_pct,
        }
    }
}

/// Run every scenario through the engine against a fixed position.
///
/// Results come back in the same order as `scenarios`.
pub fn evaluate_all(scenarios: &[Scenario], context: &HedgeContext) -> Vec<ScenarioResult> {
    scenarios
        .iter()
        .map(|scenario| ScenarioResult {
            scenario: scenario.clone(),
            outcome: compute_outcome(
                &scenario.inputs,
                &context.hedge_lock,
                &context.production,
                context.operating_cost,
            ),
        })
        .collect()
}

/// Highest-valued result for `metric`.
///
/// Ties go to the earliest result. NaN never beats a number; if every value
/// is NaN the first result is returned. `None` only for an empty slice.
pub fn best_by(metric: ScenarioMetric, results: &[ScenarioResult]) -> Option<&ScenarioResult> {
    let mut iter = results.iter();
    let mut best = iter.next()?;
    for current in iter {
        let (b, c) = (best.value(metric), current.value(metric));
        if (b.is_nan() && !c.is_nan()) || c > b {
            best = current;
        }
    }
    Some(best)
}

// ---------------------------------------------------------------------------
// Comparison envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparisonInput {
    /// Current position and simulation snapshot.
    pub base: HedgeInput,
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestScenario {
    pub metric: ScenarioMetric,
    pub scenario_id: String,
    pub name: String,
    pub value: Real,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparison {
    /// Outcome of the current simulation inputs.
    pub base: HedgeOutcome,
    pub results: Vec<ScenarioResult>,
    /// Winner per metric; empty when there are no scenarios.
    pub best: Vec<BestScenario>,
}

/// Evaluate all scenarios against the base position and rank them.
pub fn compare_scenarios(
    input: &ScenarioComparisonInput,
) -> HedgeResult<ComputationOutput<ScenarioComparison>> {
    let start = Instant::now();
    input.base.validate()?;
    ensure_unique_ids(&input.scenarios)?;
    for scenario in &input.scenarios {
        if scenario.name.trim().is_empty() {
            return Err(HedgeError::InvalidInput {
                field: format!("scenario:{} name", scenario.id),
                reason: "Scenario name must not be empty".into(),
            });
        }
        validate_simulation(&format!("scenario:{}", scenario.id), &scenario.inputs)?;
    }

    let context = input.base.context();
    let base = compute_outcome(
        &input.base.simulation,
        &context.hedge_lock,
        &context.production,
        context.operating_cost,
    );
    let mut warnings = undefined_value_warnings(&base, context.operating_cost);

    let results = evaluate_all(&input.scenarios, &context);
    for result in &results {
        let undefined = result.outcome.non_finite_fields();
        if !undefined.is_empty() {
            warnings.push(format!(
                "Scenario '{}' has non-finite outputs: {}",
                result.scenario.name,
                undefined.join(", ")
            ));
        }
    }

    let best = ScenarioMetric::ALL
        .iter()
        .filter_map(|metric| {
            best_by(*metric, &results).map(|winner| BestScenario {
                metric: *metric,
                scenario_id: winner.scenario.id.to_string(),
                name: winner.scenario.name.clone(),
                value: winner.value(*metric),
            })
        })
        .collect();

    let output = ScenarioComparison {
        base,
        results,
        best,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Scenario comparison against a fixed hedge position",
        &serde_json::json!({
            "num_scenarios": input.scenarios.len(),
            "operating_cost": context.operating_cost,
            "tie_break": "first in input order",
        }),
        warnings,
        elapsed,
        output,
    ))
}
