use chrono::Utc;
use clap::Args;
use serde::Serialize;
use serde_json::{json, Value};

use agrohedge_core::engine::HedgeInput;
use agrohedge_core::model::{Scenario, ScenarioBook, ScenarioKind, SimulationInputs};
use agrohedge_core::scenarios::{self, ScenarioComparisonInput, ScenarioMetric};

use crate::input;

/// Arguments for scenario comparison
#[derive(Args)]
pub struct ScenariosArgs {
    /// Path to JSON input file (base position plus scenario list)
    #[arg(long)]
    pub input: Option<String>,

    /// Only report the winner for this metric
    #[arg(long, value_enum)]
    pub metric: Option<MetricArg>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum MetricArg {
    Revenue,
    Profit,
    ValuePerSack,
    Roi,
}

impl From<MetricArg> for ScenarioMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Revenue => ScenarioMetric::RevenueTotal,
            MetricArg::Profit => ScenarioMetric::ProfitTotal,
            MetricArg::ValuePerSack => ScenarioMetric::ValuePerSackTotal,
            MetricArg::Roi => ScenarioMetric::RoiPct,
        }
    }
}

/// One comparison table row.
#[derive(Serialize)]
struct ScenarioRow<'a> {
    id: &'a str,
    name: &'a str,
    kind: &'a str,
    chicago_price: f64,
    physical_price: f64,
    fx_rate: f64,
    revenue_total: f64,
    profit_total: f64,
    value_per_sack_total: f64,
    margin_pct: f64,
    roi_pct: f64,
}

/// Pessimistic, realistic and optimistic moves around a simulation snapshot.
pub fn default_scenarios(base: &SimulationInputs) -> Vec<Scenario> {
    let created_at = Utc::now();
    let shifted = |chicago: f64, physical: f64, fx: f64| SimulationInputs {
        chicago_price: base.chicago_price * chicago,
        physical_price: base.physical_price * physical,
        fx_rate: base.fx_rate * fx,
        ..*base
    };
    let presets = [
        ("Pessimistic", ScenarioKind::Pessimistic, shifted(0.92, 0.90, 0.95)),
        ("Realistic", ScenarioKind::Realistic, *base),
        ("Optimistic", ScenarioKind::Optimistic, shifted(1.08, 1.10, 1.05)),
    ];
    let mut book = ScenarioBook::new();
    for (name, kind, inputs) in presets {
        // Preset names are never blank.
        if let Err(e) = book.create(name, kind, inputs, created_at) {
            tracing::warn!(error = %e, "skipping preset scenario");
        }
    }
    book.as_slice().to_vec()
}

pub fn load_comparison_input(
    path: Option<&str>,
) -> Result<ScenarioComparisonInput, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_json(path)
    } else if let Some(parsed) = input::stdin::read_stdin()? {
        Ok(parsed)
    } else {
        let base = HedgeInput::reference();
        let scenarios = default_scenarios(&base.simulation);
        Ok(ScenarioComparisonInput { base, scenarios })
    }
}

pub fn run_scenarios(args: ScenariosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let comparison_input = load_comparison_input(args.input.as_deref())?;
    let output = scenarios::compare_scenarios(&comparison_input)?;

    let rows: Vec<ScenarioRow> = output
        .result
        .results
        .iter()
        .map(|r| ScenarioRow {
            id: r.scenario.id.as_str(),
            name: &r.scenario.name,
            kind: r.scenario.kind.as_str(),
            chicago_price: r.scenario.inputs.chicago_price,
            physical_price: r.scenario.inputs.physical_price,
            fx_rate: r.scenario.inputs.fx_rate,
            revenue_total: r.outcome.revenue_total,
            profit_total: r.outcome.profit_total,
            value_per_sack_total: r.outcome.value_per_sack_total,
            margin_pct: r.outcome.margin_pct,
            roi_pct: r.outcome.roi_pct,
        })
        .collect();

    let best: Vec<_> = match args.metric {
        Some(metric) => {
            let metric = ScenarioMetric::from(metric);
            output
                .result
                .best
                .iter()
                .filter(|b| b.metric == metric)
                .collect()
        }
        None => output.result.best.iter().collect(),
    };

    Ok(json!({
        "result": {
            "results": rows,
            "best": best,
            "base_profit_total": output.result.base.profit_total,
        },
        "methodology": output.methodology,
        "assumptions": output.assumptions,
        "warnings": output.warnings,
        "metadata": output.metadata,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenarios_bracket_the_base() {
        let base = SimulationInputs::reference();
        let presets = default_scenarios(&base);
        assert_eq!(presets.len(), 3);
        assert!(presets[0].inputs.physical_price < base.physical_price);
        assert_eq!(presets[1].inputs, base);
        assert!(presets[2].inputs.physical_price > base.physical_price);
    }

    #[test]
    fn test_optimistic_preset_wins_every_metric() {
        let base = HedgeInput::reference();
        let input = ScenarioComparisonInput {
            scenarios: default_scenarios(&base.simulation),
            base,
        };
        let out = scenarios::compare_scenarios(&input).unwrap();
        let metric = ScenarioMetric::from(MetricArg::Roi);
        let winners: Vec<_> = out.result.best.iter().filter(|b| b.metric == metric).collect();
        assert_eq!(winners.len(), 1);
        assert!(out.result.best.iter().all(|b| b.name == "Optimistic"));
    }
}
