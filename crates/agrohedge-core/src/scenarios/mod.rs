pub mod scenario;

pub use scenario::{
    best_by, compare_scenarios, evaluate_all, BestScenario, ScenarioComparison,
    ScenarioComparisonInput, ScenarioMetric, ScenarioResult,
};
