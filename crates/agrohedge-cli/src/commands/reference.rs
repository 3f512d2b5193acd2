use clap::Args;
use serde_json::Value;

use agrohedge_core::engine::HedgeInput;
use agrohedge_core::scenarios::ScenarioComparisonInput;
use agrohedge_core::workbook::WorkbookInput;

use crate::commands::scenarios::default_scenarios;

/// Arguments for printing the reference dataset
#[derive(Args)]
pub struct ReferenceArgs {
    /// Shape to print: hedge (outcome input), scenarios or workbook
    #[arg(long, default_value = "hedge")]
    pub shape: String,
}

/// Print a ready-to-edit input file for the other subcommands.
pub fn run_reference(args: ReferenceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let base = HedgeInput::reference();
    let value = match args.shape.to_lowercase().as_str() {
        "hedge" => serde_json::to_value(&base)?,
        "scenarios" => {
            let scenarios = default_scenarios(&base.simulation);
            serde_json::to_value(ScenarioComparisonInput { base, scenarios })?
        }
        "workbook" => {
            let scenarios = default_scenarios(&base.simulation);
            serde_json::to_value(WorkbookInput::from_hedge_input(&base, scenarios))?
        }
        other => {
            return Err(format!(
                "Unknown shape '{}' (expected hedge, scenarios or workbook)",
                other
            )
            .into())
        }
    };
    Ok(value)
}
