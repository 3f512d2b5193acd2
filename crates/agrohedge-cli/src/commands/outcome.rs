use clap::Args;
use serde_json::Value;

use agrohedge_core::engine::{self, HedgeInput};
use agrohedge_core::model::DeliveryMode;

use crate::input;

/// Arguments for a single hedge outcome
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct OutcomeArgs {
    /// Path to JSON input file (HedgeInput); defaults to the reference dataset
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub simulation: SimulationFlags,
}

/// Per-field overrides applied on top of the loaded snapshot
#[derive(Args, Default)]
pub struct SimulationFlags {
    /// Chicago soy price at expiry (USD/bushel)
    #[arg(long)]
    pub chicago_price: Option<f64>,

    /// Physical price per sack
    #[arg(long)]
    pub physical_price: Option<f64>,

    /// Ptax FX rate at expiry (BRL/USD)
    #[arg(long, alias = "fx")]
    pub fx_rate: Option<f64>,

    /// Delivery mode: fob or cif
    #[arg(long)]
    pub delivery_mode: Option<String>,

    /// Freight cost per load
    #[arg(long)]
    pub freight_cost: Option<f64>,

    /// Expected yield (sacks per hectare)
    #[arg(long)]
    pub sacks_per_hectare: Option<f64>,

    /// Cultivated area in hectares
    #[arg(long)]
    pub area: Option<f64>,

    /// Locked volume in bushels
    #[arg(long)]
    pub bushels: Option<f64>,
}

impl SimulationFlags {
    pub fn apply(&self, input: &mut HedgeInput) -> Result<(), Box<dyn std::error::Error>> {
        let sim = &mut input.simulation;
        if let Some(v) = self.chicago_price {
            sim.chicago_price = v;
        }
        if let Some(v) = self.physical_price {
            sim.physical_price = v;
        }
        if let Some(v) = self.fx_rate {
            sim.fx_rate = v;
        }
        if let Some(v) = self.freight_cost {
            sim.freight_cost = v;
        }
        if let Some(ref mode) = self.delivery_mode {
            sim.delivery_mode = parse_delivery_mode(mode)?;
        }
        if let Some(v) = self.sacks_per_hectare {
            input.production.sacks_per_hectare = v;
        }
        if let Some(v) = self.area {
            input.production.area = v;
        }
        if let Some(v) = self.bushels {
            input.hedge_lock.bushel_quantity = v;
        }
        Ok(())
    }
}

fn parse_delivery_mode(s: &str) -> Result<DeliveryMode, Box<dyn std::error::Error>> {
    match s.to_lowercase().as_str() {
        "fob" => Ok(DeliveryMode::Fob),
        "cif" => Ok(DeliveryMode::Cif),
        other => Err(format!("Unknown delivery mode '{}' (expected fob or cif)", other).into()),
    }
}

/// Load a `HedgeInput` from `--input`, piped stdin, or the reference dataset.
pub fn load_hedge_input(path: Option<&str>) -> Result<HedgeInput, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_json(path)
    } else if let Some(parsed) = input::stdin::read_stdin()? {
        Ok(parsed)
    } else {
        Ok(HedgeInput::reference())
    }
}

pub fn run_outcome(args: OutcomeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut hedge_input = load_hedge_input(args.input.as_deref())?;
    args.simulation.apply(&mut hedge_input)?;
    tracing::debug!(
        chicago = hedge_input.simulation.chicago_price,
        physical = hedge_input.simulation.physical_price,
        fx = hedge_input.simulation.fx_rate,
        "running hedge outcome"
    );

    let result = engine::analyze_hedge(&hedge_input)?;
    Ok(serde_json::to_value(result)?)
}
